// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared setup for the dispatch tests.

use std::sync::Arc;

use vello_dispatch::peniko::color::palette::css::BLUE;
use vello_dispatch::{
    Caps, Context, ContextOptions, DrawContext, Paint, RecordedBatch, RecordingSink,
    RenderTarget, RenderTargetDesc, Submission, SurfaceProps,
};

pub(crate) struct Harness {
    pub(crate) context: Context,
    pub(crate) sink: RecordingSink,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with(Caps::default(), ContextOptions::default())
    }

    pub(crate) fn with(caps: Caps, options: ContextOptions) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let sink = RecordingSink::new();
        let context = Context::new(caps, options, sink.clone());
        Self { context, sink }
    }

    pub(crate) fn target(&self, desc: RenderTargetDesc) -> Arc<RenderTarget> {
        self.context.create_render_target(desc).unwrap()
    }

    /// A draw context on a new single sampled target.
    pub(crate) fn draw_context(&self, width: u32, height: u32) -> DrawContext {
        let target = self.target(RenderTargetDesc::new(width, height));
        self.context
            .make_draw_context(target, SurfaceProps::default())
    }

    /// Flush and return everything submitted.
    pub(crate) fn flush(&self) -> Vec<Submission> {
        self.context.flush();
        self.sink.take()
    }

    /// Flush and return the batches of the only submission.
    pub(crate) fn batches(&self) -> Vec<RecordedBatch> {
        let mut submissions = self.flush();
        assert_eq!(submissions.len(), 1, "expected a single submission");
        submissions.remove(0).batches
    }
}

pub(crate) fn aliased(paint: Paint) -> Paint {
    paint.with_anti_alias(false)
}

pub(crate) fn blue() -> Paint {
    Paint::new(BLUE)
}
