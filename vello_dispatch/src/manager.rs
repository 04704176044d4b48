// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing manager: owns every draw target between flushes and the path
//! renderers shared by all draw contexts of a [`Context`](crate::Context).

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::{Caps, ContextOptions};
use crate::draw_target::{DrawTarget, DrawTargetId};
use crate::path_renderer::{
    CanDrawPathArgs, DrawType, PathRenderer, PathRendererChain, SoftwarePathRenderer,
    StencilSupport,
};
use crate::render_target::{RenderTarget, RenderTargetId, ResourceProvider};
use crate::sink::{CommandSink, Submission};

#[derive(Debug)]
pub(crate) struct DrawingManager {
    caps: Rc<Caps>,
    options: ContextOptions,
    sink: Box<dyn CommandSink>,
    resources: ResourceProvider,
    /// Open and closed targets, in creation order.
    draw_targets: Vec<DrawTarget>,
    /// The most recent draw target of each render target.
    last_draw_target: HashMap<RenderTargetId, DrawTargetId>,
    next_id: u64,
    chain: Option<PathRendererChain>,
    software: Option<Rc<SoftwarePathRenderer>>,
    abandoned: bool,
    flushing: bool,
}

impl DrawingManager {
    pub(crate) fn new(caps: Rc<Caps>, options: ContextOptions, sink: Box<dyn CommandSink>) -> Self {
        Self {
            caps,
            options,
            sink,
            resources: ResourceProvider::default(),
            draw_targets: Vec::new(),
            last_draw_target: HashMap::new(),
            next_id: 0,
            chain: None,
            software: None,
            abandoned: false,
            flushing: false,
        }
    }

    pub(crate) fn resources(&self) -> &ResourceProvider {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourceProvider {
        &mut self.resources
    }

    pub(crate) fn was_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Start a new draw target for `rt`, closing the one before it.
    pub(crate) fn new_draw_target(&mut self, rt: &Arc<RenderTarget>) -> DrawTargetId {
        self.close_last_draw_target(rt.id());
        let id = DrawTargetId(self.next_id);
        self.next_id += 1;
        self.draw_targets
            .push(DrawTarget::new(id, rt.clone(), &self.caps, &self.options));
        self.last_draw_target.insert(rt.id(), id);
        log::trace!("New draw target {id:?} for {:?}", rt.id());
        id
    }

    /// The most recent draw target of `rt`, if it wasn't flushed yet.
    pub(crate) fn last_draw_target(&self, rt: RenderTargetId) -> Option<DrawTargetId> {
        self.last_draw_target
            .get(&rt)
            .copied()
            .filter(|id| self.draw_target(*id).is_some())
    }

    /// Close the most recent draw target of `rt`, so later draws start a new one.
    pub(crate) fn close_last_draw_target(&mut self, rt: RenderTargetId) {
        if let Some(id) = self.last_draw_target(rt) {
            if let Some(dt) = self.draw_target_mut(id) {
                dt.close();
            }
        }
    }

    pub(crate) fn draw_target(&self, id: DrawTargetId) -> Option<&DrawTarget> {
        self.draw_targets.iter().find(|dt| dt.id() == id)
    }

    pub(crate) fn draw_target_mut(&mut self, id: DrawTargetId) -> Option<&mut DrawTarget> {
        self.draw_targets.iter_mut().find(|dt| dt.id() == id)
    }

    /// Pick a path renderer for the shape.
    ///
    /// The GPU chain is consulted in priority order. The software renderer is
    /// offered last, only when `allow_software` is set and the draw type needs
    /// no stencil support.
    pub(crate) fn path_renderer(
        &mut self,
        args: &CanDrawPathArgs<'_>,
        allow_software: bool,
        draw_type: DrawType,
    ) -> Option<Rc<dyn PathRenderer>> {
        let chain = self
            .chain
            .get_or_insert_with(|| PathRendererChain::new(&self.caps, &self.options));
        if let Some((renderer, _)) = chain.get_path_renderer(args, draw_type) {
            return Some(renderer);
        }
        if !allow_software || draw_type.min_stencil_support() > StencilSupport::NoSupport {
            return None;
        }
        let allow_caching = self.options.allow_path_mask_caching;
        let software = self
            .software
            .get_or_insert_with(|| Rc::new(SoftwarePathRenderer::new(allow_caching)));
        if !software.can_draw_path(args) {
            return None;
        }
        Some(software.clone())
    }

    /// Batches recorded into targets that haven't been flushed yet.
    pub(crate) fn pending_batches(&self) -> usize {
        self.draw_targets.iter().map(DrawTarget::pending_count).sum()
    }

    /// Close every draw target and hand them to the sink in creation order.
    pub(crate) fn flush(&mut self) {
        if self.abandoned {
            log::debug!("Ignoring flush of an abandoned context");
            return;
        }
        if self.flushing {
            return;
        }
        self.flushing = true;
        let targets = core::mem::take(&mut self.draw_targets);
        self.last_draw_target.clear();
        log::debug!("Flushing {} draw targets", targets.len());
        for mut dt in targets {
            dt.close();
            let (render_target, batches, dependencies) = dt.into_parts();
            self.sink.submit(Submission {
                render_target,
                batches,
                dependencies,
            });
        }
        let purged = self.resources.purge_unreferenced();
        if purged > 0 {
            log::debug!("Purged {purged} unreferenced render targets");
        }
        self.flushing = false;
    }

    /// Flush once enough batches are pending. A threshold of zero never flushes.
    pub(crate) fn flush_if_necessary(&mut self) {
        let max = self.options.max_pending_batches;
        if max > 0 && self.pending_batches() >= max {
            self.flush();
        }
    }

    /// Drop all pending work without submitting it. There is no way back.
    pub(crate) fn abandon(&mut self) {
        if !self.abandoned {
            log::debug!(
                "Abandoning context with {} pending batches",
                self.pending_batches()
            );
        }
        self.abandoned = true;
        self.draw_targets.clear();
        self.last_draw_target.clear();
        self.resources.clear();
    }
}
