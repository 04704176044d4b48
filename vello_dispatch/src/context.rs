// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::{Caps, ContextOptions, SurfaceProps};
use crate::draw_context::DrawContext;
use crate::manager::DrawingManager;
use crate::render_target::{RenderTarget, RenderTargetDesc};
use crate::single_owner::SingleOwner;
use crate::sink::CommandSink;
use crate::{Error, Result};

/// Owns the backend capabilities, the render targets and all recorded work.
///
/// Draw contexts made from a `Context` record into it; [`Context::flush`]
/// hands the recorded work to the [`CommandSink`].
#[derive(Debug)]
pub struct Context {
    caps: Rc<Caps>,
    options: ContextOptions,
    manager: Rc<RefCell<DrawingManager>>,
    single_owner: SingleOwner,
}

impl Context {
    /// Create a context for a backend with the given capabilities.
    pub fn new(caps: Caps, options: ContextOptions, sink: impl CommandSink + 'static) -> Self {
        let caps = Rc::new(caps);
        log::debug!("Creating context with {options:?}");
        let manager = DrawingManager::new(caps.clone(), options.clone(), Box::new(sink));
        Self {
            caps,
            options,
            manager: Rc::new(RefCell::new(manager)),
            single_owner: SingleOwner::new(),
        }
    }

    /// The backend capabilities.
    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    /// The options the context was created with.
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Create a render target.
    ///
    /// The size, sample count and pixel config are checked against the caps.
    pub fn create_render_target(&self, desc: RenderTargetDesc) -> Result<Arc<RenderTarget>> {
        self.single_owner.assert_owner();
        let mut manager = self.manager.borrow_mut();
        if manager.was_abandoned() {
            return Err(Error::Abandoned);
        }
        manager.resources_mut().create_render_target(desc, &self.caps)
    }

    /// Make a draw context recording into `render_target`.
    ///
    /// The draw context continues the render target's most recent draw target
    /// if it is still open.
    pub fn make_draw_context(
        &self,
        render_target: Arc<RenderTarget>,
        props: SurfaceProps,
    ) -> DrawContext {
        self.single_owner.assert_owner();
        let draw_target = self.manager.borrow().last_draw_target(render_target.id());
        DrawContext::new(
            self.manager.clone(),
            self.caps.clone(),
            render_target,
            draw_target,
            props,
        )
    }

    /// Close every draw target and submit the recorded work.
    pub fn flush(&self) {
        self.single_owner.assert_owner();
        self.manager.borrow_mut().flush();
    }

    /// Drop all recorded work. Every later draw on any draw context of this
    /// context is ignored.
    pub fn abandon(&self) {
        self.single_owner.assert_owner();
        self.manager.borrow_mut().abandon();
    }

    /// Whether [`Context::abandon`] was called.
    pub fn was_abandoned(&self) -> bool {
        self.manager.borrow().was_abandoned()
    }

    /// Batches recorded since the last flush.
    pub fn pending_batches(&self) -> usize {
        self.manager.borrow().pending_batches()
    }

    /// Number of render targets the context still holds a reference to.
    pub fn render_target_count(&self) -> usize {
        self.manager.borrow().resources().len()
    }
}
