// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vello Dispatch is the retained draw dispatch layer of a GPU 2D renderer.
//!
//! It sits between a canvas style API and a GPU backend. For every draw call
//! it decides how the geometry is best drawn: as a clear, as a rect batch, as
//! an instanced or analytic shape, or by one of a chain of path renderers.
//! The result is a list of [`Batch`]es per render target, recorded into draw
//! targets and handed to a [`CommandSink`] when the [`Context`] flushes.
//!
//! ## Getting started
//!
//! ```
//! use vello_dispatch::kurbo::{Affine, Rect};
//! use vello_dispatch::peniko::color::palette;
//! use vello_dispatch::{
//!     Caps, Clip, Context, ContextOptions, Paint, RecordingSink, RenderTargetDesc, Style,
//!     SurfaceProps,
//! };
//!
//! let sink = RecordingSink::new();
//! let context = Context::new(Caps::default(), ContextOptions::default(), sink.clone());
//! let target = context.create_render_target(RenderTargetDesc::new(100, 100))?;
//! let mut draw_context = context.make_draw_context(target, SurfaceProps::default());
//!
//! draw_context.draw_rect(
//!     &Clip::wide_open(),
//!     &Paint::new(palette::css::REBECCA_PURPLE),
//!     Affine::IDENTITY,
//!     Rect::new(10.0, 10.0, 50.0, 50.0),
//!     &Style::fill(),
//! );
//! context.flush();
//! assert_eq!(sink.len(), 1);
//! # Ok::<(), vello_dispatch::Error>(())
//! ```
//!
//! Everything here is single threaded: a [`Context`] and its draw contexts
//! are used from the thread that created them.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(
    clippy::cast_possible_truncation,
    reason = "instance data is stored as f32"
)]

mod batch;
mod clip;
mod config;
mod context;
mod draw_context;
mod draw_target;
mod instanced;
mod manager;
mod oval_renderer;
mod paint;
mod path;
mod path_renderer;
mod pipeline;
mod rect_batch;
mod render_target;
mod shape;
mod single_owner;
mod sink;
mod style;

pub mod math;

/// Styling and composition primitives.
pub use peniko;
/// 2D geometry, with a focus on curves.
pub use peniko::kurbo;

pub use batch::{
    Batch, BatchKind, DrawColor, LocalCoords, OutlineStyle, OvalKind, PathGeometry,
    PrimitiveType, RectJoin,
};
pub use clip::{AppliedClip, Clip, ClipElement};
pub use config::{
    Caps, ContextOptions, GpuPathRenderers, InstancedSupport, PixelConfig, PixelGeometry,
    SurfaceProps,
};
pub use context::Context;
pub use draw_context::{DrawContext, Vertices};
pub use draw_target::RecordedBatch;
pub use instanced::{InstanceRecord, InstancedAaMode, InstancedPipelineInfo, InstancedShape};
pub use math::IRect;
pub use paint::{EdgeType, Effect, Paint, RRectEffect, RegionOp, TransferMode};
pub use path::{Direction, Path};
pub use path_renderer::{
    CanDrawPathArgs, DrawPathArgs, DrawType, PathRenderer, PathRendererKind, StencilPathArgs,
    StencilSupport,
};
pub use pipeline::{AaMode, PipelineState, StencilOp, StencilTest, UserStencilSettings};
pub use render_target::{RenderTarget, RenderTargetDesc, RenderTargetId};
pub use shape::{ApplyStyle, Geometry, Shape};
pub use sink::{CommandSink, RecordingSink, Submission};
pub use style::{PathEffect, Style, StyleKind};

use thiserror::Error;

/// Errors that can occur in Vello Dispatch.
///
/// Draw calls never return these. A draw that can't be performed is dropped
/// and logged, the way a GPU backend drops invalid draws.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The view transform has no inverse.
    #[error("view transform is not invertible")]
    NonInvertibleTransform,
    /// No path renderer, software included, accepts the shape.
    #[error("no path renderer can draw the shape")]
    NoPathRenderer,
    /// The geometry covers nothing.
    #[error("geometry is empty")]
    EmptyGeometry,
    /// The render target can't be created with these capabilities.
    #[error("unsupported render target {width}x{height}: bad {reason}")]
    UnsupportedRenderTarget {
        /// What was rejected.
        reason: &'static str,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The context was abandoned.
    #[error("context was abandoned")]
    Abandoned,
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

// Contexts share their state through `Rc` and are bound to one thread.
static_assertions::assert_not_impl_any!(Context: Send, Sync);
static_assertions::assert_not_impl_any!(DrawContext: Send, Sync);
static_assertions::assert_impl_all!(Error: Send, Sync);
