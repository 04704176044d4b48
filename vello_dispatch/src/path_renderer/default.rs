// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fallback for aliased fills and hairlines: stencil the winding, then
//! cover it.

use crate::batch::OutlineStyle;
use crate::shape::Shape;
use crate::style::StyleKind;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind, StencilSupport};

#[derive(Debug)]
pub(crate) struct DefaultPathRenderer;

impl PathRenderer for DefaultPathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::Default
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        !args.anti_alias
            && (args.shape.style().is_simple_fill()
                || super::is_stroke_hair_or_equivalent(args.shape.style(), args.view))
    }

    /// Convex, non-inverse fills need no stencil pass and can be colored at the
    /// same time. Everything else is stenciled first.
    fn stencil_support(&self, shape: &Shape) -> StencilSupport {
        if shape.style().kind() == StyleKind::Fill && !shape.inverse_filled() && shape.is_convex() {
            StencilSupport::NoRestriction
        } else {
            StencilSupport::StencilOnly
        }
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let outline = if args.shape.style().is_simple_fill() {
            OutlineStyle::Fill
        } else {
            OutlineStyle::Hairline
        };
        let batch = super::path_batch(PathRendererKind::Default, &args, outline);
        super::submit(args, batch);
    }
}
