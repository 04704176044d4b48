// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Antialiased convex fills and strokes, flattened into line segments with
//! a coverage ramp along the outline.

use crate::batch::OutlineStyle;
use crate::kurbo::{Join, PathEl};
use crate::math;
use crate::shape::{Geometry, Shape};
use crate::style::StyleKind;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

/// Widest device space stroke the renderer takes.
const MAX_STROKE_WIDTH: f64 = 20.0;

#[derive(Debug)]
pub(crate) struct AaLinearizingPathRenderer;

fn is_closed(shape: &Shape) -> bool {
    match shape.geometry() {
        Geometry::Path(path) => matches!(path.elements().last(), Some(PathEl::ClosePath)),
        _ => true,
    }
}

impl PathRenderer for AaLinearizingPathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::AaLinearizing
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        let shape = args.shape;
        let style = shape.style();
        if !args.anti_alias
            || !shape.is_convex()
            || style.has_path_effect()
            || shape.inverse_filled()
        {
            return false;
        }
        match style.kind() {
            StyleKind::Fill => true,
            StyleKind::Hairline => false,
            kind @ (StyleKind::Stroke | StyleKind::StrokeAndFill) => {
                if !math::is_similarity(args.view) {
                    return false;
                }
                let device_width = math::max_scale(args.view) * style.width();
                if device_width < 1.0 && kind == StyleKind::Stroke {
                    return false;
                }
                device_width <= MAX_STROKE_WIDTH && is_closed(shape) && style.join() != Join::Round
            }
        }
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let outline = match args.shape.style().kind() {
            StyleKind::Stroke => OutlineStyle::Stroke(args.shape.style().width()),
            _ => OutlineStyle::Fill,
        };
        let batch = super::path_batch(PathRendererKind::AaLinearizing, &args, outline);
        super::submit(args, batch);
    }
}
