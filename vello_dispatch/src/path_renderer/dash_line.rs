// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dashed straight lines, drawn without expanding the dashes into geometry.

use crate::batch::{Batch, BatchKind};
use crate::kurbo::{Cap, Rect};
use crate::math;
use crate::style::{PathEffect, StyleKind};

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

#[derive(Debug)]
pub(crate) struct DashLinePathRenderer;

/// An on/off pattern of exactly two intervals, if the shape is dashed with one.
fn two_interval_dash(effect: Option<&PathEffect>) -> Option<([f64; 2], f64)> {
    let effect = effect.filter(|e| e.is_valid())?;
    let PathEffect::Dash { intervals, phase } = effect;
    match intervals.as_slice() {
        [on, off] => Some(([*on, *off], *phase)),
        _ => None,
    }
}

impl PathRenderer for DashLinePathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::DashLine
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        let style = args.shape.style();
        let Some(([on, off], _)) = two_interval_dash(style.path_effect()) else {
            return false;
        };
        let Some([p0, p1]) = args.shape.as_line() else {
            return false;
        };
        // Axis-aligned in local space, and still perpendicular after the view.
        if p0.x != p1.x && p0.y != p1.y {
            return false;
        }
        if !math::preserves_right_angles(args.view) {
            return false;
        }
        let Some(stroke) = style.stroke_params() else {
            return false;
        };
        if !matches!(style.kind(), StyleKind::Stroke | StyleKind::Hairline) {
            return false;
        }
        match stroke.start_cap {
            Cap::Butt | Cap::Square => true,
            // Round dots only, and the dots may not touch.
            Cap::Round => on == 0.0 && stroke.width <= off,
        }
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let style = args.shape.style();
        let (Some(points), Some((intervals, phase))) =
            (args.shape.as_line(), two_interval_dash(style.path_effect()))
        else {
            log::warn!("Dash line renderer was handed a shape it can't draw");
            return;
        };
        let width = style.width();
        let local = Rect::from_points(points[0], points[1]).inflate(width * 0.5, width * 0.5);
        let mut bounds = math::map_rect(args.view, &local);
        if width == 0.0 || args.anti_alias {
            bounds = bounds.inflate(0.5, 0.5);
        }
        let batch = Batch::new(
            BatchKind::DashLine {
                view: args.view,
                points,
                intervals: intervals.into_iter().collect(),
                phase,
                width,
                aa: args.anti_alias,
            },
            args.paint.color(),
            bounds,
        );
        super::submit(args, batch);
    }
}
