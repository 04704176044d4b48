// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batches for filled, stroked and nested rects.

use core::f64::consts::SQRT_2;

use crate::batch::{Batch, BatchKind, DrawColor, LocalCoords, RectJoin};
use crate::kurbo::{Affine, Join, Rect};
use crate::math::{self, nearly_equal};
use crate::path::Path;
use crate::peniko::Fill;
use crate::style::{Style, StyleKind};

/// A filled rect. Antialiased rects get half a pixel of device bounds for the ramp.
pub(crate) fn fill(
    color: DrawColor,
    aa: bool,
    view: Affine,
    rect: Rect,
    local: LocalCoords,
) -> Batch {
    let mut bounds = math::map_rect(view, &rect);
    if aa {
        bounds = bounds.inflate(0.5, 0.5);
    }
    Batch::new(
        BatchKind::FillRect {
            aa,
            view,
            rect,
            local,
        },
        color,
        bounds,
    )
}

/// The corner treatment of a coverage antialiased rect stroke, if it has one.
fn aa_stroke_join(style: &Style) -> Option<RectJoin> {
    let stroke = style.stroke_params()?;
    match style.kind() {
        StyleKind::Hairline => Some(RectJoin::Miter),
        StyleKind::Stroke => match stroke.join {
            // Miters shorter than the diagonal are drawn as bevels.
            Join::Miter if stroke.miter_limit >= SQRT_2 => Some(RectJoin::Miter),
            Join::Miter | Join::Bevel => Some(RectJoin::Bevel),
            Join::Round => None,
        },
        StyleKind::Fill | StyleKind::StrokeAndFill => None,
    }
}

/// An antialiased stroke of an axis-aligned rect.
///
/// `None` when the style's join can't be drawn this way.
pub(crate) fn aa_stroke(
    color: DrawColor,
    view: Affine,
    rect: Rect,
    style: &Style,
) -> Option<Batch> {
    let join = aa_stroke_join(style)?;
    let width = style.width();
    let device = math::map_rect(view, &rect.inflate(width * 0.5, width * 0.5));
    Some(Batch::new(
        BatchKind::StrokeRect {
            aa: true,
            view,
            rect,
            width,
            join,
        },
        color,
        device.inflate(0.5, 0.5),
    ))
}

/// An aliased stroke of a rect.
///
/// `None` unless the stroke is a hairline or mitered with a limit above √2.
pub(crate) fn non_aa_stroke(
    color: DrawColor,
    view: Affine,
    rect: Rect,
    style: &Style,
    snap_to_pixel_centers: bool,
) -> Option<Batch> {
    let stroke = style.stroke_params()?;
    let width = style.width();
    let allowed = match style.kind() {
        StyleKind::Hairline => true,
        StyleKind::Stroke => stroke.join == Join::Miter && stroke.miter_limit > SQRT_2,
        StyleKind::Fill | StyleKind::StrokeAndFill => false,
    };
    if !allowed {
        return None;
    }
    let mut bounds = math::map_rect(view, &rect.inflate(width * 0.5, width * 0.5));
    if width == 0.0 || snap_to_pixel_centers {
        // Hairlines are a pixel wide in device space.
        bounds = bounds.inflate(0.5, 0.5);
    }
    Some(Batch::new(
        BatchKind::StrokeRect {
            aa: false,
            view,
            rect,
            width,
            join: RectJoin::Miter,
        },
        color,
        bounds,
    ))
}

/// The antialiased area between two nested rects.
pub(crate) fn aa_fill_nested(color: DrawColor, view: Affine, rects: [Rect; 2]) -> Batch {
    let [outer, inner] = rects;
    Batch::new(
        BatchKind::NestedRects { view, outer, inner },
        color,
        math::map_rect(view, &outer).inflate(0.5, 0.5),
    )
}

/// Whether `path` can be drawn as the area between two filled rects.
///
/// The rects must be wound against each other under the non-zero rule, and
/// the margin between them must either be the same on all sides or at least
/// one unit everywhere.
pub(crate) fn fills_as_nested_rects(view: Affine, path: &Path) -> Option<[Rect; 2]> {
    if path.is_inverse_fill() || !math::rect_stays_rect(view) {
        return None;
    }
    let (rects, dirs) = path.nested_fill_rects()?;
    if path.fill_rule() == Fill::NonZero && dirs[0] == dirs[1] {
        return None;
    }
    let [outer, inner] = rects;
    let margins = [
        (outer.x0 - inner.x0).abs(),
        (outer.y0 - inner.y0).abs(),
        (outer.x1 - inner.x1).abs(),
        (outer.y1 - inner.y1).abs(),
    ];
    let all_equal = margins.iter().all(|m| nearly_equal(*m, margins[0]));
    let all_at_least_one = margins.iter().all(|m| *m >= 1.0);
    (all_equal || all_at_least_one).then_some(rects)
}
