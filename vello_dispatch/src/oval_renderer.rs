// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Analytic coverage antialiased ovals and rounded rects.

use crate::batch::{Batch, BatchKind, DrawColor, OutlineStyle, OvalKind};
use crate::config::Caps;
use crate::kurbo::{Affine, Rect, RoundedRect};
use crate::math::{self, nearly_equal};
use crate::style::{Style, StyleKind};

/// The outline to draw and how far it reaches outside of the geometry, or
/// `None` for styles the analytic renderers can't draw.
fn outline(style: &Style) -> Option<(OutlineStyle, f64)> {
    if style.has_path_effect() {
        return None;
    }
    let half = style.width() * 0.5;
    Some(match style.kind() {
        StyleKind::Fill => (OutlineStyle::Fill, 0.0),
        StyleKind::Hairline => (OutlineStyle::Hairline, 0.0),
        StyleKind::Stroke => (OutlineStyle::Stroke(style.width()), half),
        // The outline of a stroke-and-fill is filled anyway.
        StyleKind::StrokeAndFill => (OutlineStyle::Fill, half),
    })
}

/// Device space scale factors along the local x and y axes.
fn axis_scales(view: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = view.as_coeffs();
    (a.hypot(b), c.hypot(d))
}

/// Build an antialiased oval batch, or `None` if the oval has to be drawn as a path.
///
/// Circles need a similarity transform, axis-aligned ellipses a transform that
/// keeps rects rects, and anything else shader derivatives.
pub(crate) fn oval_batch(
    color: DrawColor,
    view: Affine,
    oval: Rect,
    style: &Style,
    caps: &Caps,
) -> Option<Batch> {
    let (outline, outset) = outline(style)?;
    let is_circle = nearly_equal(oval.width(), oval.height());
    let radii = (oval.width() * 0.5, oval.height() * 0.5);

    let kind = if is_circle && math::is_similarity(view) {
        OvalKind::Circle
    } else if math::rect_stays_rect(view) {
        if !ellipse_stroke_ok(radii, outset, outline) {
            return None;
        }
        OvalKind::Ellipse
    } else if caps.shader_derivative_support {
        if !ellipse_stroke_ok(radii, outset, outline) {
            return None;
        }
        OvalKind::DiEllipse
    } else {
        return None;
    };

    let (oval, style) = match outline {
        // Stroke-and-fill draws a bigger filled oval.
        OutlineStyle::Fill if outset > 0.0 => (oval.inflate(outset, outset), OutlineStyle::Fill),
        _ => (oval, outline),
    };
    let bounds = math::map_rect(view, &oval.inflate(outset_for(style), outset_for(style)));
    Some(Batch::new(
        BatchKind::Oval {
            kind,
            view,
            oval,
            style,
        },
        color,
        bounds.inflate(0.5, 0.5),
    ))
}

fn outset_for(style: OutlineStyle) -> f64 {
    match style {
        OutlineStyle::Stroke(width) => width * 0.5,
        OutlineStyle::Fill | OutlineStyle::Hairline => 0.0,
    }
}

/// Thick strokes only work on near-circular ellipses, and never past the
/// center of the ellipse.
fn ellipse_stroke_ok((rx, ry): (f64, f64), half_width: f64, outline: OutlineStyle) -> bool {
    if !matches!(outline, OutlineStyle::Stroke(_)) {
        return true;
    }
    if half_width > rx.min(ry) {
        return false;
    }
    !(half_width > 0.5 && (0.5 * rx > ry || 0.5 * ry > rx))
}

/// Build an antialiased rounded rect batch, or `None` if it has to be drawn as
/// a path.
pub(crate) fn rrect_batch(
    color: DrawColor,
    view: Affine,
    rrect: RoundedRect,
    style: &Style,
) -> Option<Batch> {
    if !math::rect_stays_rect(view) {
        return None;
    }
    let (outline, outset) = outline(style)?;
    let radii = rrect.radii();
    let radius = radii.top_left;
    if radii.top_right != radius || radii.bottom_right != radius || radii.bottom_left != radius {
        return None;
    }
    let (sx, sy) = axis_scales(view);
    if radius * sx.min(sy) < 0.5 {
        return None;
    }
    if outset > radius {
        return None;
    }
    let bounds = math::map_rect(view, &rrect.rect().inflate(outset, outset));
    let rrect = match outline {
        // Stroke-and-fill draws a bigger filled rounded rect.
        OutlineStyle::Fill if outset > 0.0 => {
            RoundedRect::from_rect(rrect.rect().inflate(outset, outset), radius + outset)
        }
        _ => rrect,
    };
    Some(Batch::new(
        BatchKind::RRect {
            view,
            rrect,
            style: outline,
        },
        color,
        bounds.inflate(0.5, 0.5),
    ))
}
