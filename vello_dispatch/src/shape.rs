// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry and style, normalized for matching against path renderers.

use crate::kurbo::{self, BezPath, Point, Rect, RoundedRect, StrokeOpts};
use crate::path::Path;
use crate::peniko::Fill;
use crate::style::{PathEffect, Style, StyleKind};

/// Flattening tolerance for stroke expansion, in device pixels.
const STROKE_TOLERANCE: f64 = 0.25;

/// The geometry of a [`Shape`].
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Covers nothing, unless inverse-filled.
    Empty {
        /// Whether the empty geometry is inverse-filled.
        inverse: bool,
    },
    /// An axis-aligned rect.
    Rect(Rect),
    /// An oval inscribed in the rect.
    Oval(Rect),
    /// A rounded rect.
    RRect(RoundedRect),
    /// Anything else.
    Path(Path),
}

/// How much of the style [`Shape::apply_style`] resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyStyle {
    /// Only the path effect. Strokes stay strokes.
    PathEffectOnly,
    /// The path effect and the stroke, so that the result is a fill or hairline.
    PathEffectAndStroke,
}

/// A normalized geometry plus [`Style`].
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    style: Style,
}

impl Shape {
    /// A rect shape. Empty rects become empty geometry.
    pub fn from_rect(rect: Rect, style: Style) -> Self {
        let geometry = if rect.is_zero_area() && style.kind() == StyleKind::Fill {
            Geometry::Empty { inverse: false }
        } else {
            Geometry::Rect(rect.abs())
        };
        Self { geometry, style }
    }

    /// An oval shape.
    pub fn from_oval(oval: Rect, style: Style) -> Self {
        let geometry = if oval.is_zero_area() {
            Geometry::Empty { inverse: false }
        } else {
            Geometry::Oval(oval.abs())
        };
        Self { geometry, style }
    }

    /// A rounded rect shape. Rounded rects without radii become rects.
    pub fn from_rrect(rrect: RoundedRect, style: Style) -> Self {
        let radii = rrect.radii();
        if radii.top_left == 0.0
            && radii.top_right == 0.0
            && radii.bottom_right == 0.0
            && radii.bottom_left == 0.0
        {
            return Self::from_rect(rrect.rect(), style);
        }
        if rrect.rect().is_zero_area() {
            return Self {
                geometry: Geometry::Empty { inverse: false },
                style,
            };
        }
        Self {
            geometry: Geometry::RRect(rrect),
            style,
        }
    }

    /// A path shape.
    ///
    /// Paths that were built from a single rect, oval or rounded rect are
    /// simplified back to that shape, unless a path effect depends on where
    /// the contour starts or the path is inverse-filled.
    pub fn from_path(path: Path, style: Style) -> Self {
        if path.is_empty() {
            return Self {
                geometry: Geometry::Empty {
                    inverse: path.is_inverse_fill(),
                },
                style,
            };
        }
        if !path.is_inverse_fill() && !style.has_path_effect() {
            if let Some(rect) = path.as_rect() {
                return Self::from_rect(rect, style);
            }
            if let Some(oval) = path.as_oval() {
                return Self::from_oval(oval, style);
            }
            if let Some(rrect) = path.as_rrect() {
                return Self::from_rrect(rrect, style);
            }
        }
        Self {
            geometry: Geometry::Path(path),
            style,
        }
    }

    /// The geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Whether the geometry covers nothing (inverse fills of empty geometry
    /// still cover everything).
    pub fn is_empty(&self) -> bool {
        matches!(self.geometry, Geometry::Empty { .. })
    }

    /// Whether the shape covers the outside of its geometry.
    pub fn inverse_filled(&self) -> bool {
        match &self.geometry {
            Geometry::Empty { inverse } => *inverse,
            Geometry::Path(path) => path.is_inverse_fill(),
            _ => false,
        }
    }

    /// Whether the filled geometry is convex.
    pub fn is_convex(&self) -> bool {
        match &self.geometry {
            Geometry::Empty { inverse } => !inverse,
            Geometry::Rect(_) | Geometry::Oval(_) | Geometry::RRect(_) => true,
            Geometry::Path(path) => !path.is_inverse_fill() && path.is_convex(),
        }
    }

    /// The end points, if the geometry is a single line segment.
    pub fn as_line(&self) -> Option<[Point; 2]> {
        match &self.geometry {
            Geometry::Path(path) if !path.is_inverse_fill() => path.as_line(),
            _ => None,
        }
    }

    /// Whether the geometry can be keyed for caching derived data such as
    /// triangulations. Volatile paths can't.
    pub fn has_unstyled_key(&self) -> bool {
        match &self.geometry {
            Geometry::Path(path) => !path.is_volatile(),
            _ => true,
        }
    }

    /// The fill rule used when the geometry is treated as a path.
    pub fn fill_rule(&self) -> Fill {
        match &self.geometry {
            Geometry::Path(path) => path.fill_rule(),
            _ => Fill::NonZero,
        }
    }

    /// Bounds of the geometry, ignoring the style.
    pub fn bounds(&self) -> Rect {
        match &self.geometry {
            Geometry::Empty { .. } => Rect::ZERO,
            Geometry::Rect(rect) | Geometry::Oval(rect) => *rect,
            Geometry::RRect(rrect) => rrect.rect(),
            Geometry::Path(path) => path.bounds(),
        }
    }

    /// Bounds of the geometry after the style is applied.
    pub fn styled_bounds(&self) -> Rect {
        if self.is_empty() {
            return Rect::ZERO;
        }
        self.bounds().inflate(
            self.style.inflation_radius(),
            self.style.inflation_radius(),
        )
    }

    /// The geometry as a path, keeping the fill rule and inverse flag.
    pub fn as_path(&self) -> Path {
        match &self.geometry {
            Geometry::Empty { inverse } => {
                let mut path = Path::new();
                path.set_inverse_fill(*inverse);
                path
            }
            Geometry::Rect(rect) => Path::from_rect(*rect),
            Geometry::Oval(oval) => Path::from_oval(*oval),
            Geometry::RRect(rrect) => Path::from_rrect(*rrect),
            Geometry::Path(path) => path.clone(),
        }
    }

    /// Resolve part of the style into the geometry.
    ///
    /// `scale` is the largest scale factor of the view transform; stroke
    /// expansion flattens finely enough for that scale.
    pub fn apply_style(&self, apply: ApplyStyle, scale: f64) -> Self {
        let mut style = self.style.clone();
        let mut path = self.as_path();

        if let Some(PathEffect::Dash { intervals, phase }) = style.path_effect() {
            let dashed = if style.path_effect().is_some_and(PathEffect::is_valid) {
                kurbo::dash(path.elements().iter().copied(), *phase, intervals)
                    .collect::<BezPath>()
            } else {
                log::debug!("Dropping invalid dash pattern {intervals:?}");
                path.bez_path().clone()
            };
            let mut next = Path::from_bez_path(dashed, path.fill_rule());
            next.set_inverse_fill(path.is_inverse_fill());
            next.set_volatile(true);
            path = next;
            style = style.without_path_effect();
        }

        if apply == ApplyStyle::PathEffectAndStroke {
            match (style.kind(), style.stroke_params()) {
                (StyleKind::Stroke, Some(stroke)) => {
                    let outline = kurbo::stroke(
                        path.elements().iter().copied(),
                        stroke,
                        &StrokeOpts::default(),
                        STROKE_TOLERANCE / scale.max(1.0 / 64.0),
                    );
                    let mut next = Path::from_bez_path(outline, Fill::NonZero);
                    next.set_inverse_fill(path.is_inverse_fill());
                    next.set_volatile(true);
                    path = next;
                    style = Style::fill();
                }
                (StyleKind::StrokeAndFill, Some(stroke)) => {
                    let outline = kurbo::stroke(
                        path.elements().iter().copied(),
                        stroke,
                        &StrokeOpts::default(),
                        STROKE_TOLERANCE / scale.max(1.0 / 64.0),
                    );
                    let mut combined = path.bez_path().clone();
                    combined.extend(outline);
                    let mut next = Path::from_bez_path(combined, Fill::NonZero);
                    next.set_inverse_fill(path.is_inverse_fill());
                    next.set_volatile(true);
                    path = next;
                    style = Style::fill();
                }
                _ => {}
            }
        }

        // Keep the geometry the caller gave us when nothing changed.
        if style == self.style {
            return self.clone();
        }
        Self::from_path(path, style)
    }
}
