// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paths with the fill information and shape classification needed for dispatch.

use core::f64::consts::TAU;

use smallvec::SmallVec;

use crate::kurbo::{BezPath, Ellipse, PathEl, Point, Rect, RoundedRect, Shape};
use crate::peniko::Fill;

/// Tolerance used to turn ovals and rounded rects into path elements.
pub(crate) const SHAPE_TOLERANCE: f64 = 0.1;

/// The direction a closed contour is wound in, in y-down device space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise on screen.
    Clockwise,
    /// Counter-clockwise on screen.
    CounterClockwise,
}

/// What the path was built from, while it still contains only that one shape.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ShapeHint {
    None,
    Rect(Rect),
    Oval(Rect),
    RRect(RoundedRect),
}

/// A [`BezPath`] together with its fill rule, inverse-fill flag and volatility.
///
/// Paths built through [`Path::add_rect`], [`Path::add_oval`] or
/// [`Path::add_rrect`] remember that shape for as long as nothing else is
/// appended, which lets the draw context route them to the specialized renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    path: BezPath,
    fill: Fill,
    inverse: bool,
    volatile: bool,
    hint: ShapeHint,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BezPath> for Path {
    fn from(path: BezPath) -> Self {
        Self::from_bez_path(path, Fill::NonZero)
    }
}

impl Path {
    /// An empty, non-zero filled path.
    pub fn new() -> Self {
        Self {
            path: BezPath::new(),
            fill: Fill::NonZero,
            inverse: false,
            volatile: false,
            hint: ShapeHint::None,
        }
    }

    /// Wrap an existing path.
    pub fn from_bez_path(path: BezPath, fill: Fill) -> Self {
        Self {
            path,
            fill,
            ..Self::new()
        }
    }

    /// A path holding a single clockwise rect.
    pub fn from_rect(rect: Rect) -> Self {
        let mut path = Self::new();
        path.add_rect(rect);
        path
    }

    /// A path holding a single oval inscribed in `rect`.
    pub fn from_oval(rect: Rect) -> Self {
        let mut path = Self::new();
        path.add_oval(rect);
        path
    }

    /// A path holding a single rounded rect.
    pub fn from_rrect(rrect: RoundedRect) -> Self {
        let mut path = Self::new();
        path.add_rrect(rrect);
        path
    }

    /// The underlying path.
    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    /// The elements of the path.
    pub fn elements(&self) -> &[PathEl] {
        self.path.elements()
    }

    /// The fill rule.
    pub fn fill_rule(&self) -> Fill {
        self.fill
    }

    /// Set the fill rule.
    pub fn set_fill_rule(&mut self, fill: Fill) {
        self.fill = fill;
    }

    /// Inverse-filled paths cover everything outside of their outline.
    pub fn is_inverse_fill(&self) -> bool {
        self.inverse
    }

    /// Set whether the path is inverse-filled.
    pub fn set_inverse_fill(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    /// Volatile paths are drawn once and never worth caching.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Mark the path as volatile.
    pub fn set_volatile(&mut self, volatile: bool) {
        self.volatile = volatile;
    }

    /// A path is empty when it has nothing but move-to elements.
    pub fn is_empty(&self) -> bool {
        self.path
            .elements()
            .iter()
            .all(|el| matches!(el, PathEl::MoveTo(_)))
    }

    /// The bounding box of the outline. This ignores inverse filling.
    pub fn bounds(&self) -> Rect {
        if self.is_empty() {
            return Rect::ZERO;
        }
        self.path.bounding_box()
    }

    /// Append a closed, clockwise rect contour.
    pub fn add_rect(&mut self, rect: Rect) {
        self.add_rect_with_direction(rect, Direction::Clockwise);
    }

    /// Append a closed rect contour wound in `direction`.
    pub fn add_rect_with_direction(&mut self, rect: Rect, direction: Direction) {
        let was_empty = self.is_empty();
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        self.path.move_to(corners[0]);
        match direction {
            Direction::Clockwise => {
                for p in &corners[1..] {
                    self.path.line_to(*p);
                }
            }
            Direction::CounterClockwise => {
                for p in corners[1..].iter().rev() {
                    self.path.line_to(*p);
                }
            }
        }
        self.path.close_path();
        self.hint = if was_empty {
            ShapeHint::Rect(rect)
        } else {
            ShapeHint::None
        };
    }

    /// Append an oval inscribed in `rect`.
    pub fn add_oval(&mut self, rect: Rect) {
        let was_empty = self.is_empty();
        self.path
            .extend(Ellipse::from_rect(rect).path_elements(SHAPE_TOLERANCE));
        self.hint = if was_empty {
            ShapeHint::Oval(rect)
        } else {
            ShapeHint::None
        };
    }

    /// Append a rounded rect.
    pub fn add_rrect(&mut self, rrect: RoundedRect) {
        let was_empty = self.is_empty();
        self.path.extend(rrect.path_elements(SHAPE_TOLERANCE));
        self.hint = if was_empty {
            ShapeHint::RRect(rrect)
        } else {
            ShapeHint::None
        };
    }

    /// Start a new contour.
    pub fn move_to(&mut self, p: impl Into<Point>) {
        self.path.move_to(p);
        self.hint = ShapeHint::None;
    }

    /// Add a line segment.
    pub fn line_to(&mut self, p: impl Into<Point>) {
        self.path.line_to(p);
        self.hint = ShapeHint::None;
    }

    /// Add a quadratic segment.
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) {
        self.path.quad_to(p1.into(), p2.into());
        self.hint = ShapeHint::None;
    }

    /// Add a cubic segment.
    pub fn curve_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) {
        self.path.curve_to(p1.into(), p2.into(), p3.into());
        self.hint = ShapeHint::None;
    }

    /// Close the current contour.
    pub fn close_path(&mut self) {
        self.path.close_path();
        self.hint = ShapeHint::None;
    }

    /// The rect this path outlines, if it is one.
    pub fn as_rect(&self) -> Option<Rect> {
        if let ShapeHint::Rect(rect) = self.hint {
            return Some(rect);
        }
        match self.line_contours()?.as_slice() {
            [contour] => contour_as_rect(contour).map(|(rect, _)| rect),
            _ => None,
        }
    }

    /// The bounds of the oval this path outlines, if it was built from one.
    pub fn as_oval(&self) -> Option<Rect> {
        match self.hint {
            ShapeHint::Oval(rect) => Some(rect),
            _ => None,
        }
    }

    /// The rounded rect this path outlines, if it was built from one.
    pub fn as_rrect(&self) -> Option<RoundedRect> {
        match self.hint {
            ShapeHint::RRect(rrect) => Some(rrect),
            _ => None,
        }
    }

    /// The end points, if the path is a single line segment.
    pub fn as_line(&self) -> Option<[Point; 2]> {
        match self.path.elements() {
            [PathEl::MoveTo(p0), PathEl::LineTo(p1)] => Some([*p0, *p1]),
            _ => None,
        }
    }

    /// Whether the path consists of exactly two nested rect contours.
    ///
    /// On success, returns the outer rect first, along with the direction each
    /// of the two rects is wound in.
    pub fn nested_fill_rects(&self) -> Option<([Rect; 2], [Direction; 2])> {
        let contours = self.line_contours()?;
        let [first, second] = contours.as_slice() else {
            return None;
        };
        let (r0, d0) = contour_as_rect(first)?;
        let (r1, d1) = contour_as_rect(second)?;
        if contains(&r0, &r1) {
            Some(([r0, r1], [d0, d1]))
        } else if contains(&r1, &r0) {
            Some(([r1, r0], [d1, d0]))
        } else {
            None
        }
    }

    /// Whether the path is a single convex contour.
    ///
    /// Control points are treated as polygon vertices, which is conservative:
    /// a curve whose control polygon is convex is convex itself.
    pub fn is_convex(&self) -> bool {
        let mut points: SmallVec<[Point; 16]> = SmallVec::new();
        let mut contours = 0;
        for el in self.path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    contours += 1;
                    points.push(p);
                }
                PathEl::LineTo(p) => points.push(p),
                PathEl::QuadTo(p1, p2) => points.extend([p1, p2]),
                PathEl::CurveTo(p1, p2, p3) => points.extend([p1, p2, p3]),
                PathEl::ClosePath => {}
            }
        }
        // A trailing move-to doesn't start a real contour.
        if matches!(self.path.elements().last(), Some(PathEl::MoveTo(_))) {
            contours -= 1;
            points.pop();
        }
        if contours > 1 {
            return false;
        }
        points.dedup_by(|a, b| a == b);
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return true;
        }

        let n = points.len();
        let mut sign = 0.0_f64;
        let mut turning = 0.0;
        for i in 0..n {
            let e0 = points[(i + 1) % n] - points[i];
            let e1 = points[(i + 2) % n] - points[(i + 1) % n];
            let cross = e0.cross(e1);
            if cross.abs() > f64::EPSILON {
                if sign == 0.0 {
                    sign = cross.signum();
                } else if sign != cross.signum() {
                    return false;
                }
            }
            turning += cross.atan2(e0.dot(e1));
        }
        // Self-overlapping star shapes turn consistently, but more than once.
        (turning.abs() - TAU).abs() < 1e-3 || sign == 0.0
    }

    /// Contours as polygons, or `None` if any segment is curved.
    fn line_contours(&self) -> Option<SmallVec<[SmallVec<[Point; 5]>; 2]>> {
        let mut contours: SmallVec<[SmallVec<[Point; 5]>; 2]> = SmallVec::new();
        for el in self.path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    let mut contour = SmallVec::new();
                    contour.push(p);
                    contours.push(contour);
                }
                PathEl::LineTo(p) => contours.last_mut()?.push(p),
                PathEl::ClosePath => {}
                PathEl::QuadTo(..) | PathEl::CurveTo(..) => return None,
            }
        }
        contours.retain(|c| c.len() > 1);
        Some(contours)
    }
}

fn contains(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Classify a polygon as an axis-aligned rect.
fn contour_as_rect(points: &[Point]) -> Option<(Rect, Direction)> {
    let mut pts: SmallVec<[Point; 5]> = points.iter().copied().collect();
    pts.dedup_by(|a, b| a == b);
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() != 4 {
        return None;
    }
    let mut horizontal_first = None;
    for i in 0..4 {
        let d = pts[(i + 1) % 4] - pts[i];
        let horizontal = match (d.x == 0.0, d.y == 0.0) {
            (false, true) => true,
            (true, false) => false,
            _ => return None,
        };
        // Edges must alternate between horizontal and vertical.
        let expected = *horizontal_first.get_or_insert(horizontal) == (i % 2 == 0);
        if horizontal != expected {
            return None;
        }
    }
    let area: f64 = (0..4)
        .map(|i| pts[i].to_vec2().cross(pts[(i + 1) % 4].to_vec2()))
        .sum();
    let direction = if area > 0.0 {
        Direction::Clockwise
    } else {
        Direction::CounterClockwise
    };
    Some((Rect::from_points(pts[0], pts[2]), direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_paths_are_recognized_without_hint() {
        let mut path = Path::new();
        path.move_to((10.0, 10.0));
        path.line_to((10.0, 50.0));
        path.line_to((40.0, 50.0));
        path.line_to((40.0, 10.0));
        path.close_path();
        assert_eq!(path.as_rect(), Some(Rect::new(10.0, 10.0, 40.0, 50.0)));
        assert!(path.is_convex());
    }

    #[test]
    fn curves_take_mixed_point_types() {
        let mut path = Path::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        path.move_to((0.0, 20.0));
        path.quad_to(Point::new(5.0, 30.0), (10.0, 20.0));
        path.curve_to((12.0, 22.0), Point::new(14.0, 24.0), (16.0, 20.0));
        assert_eq!(path.as_rect(), None);
        let curves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::QuadTo(..) | PathEl::CurveTo(..)))
            .count();
        assert_eq!(curves, 2);
        assert_eq!(path.bounds().x1, 16.0);
    }

    #[test]
    fn shape_hint_is_dropped_once_more_is_appended() {
        let mut path = Path::from_oval(Rect::new(0.0, 0.0, 10.0, 20.0));
        assert_eq!(path.as_oval(), Some(Rect::new(0.0, 0.0, 10.0, 20.0)));
        path.line_to((30.0, 30.0));
        assert_eq!(path.as_oval(), None);
    }

    #[test]
    fn nested_rects_report_outer_first_with_directions() {
        let mut path = Path::new();
        path.add_rect_with_direction(Rect::new(2.0, 2.0, 8.0, 8.0), Direction::CounterClockwise);
        path.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let (rects, dirs) = path.nested_fill_rects().unwrap();
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rects[1], Rect::new(2.0, 2.0, 8.0, 8.0));
        assert_eq!(dirs, [Direction::Clockwise, Direction::CounterClockwise]);
        assert!(!path.is_convex());
    }

    #[test]
    fn concave_and_star_contours_are_not_convex() {
        let mut arrow = Path::new();
        arrow.move_to((0.0, 0.0));
        arrow.line_to((10.0, 5.0));
        arrow.line_to((0.0, 10.0));
        arrow.line_to((4.0, 5.0));
        arrow.close_path();
        assert!(!arrow.is_convex());

        let mut star = Path::new();
        let pts = [(50.0, 0.0), (61.0, 90.0), (0.0, 35.0), (100.0, 35.0), (39.0, 90.0)];
        star.move_to(pts[0]);
        for p in &pts[1..] {
            star.line_to(*p);
        }
        star.close_path();
        assert!(!star.is_convex());
    }

    #[test]
    fn lone_move_to_is_empty() {
        let mut path = Path::new();
        path.move_to((1.0, 1.0));
        assert!(path.is_empty());
        assert_eq!(path.bounds(), Rect::ZERO);
    }
}
