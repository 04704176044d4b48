// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer device rectangles and the transform classification that the dispatch
//! decisions rely on.

use crate::kurbo::{Affine, Point, Rect, RoundedRect, RoundedRectRadii};

/// Tolerance used when comparing transform coefficients and geometry against zero.
pub const NEARLY_ZERO: f64 = 1.0 / 4096.0;

/// Returns `true` if `a` and `b` differ by at most [`NEARLY_ZERO`].
#[inline]
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= NEARLY_ZERO
}

/// An integer, half-open device rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    /// Left edge, inclusive.
    pub x0: i32,
    /// Top edge, inclusive.
    pub y0: i32,
    /// Right edge, exclusive.
    pub x1: i32,
    /// Bottom edge, exclusive.
    pub y1: i32,
}

impl IRect {
    /// Create a rectangle from its edges.
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The rectangle `(0, 0, width, height)`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(
            0,
            0,
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        )
    }

    /// Width, zero for inverted rectangles.
    pub fn width(&self) -> i32 {
        let width = (i64::from(self.x1) - i64::from(self.x0)).max(0);
        i32::try_from(width).unwrap_or(i32::MAX)
    }

    /// Height, zero for inverted rectangles.
    pub fn height(&self) -> i32 {
        let height = (i64::from(self.y1) - i64::from(self.y0)).max(0);
        i32::try_from(height).unwrap_or(i32::MAX)
    }

    /// A rectangle is empty when it covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Whether `other` lies entirely inside `self`. Empty rectangles are never contained.
    pub fn contains(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 <= other.x0
            && self.y0 <= other.y0
            && self.x1 >= other.x1
            && self.y1 >= other.y1
    }

    /// The overlap of two rectangles, or `None` if they don't share a pixel.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let r = Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    /// The smallest integer rectangle covering `rect`.
    pub fn round_out(rect: Rect) -> Self {
        // Clamped into i32 range first, so the cast can't wrap.
        let clamp = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        Self::new(
            clamp(rect.x0.floor()),
            clamp(rect.y0.floor()),
            clamp(rect.x1.ceil()),
            clamp(rect.y1.ceil()),
        )
    }

    /// Convert to a floating point rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }
}

/// A rect is empty unless it has positive width and height.
#[inline]
pub fn rect_is_empty(rect: &Rect) -> bool {
    !(rect.x0 < rect.x1 && rect.y0 < rect.y1)
}

/// The overlap of two rects, or `None` if it's empty.
pub fn intersect_rect(a: &Rect, b: &Rect) -> Option<Rect> {
    let r = Rect::new(
        a.x0.max(b.x0),
        a.y0.max(b.y0),
        a.x1.min(b.x1),
        a.y1.min(b.y1),
    );
    (!rect_is_empty(&r)).then_some(r)
}

/// Whether `outer` contains `inner`. Empty rects are never contained.
pub fn rect_contains_rect(outer: &Rect, inner: &Rect) -> bool {
    !rect_is_empty(outer)
        && !rect_is_empty(inner)
        && outer.x0 <= inner.x0
        && outer.y0 <= inner.y0
        && outer.x1 >= inner.x1
        && outer.y1 >= inner.y1
}

/// Point containment that includes the right and bottom edges.
#[inline]
pub fn rect_contains_point_inclusive(rect: &Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether two rects share any area.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Map the four corners of `rect`, clockwise from the top left.
pub fn map_rect_to_quad(transform: Affine, rect: &Rect) -> [Point; 4] {
    [
        transform * Point::new(rect.x0, rect.y0),
        transform * Point::new(rect.x1, rect.y0),
        transform * Point::new(rect.x1, rect.y1),
        transform * Point::new(rect.x0, rect.y1),
    ]
}

/// The bounding box of `rect` after `transform`.
#[inline]
pub fn map_rect(transform: Affine, rect: &Rect) -> Rect {
    transform.transform_rect_bbox(*rect)
}

fn is_degenerate_2x2(a: f64, b: f64, c: f64, d: f64) -> bool {
    (a * d - b * c).abs() <= NEARLY_ZERO * NEARLY_ZERO
}

/// The inverse of `transform`, or `None` when it collapses the plane.
pub fn invert(transform: Affine) -> Option<Affine> {
    let det = transform.determinant();
    if !det.is_finite() || det.abs() <= NEARLY_ZERO * NEARLY_ZERO * NEARLY_ZERO {
        return None;
    }
    let inverse = transform.inverse();
    inverse
        .as_coeffs()
        .iter()
        .all(|c| c.is_finite())
        .then_some(inverse)
}

/// Whether the transform only scales and translates.
#[inline]
pub fn is_scale_translate(transform: Affine) -> bool {
    let [_, b, c, _, _, _] = transform.as_coeffs();
    b == 0.0 && c == 0.0
}

/// Whether axis-aligned rects stay axis-aligned rects under `transform`.
///
/// This allows scales (including mirroring) and 90 degree rotations, but no
/// skew and no collapse onto a line.
pub fn rect_stays_rect(transform: Affine) -> bool {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    (b == 0.0 && c == 0.0 && a != 0.0 && d != 0.0)
        || (a == 0.0 && d == 0.0 && b != 0.0 && c != 0.0)
}

/// Whether right angles stay right angles: rotation and (non-uniform) scale are
/// fine, skew is not.
pub fn preserves_right_angles(transform: Affine) -> bool {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    if is_degenerate_2x2(a, b, c, d) {
        return false;
    }
    (a * c + b * d).abs() <= NEARLY_ZERO * NEARLY_ZERO
}

/// Whether the transform is a rotation, uniform scale, mirror and translation.
pub fn is_similarity(transform: Affine) -> bool {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    if is_degenerate_2x2(a, b, c, d) {
        return false;
    }
    let len0 = a * a + b * b;
    let len1 = c * c + d * d;
    let tol = NEARLY_ZERO * len0.max(len1).max(1.0);
    (len0 - len1).abs() <= tol && (a * c + b * d).abs() <= tol
}

/// Map a rounded rect through a transform that scales both axes by the same
/// magnitude, possibly mirrored, and translates.
///
/// Corner radii are circular, so other transforms return `None`.
pub fn map_rrect(transform: Affine, rrect: &RoundedRect) -> Option<RoundedRect> {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    if b != 0.0 || c != 0.0 || a == 0.0 || !nearly_equal(a.abs(), d.abs()) {
        return None;
    }
    let scale = a.abs();
    let r = rrect.radii();
    let (mut tl, mut tr, mut br, mut bl) = (r.top_left, r.top_right, r.bottom_right, r.bottom_left);
    if a < 0.0 {
        (tl, tr) = (tr, tl);
        (bl, br) = (br, bl);
    }
    if d < 0.0 {
        (tl, bl) = (bl, tl);
        (tr, br) = (br, tr);
    }
    let radii = RoundedRectRadii::new(tl * scale, tr * scale, br * scale, bl * scale);
    Some(RoundedRect::from_rect(map_rect(transform, &rrect.rect()), radii))
}

/// The largest factor by which `transform` stretches any vector.
pub fn max_scale(transform: Affine) -> f64 {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    let s = a * a + b * b + c * c + d * d;
    let det = a * d - b * c;
    let disc = (s * s - 4.0 * det * det).max(0.0).sqrt();
    ((s + disc) * 0.5).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn irect_intersect_and_contains() {
        let a = IRect::new(0, 0, 10, 10);
        let b = IRect::new(5, 5, 20, 20);
        assert_eq!(a.intersect(&b), Some(IRect::new(5, 5, 10, 10)));
        assert_eq!(a.intersect(&IRect::new(10, 0, 20, 10)), None);
        assert!(a.contains(&IRect::new(1, 1, 9, 9)));
        assert!(!a.contains(&b));
    }

    #[test]
    fn irect_size_saturates() {
        assert_eq!(IRect::new(i32::MIN, 0, i32::MAX, 1).width(), i32::MAX);
        assert_eq!(IRect::new(0, i32::MIN, 1, i32::MAX).height(), i32::MAX);
        assert_eq!(IRect::new(10, 10, 5, 5).width(), 0);
        assert_eq!(IRect::new(-3, 2, 4, 9).height(), 7);
    }

    #[test]
    fn round_out_covers_fractional_edges() {
        let r = IRect::round_out(Rect::new(0.5, 1.2, 9.1, 9.0));
        assert_eq!(r, IRect::new(0, 1, 10, 9));
    }

    #[test]
    fn rect_stays_rect_classification() {
        assert!(rect_stays_rect(Affine::IDENTITY));
        assert!(rect_stays_rect(Affine::scale_non_uniform(2.0, -3.0)));
        assert!(rect_stays_rect(Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0])));
        assert!(!rect_stays_rect(Affine::rotate(0.3)));
        assert!(!rect_stays_rect(Affine::scale_non_uniform(0.0, 1.0)));
    }

    #[test]
    fn right_angles_survive_rotation_but_not_skew() {
        assert!(preserves_right_angles(Affine::rotate(0.7)));
        assert!(preserves_right_angles(
            Affine::rotate(0.7) * Affine::scale_non_uniform(2.0, 5.0)
        ));
        assert!(!preserves_right_angles(Affine::skew(0.5, 0.0)));
    }

    #[test]
    fn similarity_needs_uniform_scale() {
        assert!(is_similarity(Affine::rotate(FRAC_PI_2) * Affine::scale(3.0)));
        assert!(!is_similarity(Affine::scale_non_uniform(1.0, 2.0)));
    }

    #[test]
    fn singular_transforms_do_not_invert() {
        assert!(invert(Affine::scale_non_uniform(1.0, 0.0)).is_none());
        let inv = invert(Affine::translate((3.0, 4.0))).unwrap();
        assert_eq!(inv * Point::new(3.0, 4.0), Point::ZERO);
    }

    #[test]
    fn mirrored_rrects_swap_corners() {
        let rrect = RoundedRect::new(0.0, 0.0, 10.0, 10.0, (1.0, 2.0, 3.0, 4.0));
        let flipped = map_rrect(Affine::scale_non_uniform(-2.0, 2.0), &rrect).unwrap();
        let radii = flipped.radii();
        assert_eq!(flipped.rect(), Rect::new(-20.0, 0.0, 0.0, 20.0));
        assert_eq!(
            (radii.top_left, radii.top_right, radii.bottom_right, radii.bottom_left),
            (4.0, 2.0, 8.0, 6.0)
        );
        assert!(map_rrect(Affine::scale_non_uniform(1.0, 2.0), &rrect).is_none());
        assert!(map_rrect(Affine::rotate(0.1), &rrect).is_none());
    }

    #[test]
    fn max_scale_of_non_uniform_scale() {
        let s = max_scale(Affine::rotate(1.0) * Affine::scale_non_uniform(2.0, 7.0));
        assert!((s - 7.0).abs() < 1e-9);
    }
}
