// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill, stroke and hairline styles, with an optional dash path effect.

use smallvec::SmallVec;

use crate::kurbo::{Join, Stroke};

/// What kind of geometry a [`Style`] produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    /// The interior of the shape.
    Fill,
    /// A one device pixel wide outline, regardless of transform.
    Hairline,
    /// An outline of the stroke's width.
    Stroke,
    /// The interior together with the outline.
    StrokeAndFill,
}

/// A transformation of the geometry that happens before stroking.
#[derive(Clone, Debug, PartialEq)]
pub enum PathEffect {
    /// Break the outline into on/off segments.
    Dash {
        /// Alternating on and off lengths.
        intervals: SmallVec<[f64; 4]>,
        /// Distance into the pattern at which the outline starts.
        phase: f64,
    },
}

impl PathEffect {
    /// A dash effect.
    pub fn dash(intervals: impl IntoIterator<Item = f64>, phase: f64) -> Self {
        Self::Dash {
            intervals: intervals.into_iter().collect(),
            phase,
        }
    }

    /// Dash patterns need an even number of non-negative intervals with a
    /// positive total length.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Dash { intervals, phase } => {
                intervals.len() % 2 == 0
                    && !intervals.is_empty()
                    && intervals.iter().all(|i| i.is_finite() && *i >= 0.0)
                    && intervals.iter().sum::<f64>() > 0.0
                    && phase.is_finite()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Outline {
    Fill,
    Stroke(Stroke),
    StrokeAndFill(Stroke),
}

/// How a shape's geometry turns into covered pixels.
///
/// A stroke of width zero is a hairline.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    outline: Outline,
    path_effect: Option<PathEffect>,
}

impl Default for Style {
    fn default() -> Self {
        Self::fill()
    }
}

impl From<Stroke> for Style {
    fn from(stroke: Stroke) -> Self {
        Self::stroke(stroke)
    }
}

impl Style {
    /// Fill the shape, without any path effect.
    pub fn fill() -> Self {
        Self {
            outline: Outline::Fill,
            path_effect: None,
        }
    }

    /// A hairline outline.
    pub fn hairline() -> Self {
        Self::stroke(Stroke::new(0.0))
    }

    /// Stroke the outline.
    pub fn stroke(stroke: Stroke) -> Self {
        Self {
            outline: Outline::Stroke(stroke),
            path_effect: None,
        }
    }

    /// Fill the interior and stroke the outline.
    pub fn stroke_and_fill(stroke: Stroke) -> Self {
        Self {
            outline: Outline::StrokeAndFill(stroke),
            path_effect: None,
        }
    }

    /// Attach a path effect.
    #[must_use]
    pub fn with_path_effect(mut self, effect: PathEffect) -> Self {
        self.path_effect = Some(effect);
        self
    }

    /// The same style with its path effect removed.
    #[must_use]
    pub fn without_path_effect(&self) -> Self {
        Self {
            outline: self.outline.clone(),
            path_effect: None,
        }
    }

    /// The kind of geometry produced.
    pub fn kind(&self) -> StyleKind {
        match &self.outline {
            Outline::Fill => StyleKind::Fill,
            Outline::Stroke(stroke) if stroke.width == 0.0 => StyleKind::Hairline,
            Outline::Stroke(_) => StyleKind::Stroke,
            // Stroking with a hairline adds nothing to the fill.
            Outline::StrokeAndFill(stroke) if stroke.width == 0.0 => StyleKind::Fill,
            Outline::StrokeAndFill(_) => StyleKind::StrokeAndFill,
        }
    }

    /// The stroke parameters, for every kind but fill.
    pub fn stroke_params(&self) -> Option<&Stroke> {
        match &self.outline {
            Outline::Fill => None,
            Outline::Stroke(stroke) | Outline::StrokeAndFill(stroke) => Some(stroke),
        }
    }

    /// The path effect, if any.
    pub fn path_effect(&self) -> Option<&PathEffect> {
        self.path_effect.as_ref()
    }

    /// Whether there's a path effect left to apply.
    pub fn has_path_effect(&self) -> bool {
        self.path_effect.is_some()
    }

    /// A fill without a path effect.
    pub fn is_simple_fill(&self) -> bool {
        self.kind() == StyleKind::Fill && self.path_effect.is_none()
    }

    /// A hairline without a path effect.
    pub fn is_simple_hairline(&self) -> bool {
        self.kind() == StyleKind::Hairline && self.path_effect.is_none()
    }

    /// Whether the style changes the geometry before it can be filled.
    ///
    /// Hairlines don't count: renderers draw them directly.
    pub fn applies(&self) -> bool {
        self.path_effect.is_some()
            || matches!(self.kind(), StyleKind::Stroke | StyleKind::StrokeAndFill)
    }

    /// Stroke width, zero for fills and hairlines.
    pub fn width(&self) -> f64 {
        match self.kind() {
            StyleKind::Fill | StyleKind::Hairline => 0.0,
            StyleKind::Stroke | StyleKind::StrokeAndFill => {
                self.stroke_params().map_or(0.0, |s| s.width)
            }
        }
    }

    /// The join of the stroke, miter for fills.
    pub fn join(&self) -> Join {
        self.stroke_params().map_or(Join::Miter, |s| s.join)
    }

    /// How far the styled geometry can reach beyond the shape's outline, in
    /// local coordinates.
    pub fn inflation_radius(&self) -> f64 {
        let Some(stroke) = self.stroke_params() else {
            return 0.0;
        };
        let half = self.width() * 0.5;
        match stroke.join {
            Join::Miter if stroke.miter_limit > 1.0 => half * stroke.miter_limit,
            _ => half,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_stroke_is_a_hairline() {
        let style = Style::stroke(Stroke::new(0.0));
        assert_eq!(style.kind(), StyleKind::Hairline);
        assert!(style.is_simple_hairline());
        assert!(!style.applies());
    }

    #[test]
    fn path_effects_make_the_style_apply() {
        let style = Style::fill().with_path_effect(PathEffect::dash([4.0, 2.0], 0.0));
        assert!(style.applies());
        assert!(!style.is_simple_fill());
        assert!(style.without_path_effect().is_simple_fill());
    }

    #[test]
    fn hairline_stroke_and_fill_is_a_fill() {
        let style = Style::stroke_and_fill(Stroke::new(0.0));
        assert_eq!(style.kind(), StyleKind::Fill);
        assert!(style.is_simple_fill());
    }

    #[test]
    fn dash_validation() {
        assert!(PathEffect::dash([1.0, 1.0], 0.5).is_valid());
        assert!(!PathEffect::dash([1.0], 0.0).is_valid());
        assert!(!PathEffect::dash([0.0, 0.0], 0.0).is_valid());
    }
}
