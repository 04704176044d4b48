// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paints: the color, blending and per-fragment effects applied to a draw.

use smallvec::SmallVec;

use crate::kurbo::RoundedRect;
use crate::peniko::{BlendMode, Color, Compose, Mix};

/// Set operations used when drawing into the stencil clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionOp {
    /// Remove the drawn region.
    Difference,
    /// Keep only the overlap.
    Intersect,
    /// Add the drawn region.
    Union,
    /// Toggle the drawn region.
    Xor,
    /// The drawn region minus what's there.
    ReverseDifference,
    /// Only the drawn region.
    Replace,
}

/// How fragment colors reach the render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransferMode {
    /// Blend with the destination.
    Blend(BlendMode),
    /// Don't write color at all, used when only the stencil is of interest.
    DisableColor,
    /// Write coverage with a set operation, used to build clip masks.
    CoverageSetOp {
        /// The set operation.
        op: RegionOp,
        /// Whether coverage is inverted first.
        invert: bool,
    },
}

impl Default for TransferMode {
    fn default() -> Self {
        Self::Blend(BlendMode::default())
    }
}

/// Which side of an edge a coverage effect keeps, and whether it's antialiased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeType {
    /// Keep the inside, antialiased.
    FillAA,
    /// Keep the inside, aliased.
    FillBW,
    /// Keep the outside, antialiased.
    InverseFillAA,
    /// Keep the outside, aliased.
    InverseFillBW,
}

impl EdgeType {
    /// Whether the edge is antialiased.
    pub fn is_aa(self) -> bool {
        matches!(self, Self::FillAA | Self::InverseFillAA)
    }

    /// Whether the outside is kept.
    pub fn is_inverse(self) -> bool {
        matches!(self, Self::InverseFillAA | Self::InverseFillBW)
    }
}

/// Corners with a radius below this are drawn square by coverage effects.
const MIN_EFFECT_RADIUS: f64 = 0.5;

/// A coverage effect clipping to a device space rounded rect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RRectEffect {
    edge: EdgeType,
    rrect: RoundedRect,
}

impl RRectEffect {
    /// Build the effect, or `None` when the rounded rect can't be expressed as one.
    ///
    /// Corners are either square or share a single circular radius.
    pub fn new(edge: EdgeType, rrect: RoundedRect) -> Option<Self> {
        let rect = rrect.rect();
        if rect.is_zero_area() || !rect.is_finite() {
            return None;
        }
        let radii = rrect.radii();
        let corners = [
            radii.top_left,
            radii.top_right,
            radii.bottom_right,
            radii.bottom_left,
        ];
        let round = corners.iter().copied().find(|r| *r >= MIN_EFFECT_RADIUS);
        if let Some(radius) = round {
            let consistent = corners
                .iter()
                .all(|r| *r < MIN_EFFECT_RADIUS || *r == radius);
            if !consistent {
                return None;
            }
        }
        Some(Self { edge, rrect })
    }

    /// The edge type.
    pub fn edge(&self) -> EdgeType {
        self.edge
    }

    /// The device space rounded rect.
    pub fn rrect(&self) -> RoundedRect {
        self.rrect
    }
}

/// A per-fragment effect.
///
/// The effects themselves are compiled elsewhere. Dispatch only needs to know
/// that they exist, which ones it added itself, and how to compare them.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Clip coverage to a rounded rect.
    RRect(RRectEffect),
    /// An effect supplied by the caller, identified by a key.
    Opaque(u64),
}

/// The color, blending and effects of a draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    color: Color,
    anti_alias: bool,
    transfer: TransferMode,
    color_effects: SmallVec<[Effect; 2]>,
    coverage_effects: SmallVec<[Effect; 2]>,
}

impl Default for Paint {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl Paint {
    /// A source-over paint of a solid color, antialiased.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            anti_alias: true,
            transfer: TransferMode::default(),
            color_effects: SmallVec::new(),
            coverage_effects: SmallVec::new(),
        }
    }

    /// A copy with a different antialiasing flag.
    #[must_use]
    pub fn with_anti_alias(&self, anti_alias: bool) -> Self {
        Self {
            anti_alias,
            ..self.clone()
        }
    }

    /// A copy with a different blend mode.
    #[must_use]
    pub fn with_blend_mode(&self, mode: impl Into<BlendMode>) -> Self {
        self.with_transfer(TransferMode::Blend(mode.into()))
    }

    /// A copy with a different transfer mode.
    #[must_use]
    pub fn with_transfer(&self, transfer: TransferMode) -> Self {
        Self {
            transfer,
            ..self.clone()
        }
    }

    /// A copy with one more color effect.
    #[must_use]
    pub fn with_color_effect(&self, effect: Effect) -> Self {
        let mut paint = self.clone();
        paint.color_effects.push(effect);
        paint
    }

    /// A copy with one more coverage effect.
    #[must_use]
    pub fn with_coverage_effect(&self, effect: Effect) -> Self {
        let mut paint = self.clone();
        paint.coverage_effects.push(effect);
        paint
    }

    /// The input color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the paint asks for antialiasing.
    pub fn is_anti_alias(&self) -> bool {
        self.anti_alias
    }

    /// The transfer mode.
    pub fn transfer(&self) -> TransferMode {
        self.transfer
    }

    /// Effects that compute color.
    pub fn color_effects(&self) -> &[Effect] {
        &self.color_effects
    }

    /// Effects that modulate coverage.
    pub fn coverage_effects(&self) -> &[Effect] {
        &self.coverage_effects
    }

    /// Whether any effect is attached.
    pub fn has_effects(&self) -> bool {
        !self.color_effects.is_empty() || !self.coverage_effects.is_empty()
    }

    /// The color the target ends up with wherever this paint covers it fully,
    /// if that color doesn't depend on what's already there.
    pub fn constant_blended_color(&self) -> Option<Color> {
        if self.has_effects() {
            return None;
        }
        let TransferMode::Blend(BlendMode { mix, compose }) = self.transfer else {
            return None;
        };
        if !matches!(mix, Mix::Normal) {
            return None;
        }
        match compose {
            Compose::Copy => Some(self.color),
            Compose::Clear => Some(Color::TRANSPARENT),
            Compose::SrcOver if self.color.components[3] == 1.0 => Some(self.color),
            _ => None,
        }
    }
}
