// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed function state a batch is drawn with.

use smallvec::SmallVec;

use crate::paint::{Effect, Paint, TransferMode};

/// How edges are antialiased.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AaMode {
    /// Aliased edges.
    #[default]
    None,
    /// Fractional coverage computed by the geometry or the fragment shader.
    Coverage,
    /// Hardware multisampling.
    Msaa,
}

/// A stencil comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilTest {
    /// Always pass.
    Always,
    /// Pass where the stencil value equals the reference.
    Equal,
    /// Pass where the stencil value differs from the reference.
    NotEqual,
    /// Pass where the stencil value equals the reference and the clip bit is set.
    EqualIfInClip,
    /// Pass where the reference is less than the stencil value.
    Less,
    /// Pass where the reference is greater than the stencil value.
    Greater,
}

/// What happens to the stencil value of a fragment that passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Leave it.
    Keep,
    /// Write the reference value.
    Replace,
    /// Write zero.
    Zero,
    /// Flip all bits.
    Invert,
    /// Increment with wrapping.
    IncWrap,
    /// Decrement with wrapping.
    DecWrap,
}

/// Stencil state supplied by the caller rather than by a path renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserStencilSettings {
    /// The comparison.
    pub test: StencilTest,
    /// Applied when the comparison passes.
    pub pass_op: StencilOp,
    /// Applied when the comparison fails.
    pub fail_op: StencilOp,
    /// Reference value.
    pub reference: u16,
    /// Bits taking part in the comparison and the write.
    pub mask: u16,
}

impl UserStencilSettings {
    /// Write `reference` everywhere the draw covers.
    pub const fn replace(reference: u16) -> Self {
        Self {
            test: StencilTest::Always,
            pass_op: StencilOp::Replace,
            fail_op: StencilOp::Keep,
            reference,
            mask: 0xffff,
        }
    }

    /// Only draw where the stencil holds `reference`.
    pub const fn test_equal(reference: u16) -> Self {
        Self {
            test: StencilTest::Equal,
            pass_op: StencilOp::Keep,
            fail_op: StencilOp::Keep,
            reference,
            mask: 0xffff,
        }
    }
}

/// Immutable pipeline state derived once per draw from the paint and the
/// antialiasing decision.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineState {
    aa: AaMode,
    snap_to_pixel_centers: bool,
    user_stencil: Option<UserStencilSettings>,
    transfer: TransferMode,
    color_effects: SmallVec<[Effect; 2]>,
    coverage_effects: SmallVec<[Effect; 2]>,
    gamma_correct: bool,
}

impl PipelineState {
    /// Derive the state from a paint.
    ///
    /// `use_hw_aa` selects multisampling; otherwise coverage AA is used when
    /// the paint asks for antialiasing.
    pub fn new(paint: &Paint, use_hw_aa: bool) -> Self {
        let aa = if use_hw_aa {
            AaMode::Msaa
        } else if paint.is_anti_alias() {
            AaMode::Coverage
        } else {
            AaMode::None
        };
        Self {
            aa,
            snap_to_pixel_centers: false,
            user_stencil: None,
            transfer: paint.transfer(),
            color_effects: paint.color_effects().iter().cloned().collect(),
            coverage_effects: paint.coverage_effects().iter().cloned().collect(),
            gamma_correct: false,
        }
    }

    /// Snap vertices to pixel centers.
    #[must_use]
    pub fn with_snap_to_pixel_centers(mut self, snap: bool) -> Self {
        self.snap_to_pixel_centers = snap;
        self
    }

    /// Attach caller supplied stencil settings.
    #[must_use]
    pub fn with_user_stencil(mut self, settings: Option<UserStencilSettings>) -> Self {
        self.user_stencil = settings;
        self
    }

    /// Whether the target blends in linear space.
    #[must_use]
    pub fn with_gamma_correct(mut self, gamma_correct: bool) -> Self {
        self.gamma_correct = gamma_correct;
        self
    }

    /// The antialiasing mode.
    pub fn aa(&self) -> AaMode {
        self.aa
    }

    /// Whether hardware multisampling is enabled.
    pub fn is_hw_antialias(&self) -> bool {
        self.aa == AaMode::Msaa
    }

    /// Whether vertices are snapped to pixel centers.
    pub fn snap_to_pixel_centers(&self) -> bool {
        self.snap_to_pixel_centers
    }

    /// Caller supplied stencil settings.
    pub fn user_stencil(&self) -> Option<&UserStencilSettings> {
        self.user_stencil.as_ref()
    }

    /// The transfer mode.
    pub fn transfer(&self) -> TransferMode {
        self.transfer
    }

    /// Color effects, in order.
    pub fn color_effects(&self) -> &[Effect] {
        &self.color_effects
    }

    /// Coverage effects, in order.
    pub fn coverage_effects(&self) -> &[Effect] {
        &self.coverage_effects
    }

    /// Whether blending happens in linear space.
    pub fn gamma_correct(&self) -> bool {
        self.gamma_correct
    }
}
