// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instanced rendering of rects, ovals and rounded rects.
//!
//! When the backend supports it, common shapes skip the path renderers and
//! become a single instance record drawn with a shared vertex buffer. Every
//! `record_*` method may decline, in which case the caller falls back to the
//! regular batches.

use bytemuck::{Pod, Zeroable};

use crate::batch::{Batch, BatchKind, DrawColor, LocalCoords};
use crate::config::{Caps, InstancedSupport, PixelConfig};
use crate::kurbo::{Affine, Rect, RoundedRect};
use crate::math;
use crate::render_target::RenderTarget;

/// Which shape an instance draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstancedShape {
    /// A rect.
    Rect,
    /// An oval.
    Oval,
    /// A rounded rect.
    RRect,
    /// The area between two rounded rects.
    DRRect,
}

/// How an instance is antialiased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstancedAaMode {
    /// Aliased.
    None,
    /// Coverage computed in the shader.
    Coverage,
    /// Hardware multisampling.
    Msaa,
    /// Multisampled stencil with single sampled color.
    MixedSamples,
}

impl InstancedAaMode {
    fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Coverage => 1,
            Self::Msaa => 2,
            Self::MixedSamples => 3,
        }
    }
}

/// The per-instance data uploaded to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceRecord {
    /// Shape in the low byte, antialiasing mode in the second, local coords in the third.
    pub info: u32,
    /// Packed premultiplied color.
    pub color: u32,
    /// View transform, `kurbo` coefficient order.
    pub view: [f32; 6],
    /// Local bounds of the shape.
    pub bounds: [f32; 4],
    /// Shape parameters: corner radii, then the inner rect or local coordinates.
    pub params: [f32; 8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LocalKind {
    None = 0,
    Rect = 1,
    Matrix = 2,
}

/// Pipeline facts the instanced renderer needs from the render target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstancedPipelineInfo {
    /// The stencil buffer is multisampled.
    pub is_multisampled: bool,
    /// The stencil has more samples than color.
    pub is_mixed_sampled: bool,
    /// The target has a floating point format.
    pub is_rendering_to_float: bool,
    /// Color writes are disabled.
    pub color_disabled: bool,
}

impl InstancedPipelineInfo {
    /// Read the facts off a render target.
    pub fn new(rt: &RenderTarget) -> Self {
        Self {
            is_multisampled: rt.is_stencil_buffer_multisampled(),
            is_mixed_sampled: rt.is_mixed_sampled(),
            is_rendering_to_float: rt.config() == PixelConfig::RgbaF16,
            color_disabled: false,
        }
    }

    fn can_use_coverage_aa(&self) -> bool {
        !self.is_multisampled || self.color_disabled
    }
}

fn f32s<const N: usize>(values: [f64; N]) -> [f32; N] {
    values.map(|v| v as f32)
}

fn rrect_radii(rrect: &RoundedRect) -> [f64; 4] {
    let radii = rrect.radii();
    [
        radii.top_left,
        radii.top_right,
        radii.bottom_right,
        radii.bottom_left,
    ]
}

fn is_simple(rrect: &RoundedRect) -> bool {
    let [a, b, c, d] = rrect_radii(rrect);
    a == b && b == c && c == d
}

/// The instanced renderer of a draw target.
#[derive(Debug)]
pub(crate) struct InstancedRendering {
    support: InstancedSupport,
    multisample_disable_support: bool,
}

impl InstancedRendering {
    /// `None` when the backend has no instanced rendering.
    pub(crate) fn new(caps: &Caps) -> Option<Self> {
        (caps.instanced_support != InstancedSupport::None).then_some(Self {
            support: caps.instanced_support,
            multisample_disable_support: caps.multisample_disable_support,
        })
    }

    /// Pick the antialiasing mode, and whether hardware AA is needed for it.
    fn select_aa_mode(
        &self,
        view: Affine,
        antialias: bool,
        info: &InstancedPipelineInfo,
    ) -> Option<(InstancedAaMode, bool)> {
        if !info.is_multisampled || self.multisample_disable_support {
            if !antialias {
                return Some((InstancedAaMode::None, false));
            }
            if info.can_use_coverage_aa() && math::preserves_right_angles(view) {
                return Some((InstancedAaMode::Coverage, false));
            }
        }
        if info.is_multisampled && self.support >= InstancedSupport::Multisample {
            if !info.is_mixed_sampled || info.color_disabled {
                return Some((InstancedAaMode::Msaa, true));
            }
            if self.support >= InstancedSupport::MixedSampled {
                return Some((InstancedAaMode::MixedSamples, true));
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments, reason = "mirrors the per-shape record calls")]
    fn record_shape(
        &self,
        shape: InstancedShape,
        bounds: Rect,
        view: Affine,
        color: DrawColor,
        antialias: bool,
        info: &InstancedPipelineInfo,
        local: (LocalKind, [f64; 4], [f64; 4]),
    ) -> Option<(Batch, bool)> {
        if info.is_rendering_to_float {
            return None;
        }
        let (aa_mode, use_hw_aa) = self.select_aa_mode(view, antialias, info)?;
        let (local_kind, first, second) = local;
        let shape_bits = match shape {
            InstancedShape::Rect => 0,
            InstancedShape::Oval => 1,
            InstancedShape::RRect => 2,
            InstancedShape::DRRect => 3,
        };
        let mut params = [0.0; 8];
        params[..4].copy_from_slice(&f32s(first));
        params[4..].copy_from_slice(&f32s(second));
        let record = InstanceRecord {
            info: shape_bits | (aa_mode.bits() << 8) | ((local_kind as u32) << 16),
            color: color.0,
            view: f32s(view.as_coeffs()),
            bounds: f32s([bounds.x0, bounds.y0, bounds.x1, bounds.y1]),
            params,
        };
        let mut device_bounds = math::map_rect(view, &bounds);
        if aa_mode == InstancedAaMode::Coverage {
            device_bounds = device_bounds.inflate(0.5, 0.5);
        }
        Some((
            Batch::new(BatchKind::Instanced { shape, record }, color, device_bounds),
            use_hw_aa,
        ))
    }

    /// Record a rect with the given local coordinates.
    pub(crate) fn record_rect(
        &self,
        rect: Rect,
        view: Affine,
        color: DrawColor,
        local: LocalCoords,
        antialias: bool,
        info: &InstancedPipelineInfo,
    ) -> Option<(Batch, bool)> {
        let local = match local {
            LocalCoords::None => (LocalKind::None, [0.0; 4], [0.0; 4]),
            LocalCoords::Rect(r) => (LocalKind::Rect, [r.x0, r.y0, r.x1, r.y1], [0.0; 4]),
            LocalCoords::Matrix(m) => {
                let [a, b, c, d, e, f] = m.as_coeffs();
                (LocalKind::Matrix, [a, b, c, d], [e, f, 0.0, 0.0])
            }
        };
        self.record_shape(InstancedShape::Rect, rect, view, color, antialias, info, local)
    }

    /// Record a filled oval.
    pub(crate) fn record_oval(
        &self,
        oval: Rect,
        view: Affine,
        color: DrawColor,
        antialias: bool,
        info: &InstancedPipelineInfo,
    ) -> Option<(Batch, bool)> {
        let local = (LocalKind::None, [0.0; 4], [0.0; 4]);
        self.record_shape(InstancedShape::Oval, oval, view, color, antialias, info, local)
    }

    /// Record a filled rounded rect. Coverage AA needs equal corner radii.
    pub(crate) fn record_rrect(
        &self,
        rrect: RoundedRect,
        view: Affine,
        color: DrawColor,
        antialias: bool,
        info: &InstancedPipelineInfo,
    ) -> Option<(Batch, bool)> {
        if !is_simple(&rrect) {
            let (aa_mode, _) = self.select_aa_mode(view, antialias, info)?;
            if aa_mode == InstancedAaMode::Coverage {
                return None;
            }
        }
        let local = (LocalKind::None, rrect_radii(&rrect), [0.0; 4]);
        self.record_shape(
            InstancedShape::RRect,
            rrect.rect(),
            view,
            color,
            antialias,
            info,
            local,
        )
    }

    /// Record the area between two rounded rects. The inner one must have
    /// equal corner radii.
    pub(crate) fn record_drrect(
        &self,
        outer: RoundedRect,
        inner: RoundedRect,
        view: Affine,
        color: DrawColor,
        antialias: bool,
        info: &InstancedPipelineInfo,
    ) -> Option<(Batch, bool)> {
        if !is_simple(&inner) {
            return None;
        }
        let inner_rect = inner.rect();
        let radius = inner.radii().top_left;
        let [tl, tr, br, bl] = rrect_radii(&outer);
        let local = (
            LocalKind::None,
            [tl, tr, br, bl],
            [inner_rect.x0, inner_rect.y0, inner_rect.x1, radius],
        );
        self.record_shape(
            InstancedShape::DRRect,
            outer.rect(),
            view,
            color,
            antialias,
            info,
            local,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(support: InstancedSupport) -> InstancedRendering {
        InstancedRendering::new(&Caps {
            instanced_support: support,
            ..Caps::default()
        })
        .unwrap()
    }

    #[test]
    fn no_support_means_no_renderer() {
        assert!(InstancedRendering::new(&Caps::default()).is_none());
    }

    #[test]
    fn coverage_aa_needs_right_angles() {
        let ir = renderer(InstancedSupport::Basic);
        let info = InstancedPipelineInfo::default();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (batch, hw) = ir
            .record_rect(rect, Affine::rotate(0.3), DrawColor(1), LocalCoords::None, true, &info)
            .unwrap();
        assert!(!hw);
        assert!(matches!(batch.kind(), BatchKind::Instanced { shape: InstancedShape::Rect, .. }));
        let skewed = Affine::skew(0.5, 0.0);
        assert!(ir
            .record_rect(rect, skewed, DrawColor(1), LocalCoords::None, true, &info)
            .is_none());
    }

    #[test]
    fn multisampled_targets_use_hw_aa() {
        let ir = renderer(InstancedSupport::Multisample);
        let info = InstancedPipelineInfo {
            is_multisampled: true,
            ..Default::default()
        };
        let oval = Rect::new(0.0, 0.0, 4.0, 4.0);
        let (_, hw) = ir
            .record_oval(oval, Affine::IDENTITY, DrawColor(1), true, &info)
            .unwrap();
        assert!(hw);

        let basic = renderer(InstancedSupport::Basic);
        assert!(basic
            .record_oval(oval, Affine::IDENTITY, DrawColor(1), true, &info)
            .is_none());
    }

    #[test]
    fn complex_rrects_are_declined_for_coverage() {
        let ir = renderer(InstancedSupport::Basic);
        let info = InstancedPipelineInfo::default();
        let complex = RoundedRect::new(0.0, 0.0, 20.0, 20.0, (1.0, 2.0, 3.0, 4.0));
        assert!(ir.record_rrect(complex, Affine::IDENTITY, DrawColor(1), true, &info).is_none());
        let simple = RoundedRect::new(0.0, 0.0, 20.0, 20.0, 3.0);
        assert!(ir.record_rrect(simple, Affine::IDENTITY, DrawColor(1), true, &info).is_some());
    }
}
