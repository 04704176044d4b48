// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets and the resource cache that shares them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{Caps, PixelConfig};
use crate::kurbo::Rect;
use crate::math::IRect;
use crate::{Error, Result};

/// Identifies a render target for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(u64);

impl RenderTargetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Describes a render target to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargetDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Color samples per pixel; `0` or `1` is not multisampled.
    pub sample_count: u32,
    /// Stencil samples per pixel. At least `sample_count`.
    pub stencil_sample_count: u32,
    /// Pixel format.
    pub config: PixelConfig,
}

impl RenderTargetDesc {
    /// A single sampled target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sample_count: 0,
            stencil_sample_count: 0,
            config: PixelConfig::default(),
        }
    }

    /// Use `count` samples for both color and stencil.
    #[must_use]
    pub fn with_samples(mut self, count: u32) -> Self {
        self.sample_count = count;
        self.stencil_sample_count = count;
        self
    }

    /// Use `count` stencil samples, keeping the color sample count.
    #[must_use]
    pub fn with_stencil_samples(mut self, count: u32) -> Self {
        self.stencil_sample_count = count;
        self
    }
}

/// A GPU surface batches are drawn into. Dimensions never change.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderTarget {
    id: RenderTargetId,
    width: u32,
    height: u32,
    sample_count: u32,
    stencil_sample_count: u32,
    config: PixelConfig,
}

impl RenderTarget {
    /// Validate `desc` against `caps` and create the target.
    pub(crate) fn new(desc: RenderTargetDesc, caps: &Caps) -> Result<Self> {
        let max = caps.max_render_target_size;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(Error::UnsupportedRenderTarget {
                reason: "size",
                width: desc.width,
                height: desc.height,
            });
        }
        if desc.sample_count.max(desc.stencil_sample_count) > caps.max_sample_count.max(1) {
            return Err(Error::UnsupportedRenderTarget {
                reason: "sample count",
                width: desc.width,
                height: desc.height,
            });
        }
        if !caps.is_config_renderable(desc.config) {
            return Err(Error::UnsupportedRenderTarget {
                reason: "pixel config",
                width: desc.width,
                height: desc.height,
            });
        }
        Ok(Self {
            id: RenderTargetId::next(),
            width: desc.width,
            height: desc.height,
            sample_count: desc.sample_count,
            stencil_sample_count: desc.stencil_sample_count.max(desc.sample_count),
            config: desc.config,
        })
    }

    /// The id.
    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    pub fn config(&self) -> PixelConfig {
        self.config
    }

    /// The whole target.
    pub fn bounds(&self) -> IRect {
        IRect::from_size(self.width, self.height)
    }

    /// The whole target, as a rect.
    pub fn bounds_rect(&self) -> Rect {
        self.bounds().to_rect()
    }

    /// Color and stencil are both multisampled with the same count.
    pub fn is_unified_multisampled(&self) -> bool {
        self.sample_count > 1 && self.sample_count == self.stencil_sample_count
    }

    /// The stencil buffer is multisampled.
    pub fn is_stencil_buffer_multisampled(&self) -> bool {
        self.stencil_sample_count > 1
    }

    /// The stencil has more samples than color.
    pub fn is_mixed_sampled(&self) -> bool {
        self.is_stencil_buffer_multisampled() && self.stencil_sample_count > self.sample_count
    }
}

/// Holds the backend's references to render targets.
#[derive(Debug, Default)]
pub(crate) struct ResourceProvider {
    render_targets: Vec<Arc<RenderTarget>>,
}

impl ResourceProvider {
    pub(crate) fn create_render_target(
        &mut self,
        desc: RenderTargetDesc,
        caps: &Caps,
    ) -> Result<Arc<RenderTarget>> {
        let target = Arc::new(RenderTarget::new(desc, caps)?);
        self.render_targets.push(target.clone());
        Ok(target)
    }

    /// Drop the targets nobody else holds.
    pub(crate) fn purge_unreferenced(&mut self) -> usize {
        let before = self.render_targets.len();
        self.render_targets.retain(|rt| Arc::strong_count(rt) > 1);
        before - self.render_targets.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.render_targets.len()
    }

    pub(crate) fn clear(&mut self) {
        self.render_targets.clear();
    }
}
