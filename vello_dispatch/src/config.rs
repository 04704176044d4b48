// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend capabilities and context options.

use crate::path_renderer::PathRendererKind;

/// Pixel formats a render target can have.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelConfig {
    /// 8 bit RGBA.
    #[default]
    Rgba8,
    /// 8 bit BGRA.
    Bgra8,
    /// 8 bit sRGB encoded RGBA.
    Srgba8,
    /// 16 bit float RGBA.
    RgbaF16,
    /// 8 bit alpha only.
    Alpha8,
}

/// Level of instanced rendering the backend offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstancedSupport {
    /// No instanced rendering.
    #[default]
    None,
    /// Instanced draws with coverage antialiasing.
    Basic,
    /// Instanced draws into multisampled targets.
    Multisample,
    /// Instanced draws into targets with more stencil than color samples.
    MixedSampled,
}

/// What the backend can do.
///
/// These are queried by dispatch decisions; they are never changed after the
/// [`Context`](crate::Context) is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caps {
    /// Clearing the whole target costs nothing, so partial clears may be widened.
    pub full_clear_is_free: bool,
    /// Clears are unreliable and must be drawn as rects instead.
    pub use_draw_instead_of_clear: bool,
    /// Largest texture dimension.
    pub max_texture_size: u32,
    /// Largest render target dimension.
    pub max_render_target_size: u32,
    /// Largest tile used when drawing big images.
    pub max_tile_size: u32,
    /// Largest multisample count.
    pub max_sample_count: u32,
    /// Stencil-then-cover path rendering.
    pub path_rendering_support: bool,
    /// Fragment shader derivatives.
    pub shader_derivative_support: bool,
    /// Instanced rendering.
    pub instanced_support: InstancedSupport,
    /// Multisampling can be switched off per draw.
    pub multisample_disable_support: bool,
    /// Configs that can be rendered to.
    pub renderable_configs: Vec<PixelConfig>,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            full_clear_is_free: false,
            use_draw_instead_of_clear: false,
            max_texture_size: 8192,
            max_render_target_size: 8192,
            max_tile_size: 8192,
            max_sample_count: 4,
            path_rendering_support: false,
            shader_derivative_support: true,
            instanced_support: InstancedSupport::None,
            multisample_disable_support: false,
            renderable_configs: vec![
                PixelConfig::Rgba8,
                PixelConfig::Bgra8,
                PixelConfig::Srgba8,
                PixelConfig::RgbaF16,
                PixelConfig::Alpha8,
            ],
        }
    }
}

impl Caps {
    /// Whether `config` can be rendered to.
    pub fn is_config_renderable(&self, config: PixelConfig) -> bool {
        self.renderable_configs.contains(&config)
    }
}

/// The optional members of the path renderer chain.
///
/// This can be created from a set of [`PathRendererKind`] using
/// [`Iterator::collect`], as `GpuPathRenderers` implements `FromIterator`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GpuPathRenderers {
    /// Straight dashed lines.
    pub dash_line: bool,
    /// Stencil-then-cover, when the backend supports it.
    pub stencil_and_cover: bool,
    /// CPU triangulation of non-antialiased fills.
    pub tessellating: bool,
    /// Antialiased hairlines.
    pub aa_hairline: bool,
    /// Antialiased convex fills.
    pub aa_convex: bool,
    /// Antialiased convex fills and strokes by linearizing.
    pub aa_linearizing: bool,
    /// The stencil based default renderer.
    pub default: bool,
}

impl GpuPathRenderers {
    /// Every GPU path renderer.
    pub fn all() -> Self {
        Self {
            dash_line: true,
            stencil_and_cover: true,
            tessellating: true,
            aa_hairline: true,
            aa_convex: true,
            aa_linearizing: true,
            default: true,
        }
    }

    /// No GPU path renderer: everything goes to software.
    pub fn none() -> Self {
        Self {
            dash_line: false,
            stencil_and_cover: false,
            tessellating: false,
            aa_hairline: false,
            aa_convex: false,
            aa_linearizing: false,
            default: false,
        }
    }

    /// Whether the given renderer is enabled. Software is always enabled.
    pub fn contains(&self, kind: PathRendererKind) -> bool {
        match kind {
            PathRendererKind::DashLine => self.dash_line,
            PathRendererKind::StencilAndCover => self.stencil_and_cover,
            PathRendererKind::Tessellating => self.tessellating,
            PathRendererKind::AaHairline => self.aa_hairline,
            PathRendererKind::AaConvex => self.aa_convex,
            PathRendererKind::AaLinearizing => self.aa_linearizing,
            PathRendererKind::Default => self.default,
            PathRendererKind::Software => true,
        }
    }
}

impl Default for GpuPathRenderers {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<PathRendererKind> for GpuPathRenderers {
    fn from_iter<T: IntoIterator<Item = PathRendererKind>>(iter: T) -> Self {
        let mut result = Self::none();
        for kind in iter {
            match kind {
                PathRendererKind::DashLine => result.dash_line = true,
                PathRendererKind::StencilAndCover => result.stencil_and_cover = true,
                PathRendererKind::Tessellating => result.tessellating = true,
                PathRendererKind::AaHairline => result.aa_hairline = true,
                PathRendererKind::AaConvex => result.aa_convex = true,
                PathRendererKind::AaLinearizing => result.aa_linearizing = true,
                PathRendererKind::Default => result.default = true,
                PathRendererKind::Software => {}
            }
        }
        result
    }
}

/// Options which are set at context creation time, used in
/// [`Context::new`](crate::Context::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextOptions {
    /// Which GPU path renderers take part in the chain.
    pub gpu_path_renderers: GpuPathRenderers,
    /// Let the software renderer keep rasterized masks of non-volatile paths.
    pub allow_path_mask_caching: bool,
    /// Use the instanced renderer when the backend supports it.
    pub enable_instanced_rendering: bool,
    /// Flush once this many batches are pending. `0` disables implicit flushes.
    pub max_pending_batches: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            gpu_path_renderers: GpuPathRenderers::all(),
            allow_path_mask_caching: false,
            enable_instanced_rendering: false,
            max_pending_batches: 0,
        }
    }
}

/// Subpixel layout of the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelGeometry {
    /// Unknown or not applicable.
    #[default]
    Unknown,
    /// Horizontal RGB stripes.
    RgbH,
    /// Horizontal BGR stripes.
    BgrH,
    /// Vertical RGB stripes.
    RgbV,
    /// Vertical BGR stripes.
    BgrV,
}

/// Properties of the surface a draw context draws into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceProps {
    /// Subpixel layout.
    pub pixel_geometry: PixelGeometry,
    /// Blend in linear space.
    pub gamma_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_set_from_iterator() {
        let set: GpuPathRenderers = [PathRendererKind::AaConvex, PathRendererKind::Default]
            .into_iter()
            .collect();
        assert!(set.aa_convex);
        assert!(set.default);
        assert!(!set.tessellating);
        assert!(set.contains(PathRendererKind::Software));
    }
}
