// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path renderers and the prioritized chain they are selected from.

mod aa_convex;
mod aa_hairline;
mod aa_linearizing;
mod dash_line;
mod default;
mod software;
mod stencil_and_cover;
mod tessellating;

use std::fmt;
use std::rc::Rc;

use crate::batch::{Batch, BatchKind, OutlineStyle, PathGeometry};
use crate::clip::Clip;
use crate::config::{Caps, ContextOptions};
use crate::draw_context::DrawContext;
use crate::kurbo::{Affine, PathEl};
use crate::math;
use crate::paint::{Paint, TransferMode};
use crate::pipeline::{PipelineState, UserStencilSettings};
use crate::shape::Shape;
use crate::style::{Style, StyleKind};

pub(crate) use software::SoftwarePathRenderer;

/// Identifies a path renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathRendererKind {
    /// Straight dashed lines.
    DashLine,
    /// Stencil-then-cover using the backend's path rendering.
    StencilAndCover,
    /// CPU triangulation of non-antialiased fills.
    Tessellating,
    /// Antialiased hairlines.
    AaHairline,
    /// Antialiased convex fills.
    AaConvex,
    /// Antialiased convex fills and strokes.
    AaLinearizing,
    /// Stencil based, non-antialiased.
    Default,
    /// CPU rasterization into a mask texture.
    Software,
}

/// What the caller wants to produce with the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawType {
    /// Color, aliased.
    Color,
    /// Color, coverage antialiased.
    ColorAntiAlias,
    /// Only stencil values.
    StencilOnly,
    /// Stencil values and then color, aliased.
    StencilAndColor,
    /// Stencil values and then color, antialiased.
    StencilAndColorAntiAlias,
}

impl DrawType {
    /// The least stencil support a renderer needs for this draw type.
    pub fn min_stencil_support(self) -> StencilSupport {
        match self {
            Self::Color | Self::ColorAntiAlias => StencilSupport::NoSupport,
            Self::StencilOnly => StencilSupport::StencilOnly,
            Self::StencilAndColor | Self::StencilAndColorAntiAlias => {
                StencilSupport::NoRestriction
            }
        }
    }
}

/// How well a renderer can write a shape into the stencil buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StencilSupport {
    /// Not at all.
    NoSupport,
    /// Only as a separate stencil pass.
    StencilOnly,
    /// In the same pass as color, with any stencil settings.
    NoRestriction,
}

/// The inputs of [`PathRenderer::can_draw_path`].
#[derive(Clone, Copy, Debug)]
pub struct CanDrawPathArgs<'a> {
    /// Backend capabilities.
    pub caps: &'a Caps,
    /// View transform.
    pub view: Affine,
    /// The shape to draw.
    pub shape: &'a Shape,
    /// Whether coverage antialiasing is requested.
    pub anti_alias: bool,
    /// Whether the caller supplies stencil settings.
    pub has_user_stencil_settings: bool,
    /// Whether the target's stencil buffer is multisampled.
    pub is_stencil_buffer_msaa: bool,
}

/// The inputs of [`PathRenderer::draw_path`].
#[derive(Debug)]
pub struct DrawPathArgs<'a> {
    /// The context batches go to.
    pub draw_context: &'a mut DrawContext,
    /// The paint.
    pub paint: &'a Paint,
    /// Caller supplied stencil settings.
    pub user_stencil: Option<UserStencilSettings>,
    /// The clip.
    pub clip: &'a Clip,
    /// View transform.
    pub view: Affine,
    /// The shape to draw.
    pub shape: &'a Shape,
    /// Whether coverage antialiasing is requested.
    pub anti_alias: bool,
    /// Whether blending happens in linear space.
    pub gamma_correct: bool,
}

/// The inputs of [`PathRenderer::stencil_path`].
#[derive(Debug)]
pub struct StencilPathArgs<'a> {
    /// The context batches go to.
    pub draw_context: &'a mut DrawContext,
    /// The clip.
    pub clip: &'a Clip,
    /// View transform.
    pub view: Affine,
    /// The shape to stencil.
    pub shape: &'a Shape,
    /// Whether the stencil is multisampled.
    pub is_aa: bool,
}

/// Turns shapes into batches.
pub trait PathRenderer: fmt::Debug {
    /// Which renderer this is.
    fn kind(&self) -> PathRendererKind;

    /// Whether the renderer can draw the shape as requested.
    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool;

    /// Emit batches for the shape. Only called after `can_draw_path` accepted it.
    fn draw_path(&self, args: DrawPathArgs<'_>);

    /// How well the renderer can stencil the shape.
    fn stencil_support(&self, _shape: &Shape) -> StencilSupport {
        StencilSupport::NoSupport
    }

    /// Write the shape into the stencil buffer only.
    ///
    /// Renderers without a dedicated stencil pass draw the shape with color
    /// writes disabled.
    fn stencil_path(&self, args: StencilPathArgs<'_>) {
        let paint = Paint::default()
            .with_anti_alias(args.is_aa)
            .with_transfer(TransferMode::DisableColor);
        self.draw_path(DrawPathArgs {
            draw_context: args.draw_context,
            paint: &paint,
            user_stencil: Some(UserStencilSettings::replace(0xffff)),
            clip: args.clip,
            view: args.view,
            shape: args.shape,
            anti_alias: false,
            gamma_correct: false,
        });
    }
}

/// The GPU path renderers, in priority order.
#[derive(Debug)]
pub(crate) struct PathRendererChain {
    renderers: Vec<Rc<dyn PathRenderer>>,
}

impl PathRendererChain {
    pub(crate) fn new(caps: &Caps, options: &ContextOptions) -> Self {
        let enabled = options.gpu_path_renderers;
        let mut renderers: Vec<Rc<dyn PathRenderer>> = Vec::new();
        if enabled.dash_line {
            renderers.push(Rc::new(dash_line::DashLinePathRenderer));
        }
        if enabled.stencil_and_cover && caps.path_rendering_support {
            renderers.push(Rc::new(stencil_and_cover::StencilAndCoverPathRenderer));
        }
        if enabled.tessellating {
            renderers.push(Rc::new(tessellating::TessellatingPathRenderer));
        }
        if enabled.aa_hairline {
            renderers.push(Rc::new(aa_hairline::AaHairlinePathRenderer));
        }
        if enabled.aa_convex {
            renderers.push(Rc::new(aa_convex::AaConvexPathRenderer));
        }
        if enabled.aa_linearizing {
            renderers.push(Rc::new(aa_linearizing::AaLinearizingPathRenderer));
        }
        if enabled.default {
            renderers.push(Rc::new(default::DefaultPathRenderer));
        }
        log::debug!(
            "Path renderer chain: {:?}",
            renderers.iter().map(|r| r.kind()).collect::<Vec<_>>()
        );
        Self { renderers }
    }

    /// The first renderer that accepts the shape and stencils well enough for
    /// `draw_type`.
    pub(crate) fn get_path_renderer(
        &self,
        args: &CanDrawPathArgs<'_>,
        draw_type: DrawType,
    ) -> Option<(Rc<dyn PathRenderer>, StencilSupport)> {
        let min_support = draw_type.min_stencil_support();
        for renderer in &self.renderers {
            if !renderer.can_draw_path(args) {
                continue;
            }
            let support = renderer.stencil_support(args.shape);
            if support < min_support {
                continue;
            }
            return Some((renderer.clone(), support));
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn kinds(&self) -> Vec<PathRendererKind> {
        self.renderers.iter().map(|r| r.kind()).collect()
    }
}

/// Whether the style is a hairline, or a stroke so thin on the device that it
/// can be drawn like one.
pub(crate) fn is_stroke_hair_or_equivalent(style: &Style, view: Affine) -> bool {
    if style.has_path_effect() {
        return false;
    }
    match style.kind() {
        StyleKind::Hairline => true,
        StyleKind::Stroke => {
            // Device space lengths of the stroke width along both local axes.
            let width = style.width();
            let [a, b, c, d, _, _] = view.as_coeffs();
            width * a.hypot(b) <= 1.0 && width * c.hypot(d) <= 1.0
        }
        StyleKind::Fill | StyleKind::StrokeAndFill => false,
    }
}

/// Whether the shape's outline is made of straight lines only.
pub(crate) fn has_only_lines(shape: &Shape) -> bool {
    shape.as_path().elements().iter().all(|el| {
        matches!(
            el,
            PathEl::MoveTo(_) | PathEl::LineTo(_) | PathEl::ClosePath
        )
    })
}

/// A path batch for the shape, bounded by its styled device bounds, or by the
/// whole target for inverse fills.
pub(crate) fn path_batch(
    renderer: PathRendererKind,
    args: &DrawPathArgs<'_>,
    outline: OutlineStyle,
) -> Batch {
    let shape = args.shape;
    let bounds = if shape.inverse_filled() {
        args.draw_context.bounds_rect()
    } else {
        let device = math::map_rect(args.view, &shape.styled_bounds());
        match outline {
            OutlineStyle::Hairline => device.inflate(0.5, 0.5),
            _ if args.anti_alias => device.inflate(0.5, 0.5),
            _ => device,
        }
    };
    let path = shape.as_path();
    Batch::new(
        BatchKind::Path {
            renderer,
            view: args.view,
            geometry: PathGeometry {
                path: path.bez_path().clone(),
                fill: path.fill_rule(),
                inverse: path.is_inverse_fill(),
                outline,
            },
        },
        args.paint.color(),
        bounds,
    )
}

/// The pipeline a path renderer draws its batches with.
pub(crate) fn pipeline_for(args: &DrawPathArgs<'_>, use_hw_aa: bool) -> PipelineState {
    PipelineState::new(args.paint, use_hw_aa)
        .with_user_stencil(args.user_stencil)
        .with_gamma_correct(args.gamma_correct)
}

/// Submit one batch, multisampled when the target requires it.
pub(crate) fn submit(args: DrawPathArgs<'_>, batch: Batch) {
    let use_hw_aa = args.draw_context.must_use_hw_aa(args.paint);
    let pipeline = pipeline_for(&args, use_hw_aa);
    args.draw_context.record_batch(&pipeline, args.clip, batch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GpuPathRenderers;
    use crate::kurbo::{Rect, Stroke};
    use crate::path::Path;

    fn chain(caps: &Caps) -> PathRendererChain {
        PathRendererChain::new(caps, &ContextOptions::default())
    }

    fn args<'a>(caps: &'a Caps, shape: &'a Shape, anti_alias: bool) -> CanDrawPathArgs<'a> {
        CanDrawPathArgs {
            caps,
            view: Affine::IDENTITY,
            shape,
            anti_alias,
            has_user_stencil_settings: false,
            is_stencil_buffer_msaa: false,
        }
    }

    fn concave() -> Path {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 5.0));
        path.line_to((0.0, 10.0));
        path.line_to((4.0, 5.0));
        path.close_path();
        path
    }

    #[test]
    fn chain_order_follows_priority() {
        let caps = Caps {
            path_rendering_support: true,
            ..Caps::default()
        };
        assert_eq!(
            chain(&caps).kinds(),
            [
                PathRendererKind::DashLine,
                PathRendererKind::StencilAndCover,
                PathRendererKind::Tessellating,
                PathRendererKind::AaHairline,
                PathRendererKind::AaConvex,
                PathRendererKind::AaLinearizing,
                PathRendererKind::Default,
            ]
        );
        assert!(!chain(&Caps::default()).kinds().contains(&PathRendererKind::StencilAndCover));
    }

    #[test]
    fn disabled_renderers_are_skipped() {
        let options = ContextOptions {
            gpu_path_renderers: [PathRendererKind::Default]
                .into_iter()
                .collect::<GpuPathRenderers>(),
            ..ContextOptions::default()
        };
        let chain = PathRendererChain::new(&Caps::default(), &options);
        assert_eq!(chain.kinds(), [PathRendererKind::Default]);
    }

    #[test]
    fn selection_by_shape() {
        let caps = Caps::default();
        let chain = chain(&caps);

        let convex = Shape::from_oval(Rect::new(0.0, 0.0, 10.0, 10.0), Style::fill());
        let (pr, _) = chain
            .get_path_renderer(&args(&caps, &convex, true), DrawType::ColorAntiAlias)
            .unwrap();
        assert_eq!(pr.kind(), PathRendererKind::AaConvex);

        let mut volatile = concave();
        volatile.set_volatile(true);
        let shape = Shape::from_path(volatile, Style::fill());
        let (pr, _) = chain
            .get_path_renderer(&args(&caps, &shape, false), DrawType::Color)
            .unwrap();
        assert_eq!(pr.kind(), PathRendererKind::Default);

        let shape = Shape::from_path(concave(), Style::fill());
        let (pr, _) = chain
            .get_path_renderer(&args(&caps, &shape, false), DrawType::Color)
            .unwrap();
        assert_eq!(pr.kind(), PathRendererKind::Tessellating);

        // Nothing on the GPU draws antialiased concave fills.
        assert!(chain
            .get_path_renderer(&args(&caps, &shape, true), DrawType::ColorAntiAlias)
            .is_none());

        let hairline = Shape::from_path(concave(), Style::hairline());
        let (pr, _) = chain
            .get_path_renderer(&args(&caps, &hairline, true), DrawType::ColorAntiAlias)
            .unwrap();
        assert_eq!(pr.kind(), PathRendererKind::AaHairline);
    }

    #[test]
    fn stencil_draw_types_need_stencil_support() {
        let caps = Caps::default();
        let chain = chain(&caps);
        let shape = Shape::from_path(concave(), Style::fill());
        let (pr, support) = chain
            .get_path_renderer(&args(&caps, &shape, false), DrawType::StencilOnly)
            .unwrap();
        assert_eq!(pr.kind(), PathRendererKind::Default);
        assert_eq!(support, StencilSupport::StencilOnly);
        assert!(chain
            .get_path_renderer(&args(&caps, &shape, false), DrawType::StencilAndColor)
            .is_none());
    }

    #[test]
    fn thin_strokes_are_hairlines() {
        let thin = Style::stroke(Stroke::new(0.5));
        assert!(is_stroke_hair_or_equivalent(&thin, Affine::IDENTITY));
        assert!(!is_stroke_hair_or_equivalent(&thin, Affine::scale(4.0)));
    }
}
