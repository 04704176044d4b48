// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The draw context: turns draw calls into batches for one render target.
//!
//! Every public entry point follows the same shape. It checks ownership and
//! whether the context was abandoned, picks the cheapest way to draw the
//! request (a clear, a rect batch, an instanced shape, an analytic oval or a
//! path renderer), records the resulting batches into the render target's
//! current draw target, and gives the drawing manager a chance to flush.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::batch::{Batch, BatchKind, DrawColor, LocalCoords, PrimitiveType};
use crate::clip::Clip;
use crate::config::{Caps, SurfaceProps};
use crate::draw_target::{DrawTarget, DrawTargetId};
use crate::instanced::{InstancedPipelineInfo, InstancedRendering};
use crate::kurbo::{Affine, Join, Point, Rect, RoundedRect};
use crate::manager::DrawingManager;
use crate::math::{self, IRect};
use crate::paint::{EdgeType, Effect, Paint, RRectEffect, RegionOp, TransferMode};
use crate::path::Path;
use crate::path_renderer::{DrawPathArgs, DrawType, PathRenderer};
use crate::peniko::{Color, Compose, Fill};
use crate::pipeline::{PipelineState, UserStencilSettings};
use crate::render_target::RenderTarget;
use crate::shape::{ApplyStyle, Shape};
use crate::single_owner::SingleOwner;
use crate::style::{Style, StyleKind};
use crate::{oval_renderer, path_renderer, rect_batch, Error, Result};

/// Caller supplied vertex data for [`DrawContext::draw_vertices`].
#[derive(Clone, Copy, Debug)]
pub struct Vertices<'a> {
    /// Topology.
    pub primitive: PrimitiveType,
    /// Local positions.
    pub positions: &'a [Point],
    /// Texture coordinates, one per position.
    pub tex_coords: Option<&'a [Point]>,
    /// Colors, one per position.
    pub colors: Option<&'a [Color]>,
    /// Indices into the positions.
    pub indices: Option<&'a [u16]>,
}

impl<'a> Vertices<'a> {
    /// Positions only.
    pub fn new(primitive: PrimitiveType, positions: &'a [Point]) -> Self {
        Self {
            primitive,
            positions,
            tex_coords: None,
            colors: None,
            indices: None,
        }
    }

    /// Add texture coordinates.
    #[must_use]
    pub fn with_tex_coords(mut self, tex_coords: &'a [Point]) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    /// Add per vertex colors.
    #[must_use]
    pub fn with_colors(mut self, colors: &'a [Color]) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Add indices.
    #[must_use]
    pub fn with_indices(mut self, indices: &'a [u16]) -> Self {
        self.indices = Some(indices);
        self
    }

    fn check(&self) -> Result<Rect> {
        let count = self.positions.len();
        let per_vertex_ok = self.tex_coords.is_none_or(|t| t.len() == count)
            && self.colors.is_none_or(|c| c.len() == count);
        let indices_ok = self
            .indices
            .is_none_or(|indices| indices.iter().all(|i| usize::from(*i) < count));
        if !per_vertex_ok || !indices_ok {
            return Err(Error::EmptyGeometry);
        }
        bounds_of(self.positions.iter().copied())
    }
}

/// The bounding box of finite points, or an error when there are none or
/// some aren't finite.
fn bounds_of(mut points: impl Iterator<Item = Point>) -> Result<Rect> {
    let first = points.next().ok_or(Error::EmptyGeometry)?;
    let mut bounds = Rect::from_points(first, first);
    let mut finite = first.is_finite();
    for p in points {
        finite &= p.is_finite();
        bounds = bounds.union_pt(p);
    }
    if finite {
        Ok(bounds)
    } else {
        Err(Error::EmptyGeometry)
    }
}

fn invert(view: Affine) -> Result<Affine> {
    math::invert(view).ok_or(Error::NonInvertibleTransform)
}

fn volatile_path(build: impl FnOnce(&mut Path)) -> Path {
    let mut path = Path::new();
    path.set_volatile(true);
    build(&mut path);
    path
}

/// Crop a filled rect to the clip's conservative bounds, in local space.
///
/// When a local rect rides along it's cropped proportionally. Transforms that
/// don't keep rects rects leave the rect alone. Returns `false` when nothing
/// needs drawing.
fn crop_filled_rect(
    width: u32,
    height: u32,
    clip: &Clip,
    view: Affine,
    rect: &mut Rect,
    local: Option<&mut Rect>,
) -> bool {
    if !math::rect_stays_rect(view) {
        return true;
    }
    let Some(inverse) = math::invert(view) else {
        return false;
    };
    let clip_bounds = math::map_rect(
        inverse,
        &clip.conservative_bounds(width, height).to_rect(),
    );

    let Some(local) = local else {
        return match math::intersect_rect(rect, &clip_bounds) {
            Some(cropped) => {
                *rect = cropped;
                true
            }
            None => false,
        };
    };

    if !math::rects_overlap(rect, &clip_bounds) {
        return false;
    }
    let dx = local.width() / rect.width();
    let dy = local.height() / rect.height();
    if clip_bounds.x0 > rect.x0 {
        local.x0 += (clip_bounds.x0 - rect.x0) * dx;
        rect.x0 = clip_bounds.x0;
    }
    if clip_bounds.y0 > rect.y0 {
        local.y0 += (clip_bounds.y0 - rect.y0) * dy;
        rect.y0 = clip_bounds.y0;
    }
    if clip_bounds.x1 < rect.x1 {
        local.x1 -= (rect.x1 - clip_bounds.x1) * dx;
        rect.x1 = clip_bounds.x1;
    }
    if clip_bounds.y1 < rect.y1 {
        local.y1 -= (rect.y1 - clip_bounds.y1) * dy;
        rect.y1 = clip_bounds.y1;
    }
    true
}

/// Records draws into one render target.
///
/// A draw context is bound to the thread that created its
/// [`Context`](crate::Context). Draws are silently dropped once the context is
/// abandoned.
#[derive(Debug)]
pub struct DrawContext {
    manager: Rc<RefCell<DrawingManager>>,
    caps: Rc<Caps>,
    render_target: Arc<RenderTarget>,
    /// May be closed or already flushed; reacquired on the next draw.
    draw_target: Option<DrawTargetId>,
    props: SurfaceProps,
    single_owner: SingleOwner,
}

impl DrawContext {
    pub(crate) fn new(
        manager: Rc<RefCell<DrawingManager>>,
        caps: Rc<Caps>,
        render_target: Arc<RenderTarget>,
        draw_target: Option<DrawTargetId>,
        props: SurfaceProps,
    ) -> Self {
        Self {
            manager,
            caps,
            render_target,
            draw_target,
            props,
            single_owner: SingleOwner::new(),
        }
    }

    /// The render target.
    pub fn render_target(&self) -> &Arc<RenderTarget> {
        &self.render_target
    }

    /// Width of the render target in pixels.
    pub fn width(&self) -> u32 {
        self.render_target.width()
    }

    /// Height of the render target in pixels.
    pub fn height(&self) -> u32 {
        self.render_target.height()
    }

    /// The whole render target.
    pub fn bounds_rect(&self) -> Rect {
        self.render_target.bounds_rect()
    }

    /// The surface properties.
    pub fn surface_props(&self) -> SurfaceProps {
        self.props
    }

    /// Whether blending happens in linear space.
    pub fn is_gamma_correct(&self) -> bool {
        self.props.gamma_correct
    }

    /// Whether color and stencil are multisampled with the same count.
    pub fn is_unified_multisampled(&self) -> bool {
        self.render_target.is_unified_multisampled()
    }

    /// Whether the stencil buffer is multisampled.
    pub fn is_stencil_buffer_multisampled(&self) -> bool {
        self.render_target.is_stencil_buffer_multisampled()
    }

    /// Whether the stencil has more samples than color.
    pub fn has_mixed_samples(&self) -> bool {
        self.render_target.is_mixed_sampled()
    }

    /// Whether an antialiased paint has to use multisampling on this target.
    pub fn must_use_hw_aa(&self, paint: &Paint) -> bool {
        paint.is_anti_alias() && self.render_target.is_unified_multisampled()
    }

    /// Whether `paint` gets coverage antialiasing, and whether multisampling
    /// is used instead.
    fn coverage_aa(&self, paint: &Paint) -> (bool, bool) {
        if !paint.is_anti_alias() {
            return (false, false);
        }
        let unified = self.render_target.is_unified_multisampled();
        (!unified, unified)
    }

    fn pipeline(&self, paint: &Paint, use_hw_aa: bool) -> PipelineState {
        PipelineState::new(paint, use_hw_aa).with_gamma_correct(self.props.gamma_correct)
    }

    /// Ownership check and audit entry. `false` when the call must be ignored.
    fn begin(&self, op: &'static str) -> bool {
        self.single_owner.assert_owner();
        log::trace!("DrawContext::{op}");
        if self.manager.borrow().was_abandoned() {
            log::debug!("Ignoring {op}, the context was abandoned");
            return false;
        }
        true
    }

    /// Let the manager flush if enough work is pending.
    fn check_flush(&self) {
        self.manager.borrow_mut().flush_if_necessary();
    }

    /// Run `f` on the current draw target, starting a new one when the held
    /// one was closed or flushed.
    fn with_draw_target<R>(&mut self, f: impl FnOnce(&mut DrawTarget) -> R) -> Option<R> {
        let shared = Rc::clone(&self.manager);
        let mut manager = shared.borrow_mut();
        let id = match self.draw_target {
            Some(id) if manager.draw_target(id).is_some_and(|dt| !dt.is_closed()) => id,
            _ => {
                let id = manager.new_draw_target(&self.render_target);
                self.draw_target = Some(id);
                id
            }
        };
        manager.draw_target_mut(id).map(f)
    }

    /// Ask the draw target's instanced renderer, if it has one.
    fn record_instanced(
        &mut self,
        record: impl FnOnce(&InstancedRendering, &InstancedPipelineInfo) -> Option<(Batch, bool)>,
    ) -> Option<(Batch, bool)> {
        self.with_draw_target(|dt| dt.instanced().and_then(|(ir, info)| record(ir, info)))
            .flatten()
    }

    /// Record a batch built by dispatch or a path renderer.
    pub(crate) fn record_batch(&mut self, pipeline: &PipelineState, clip: &Clip, batch: Batch) {
        self.with_draw_target(|dt| {
            dt.draw_batch(pipeline, clip, batch);
        });
    }

    /// Clear `rect` to `color`, or the whole target when `rect` is `None`.
    ///
    /// With `can_ignore_rect`, backends where full clears are free clear the
    /// whole target instead.
    pub fn clear(&mut self, rect: Option<IRect>, color: Color, can_ignore_rect: bool) {
        if !self.begin("clear") {
            return;
        }
        self.internal_clear(rect, color, can_ignore_rect);
        self.check_flush();
    }

    fn internal_clear(&mut self, rect: Option<IRect>, color: Color, can_ignore_rect: bool) {
        let rt_rect = self.render_target.bounds();
        let full = match rect {
            None => true,
            Some(_) if can_ignore_rect && self.caps.full_clear_is_free => true,
            Some(rect) => rect.contains(&rt_rect),
        };
        let rect = if full {
            rt_rect
        } else {
            let Some(rect) = rect.and_then(|r| r.intersect(&rt_rect)) else {
                log::debug!("Dropping clear outside of the target");
                return;
            };
            rect
        };

        if self.caps.use_draw_instead_of_clear {
            if full {
                self.with_draw_target(DrawTarget::discard);
            }
            let paint = Paint::new(color)
                .with_anti_alias(false)
                .with_blend_mode(Compose::Copy);
            self.internal_draw_rect(
                &Clip::wide_open(),
                &paint,
                Affine::IDENTITY,
                rect.to_rect(),
                &Style::fill(),
            );
            return;
        }
        self.with_draw_target(|dt| dt.clear(rect, DrawColor::from(color)));
    }

    /// Fill everything inside the clip.
    pub fn draw_paint(&mut self, clip: &Clip, paint: &Paint, view: Affine) {
        if !self.begin("draw_paint") {
            return;
        }
        self.internal_draw_paint(clip, paint, view);
        self.check_flush();
    }

    fn internal_draw_paint(&mut self, clip: &Clip, paint: &Paint, view: Affine) {
        // Covering the whole target needs no antialiasing.
        let paint = paint.with_anti_alias(false);
        match invert(view) {
            Ok(inverse) => {
                let rect = math::map_rect(inverse, &self.bounds_rect());
                self.internal_draw_rect(clip, &paint, view, rect, &Style::fill());
            }
            Err(err) => log::debug!("Dropping draw_paint: {err}"),
        }
    }

    /// Draw a rect with the given style.
    pub fn draw_rect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        style: &Style,
    ) {
        if !self.begin("draw_rect") {
            return;
        }
        self.internal_draw_rect(clip, paint, view, rect, style);
        self.check_flush();
    }

    fn internal_draw_rect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        style: &Style,
    ) {
        let kind = style.kind();
        if style.has_path_effect() || kind == StyleKind::StrokeAndFill {
            self.draw_rect_as_path(clip, paint, view, rect, style);
            return;
        }

        if kind == StyleKind::Fill {
            if !self.caps.use_draw_instead_of_clear {
                let rt_rect = self.bounds_rect();
                if clip.quick_contains(&rt_rect) {
                    let Ok(inverse) = invert(view) else {
                        log::debug!("Dropping rect fill, the view transform isn't invertible");
                        return;
                    };
                    let covers_target = math::map_rect_to_quad(inverse, &rt_rect)
                        .iter()
                        .all(|p| math::rect_contains_point_inclusive(&rect, *p));
                    if covers_target {
                        if let Some(color) = paint.constant_blended_color() {
                            self.internal_clear(None, color, true);
                            return;
                        }
                    }
                }
            }
            if self.draw_filled_rect(clip, paint, view, rect, None) {
                return;
            }
            self.draw_rect_as_path(clip, paint, view, rect, style);
            return;
        }

        if kind == StyleKind::Stroke && (rect.width() == 0.0 || rect.height() == 0.0) {
            // A stroke around a line is a filled rect, shaped by the join.
            let r = style.width() * 0.5;
            let fill = Style::fill();
            let outset = match style.join() {
                // A point with miter joins is a square.
                Join::Miter if rect.width() == 0.0 && rect.height() == 0.0 => {
                    rect.inflate(r, r)
                }
                Join::Round if rect.width() != 0.0 || rect.height() != 0.0 => {
                    let rrect = RoundedRect::from_rect(rect.inflate(r, r), r);
                    self.internal_draw_rrect(clip, paint, view, rrect, &fill);
                    return;
                }
                // Only the axis across the line grows.
                Join::Miter | Join::Round | Join::Bevel => {
                    if rect.width() == 0.0 {
                        rect.inflate(r, 0.0)
                    } else {
                        rect.inflate(0.0, r)
                    }
                }
            };
            self.internal_draw_rect(clip, paint, view, outset, &fill);
            return;
        }

        let color = DrawColor::from(paint.color());
        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        let mut snap = false;
        let batch = if coverage_aa {
            math::rect_stays_rect(view)
                .then(|| rect_batch::aa_stroke(color, view, rect, style))
                .flatten()
        } else {
            // Hairline corners can drop pixels off center, but snapping
            // conflicts with multisampling.
            snap = kind == StyleKind::Hairline && !self.render_target.is_unified_multisampled();
            rect_batch::non_aa_stroke(color, view, rect, style, snap)
        };
        if let Some(batch) = batch {
            let pipeline = self
                .pipeline(paint, use_hw_aa)
                .with_snap_to_pixel_centers(snap);
            self.record_batch(&pipeline, clip, batch);
            return;
        }
        self.draw_rect_as_path(clip, paint, view, rect, style);
    }

    fn draw_rect_as_path(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        style: &Style,
    ) {
        let path = volatile_path(|p| p.add_rect(rect));
        self.internal_draw_path(clip, paint, view, Shape::from_path(path, style.clone()));
    }

    /// Fill a rect without a path renderer.
    ///
    /// Returns `false` only when the paint needs coverage antialiasing and the
    /// transform doesn't preserve right angles, leaving the rect to the
    /// caller. Rects cropped away entirely count as drawn.
    pub(crate) fn draw_filled_rect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        user_stencil: Option<UserStencilSettings>,
    ) -> bool {
        let mut cropped = rect;
        if !crop_filled_rect(self.width(), self.height(), clip, view, &mut cropped, None) {
            log::debug!("Dropping rect fill, it's cropped away by the clip");
            return true;
        }

        let color = DrawColor::from(paint.color());
        let aa = paint.is_anti_alias();
        if let Some((batch, use_hw_aa)) = self.record_instanced(|ir, info| {
            ir.record_rect(cropped, view, color, LocalCoords::None, aa, info)
        }) {
            let pipeline = self.pipeline(paint, use_hw_aa).with_user_stencil(user_stencil);
            self.record_batch(&pipeline, clip, batch);
            return true;
        }

        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        if coverage_aa {
            // Rotation is fine, skew is not.
            if !math::preserves_right_angles(view) {
                return false;
            }
            let batch = rect_batch::fill(color, true, view, cropped, LocalCoords::None);
            let pipeline = self.pipeline(paint, use_hw_aa).with_user_stencil(user_stencil);
            self.record_batch(&pipeline, clip, batch);
            return true;
        }
        self.draw_non_aa_filled_rect(
            clip,
            paint,
            view,
            cropped,
            LocalCoords::None,
            user_stencil,
            use_hw_aa,
        );
        true
    }

    #[allow(clippy::too_many_arguments, reason = "every input ends up in the batch or pipeline")]
    fn draw_non_aa_filled_rect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        local: LocalCoords,
        user_stencil: Option<UserStencilSettings>,
        use_hw_aa: bool,
    ) {
        let batch = rect_batch::fill(DrawColor::from(paint.color()), false, view, rect, local);
        let pipeline = self.pipeline(paint, use_hw_aa).with_user_stencil(user_stencil);
        self.record_batch(&pipeline, clip, batch);
    }

    /// Fill `rect_to_draw`, mapping it onto `local_rect` for local coordinates.
    pub fn fill_rect_to_rect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect_to_draw: Rect,
        local_rect: Rect,
    ) {
        if !self.begin("fill_rect_to_rect") {
            return;
        }
        let (mut rect, mut local) = (rect_to_draw, local_rect);
        if crop_filled_rect(self.width(), self.height(), clip, view, &mut rect, Some(&mut local)) {
            self.fill_rect_with_local_coords(clip, paint, view, rect, LocalCoords::Rect(local));
        } else {
            log::debug!("Dropping rect fill, it's cropped away by the clip");
        }
        self.check_flush();
    }

    /// Fill `rect`, with local coordinates transformed by `local_matrix`.
    pub fn fill_rect_with_local_matrix(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        local_matrix: Affine,
    ) {
        if !self.begin("fill_rect_with_local_matrix") {
            return;
        }
        self.internal_fill_rect_with_local_matrix(clip, paint, view, rect, local_matrix);
        self.check_flush();
    }

    fn internal_fill_rect_with_local_matrix(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        local_matrix: Affine,
    ) {
        let mut cropped = rect;
        if !crop_filled_rect(self.width(), self.height(), clip, view, &mut cropped, None) {
            log::debug!("Dropping rect fill, it's cropped away by the clip");
            return;
        }
        self.fill_rect_with_local_coords(
            clip,
            paint,
            view,
            cropped,
            LocalCoords::Matrix(local_matrix),
        );
    }

    fn fill_rect_with_local_coords(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rect: Rect,
        local: LocalCoords,
    ) {
        let color = DrawColor::from(paint.color());
        let aa = paint.is_anti_alias();
        if let Some((batch, use_hw_aa)) =
            self.record_instanced(|ir, info| ir.record_rect(rect, view, color, local, aa, info))
        {
            let pipeline = self.pipeline(paint, use_hw_aa);
            self.record_batch(&pipeline, clip, batch);
            return;
        }

        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        if coverage_aa && math::preserves_right_angles(view) {
            let batch = rect_batch::fill(color, true, view, rect, local);
            let pipeline = self.pipeline(paint, use_hw_aa);
            self.record_batch(&pipeline, clip, batch);
            return;
        }
        self.draw_non_aa_filled_rect(clip, paint, view, rect, local, None, use_hw_aa);
    }

    /// Draw caller supplied triangles, lines or points.
    pub fn draw_vertices(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        vertices: Vertices<'_>,
    ) {
        if !self.begin("draw_vertices") {
            return;
        }
        match vertices.check() {
            Ok(local_bounds) => {
                let mut bounds = math::map_rect(view, &local_bounds);
                // Aliased edges snap, and lines and points are a pixel wide.
                if !paint.is_anti_alias() || vertices.primitive.is_hairline() {
                    bounds = bounds.inflate(0.5, 0.5);
                }
                let batch = Batch::new(
                    BatchKind::Vertices {
                        primitive: vertices.primitive,
                        view,
                        positions: vertices.positions.to_vec(),
                        tex_coords: vertices.tex_coords.map(<[Point]>::to_vec),
                        colors: vertices
                            .colors
                            .map(|colors| colors.iter().map(|c| DrawColor::from(*c)).collect()),
                        indices: vertices.indices.map(<[u16]>::to_vec),
                    },
                    paint.color(),
                    bounds,
                );
                let pipeline = self.pipeline(paint, self.must_use_hw_aa(paint));
                self.record_batch(&pipeline, clip, batch);
            }
            Err(err) => log::debug!("Dropping draw_vertices: {err}"),
        }
        self.check_flush();
    }

    /// Draw sprites from an atlas. Sprite `i` copies `tex_rects[i]`, placed
    /// by `xforms[i]`.
    pub fn draw_atlas(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        xforms: &[Affine],
        tex_rects: &[Rect],
        colors: Option<&[Color]>,
    ) {
        if !self.begin("draw_atlas") {
            return;
        }
        let count = xforms.len();
        if tex_rects.len() != count || colors.is_some_and(|c| c.len() != count) {
            log::debug!("Dropping draw_atlas, sprite arrays differ in length");
            self.check_flush();
            return;
        }
        let corners = xforms.iter().zip(tex_rects).flat_map(|(xform, tex)| {
            math::map_rect_to_quad(*xform, &Rect::from_origin_size(Point::ZERO, tex.size()))
        });
        match bounds_of(corners) {
            Ok(local_bounds) => {
                let batch = Batch::new(
                    BatchKind::Atlas {
                        view,
                        xforms: xforms.to_vec(),
                        tex_rects: tex_rects.to_vec(),
                        colors: colors.map(|c| c.iter().map(|c| DrawColor::from(*c)).collect()),
                    },
                    paint.color(),
                    math::map_rect(view, &local_bounds),
                );
                let pipeline = self.pipeline(paint, self.must_use_hw_aa(paint));
                self.record_batch(&pipeline, clip, batch);
            }
            Err(err) => log::debug!("Dropping draw_atlas: {err}"),
        }
        self.check_flush();
    }

    /// Stretch an image into `dst`, scaling only its `center`.
    pub fn draw_image_nine(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        image_size: (u32, u32),
        center: IRect,
        dst: Rect,
    ) {
        if !self.begin("draw_image_nine") {
            return;
        }
        let batch = Batch::new(
            BatchKind::NinePatch {
                view,
                image_width: image_size.0,
                image_height: image_size.1,
                center,
                dst,
            },
            paint.color(),
            math::map_rect(view, &dst),
        );
        let pipeline = self.pipeline(paint, self.must_use_hw_aa(paint));
        self.record_batch(&pipeline, clip, batch);
        self.check_flush();
    }

    /// Draw a rounded rect with the given style.
    pub fn draw_rrect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rrect: RoundedRect,
        style: &Style,
    ) {
        if !self.begin("draw_rrect") {
            return;
        }
        self.internal_draw_rrect(clip, paint, view, rrect, style);
        self.check_flush();
    }

    fn internal_draw_rrect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        rrect: RoundedRect,
        style: &Style,
    ) {
        if rrect.rect().is_zero_area() {
            log::debug!("Dropping empty rounded rect");
            return;
        }
        let color = DrawColor::from(paint.color());
        if style.is_simple_fill() {
            let aa = paint.is_anti_alias();
            if let Some((batch, use_hw_aa)) =
                self.record_instanced(|ir, info| ir.record_rrect(rrect, view, color, aa, info))
            {
                let pipeline = self.pipeline(paint, use_hw_aa);
                self.record_batch(&pipeline, clip, batch);
                return;
            }
        }
        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        if coverage_aa {
            if let Some(batch) = oval_renderer::rrect_batch(color, view, rrect, style) {
                let pipeline = self.pipeline(paint, use_hw_aa);
                self.record_batch(&pipeline, clip, batch);
                return;
            }
        }
        let path = volatile_path(|p| p.add_rrect(rrect));
        self.internal_draw_path(clip, paint, view, Shape::from_path(path, style.clone()));
    }

    /// Fill the area between `outer` and `inner`, which must lie inside it.
    pub fn draw_drrect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        outer: RoundedRect,
        inner: RoundedRect,
    ) {
        if !self.begin("draw_drrect") {
            return;
        }
        if outer.rect().is_zero_area() || inner.rect().is_zero_area() {
            log::debug!("Dropping draw_drrect with an empty rounded rect");
        } else if !self.draw_filled_drrect(clip, paint, view, outer, inner) {
            let mut path = volatile_path(|p| {
                p.add_rrect(inner);
                p.add_rrect(outer);
            });
            path.set_fill_rule(Fill::EvenOdd);
            self.internal_draw_path(clip, paint, view, Shape::from_path(path, Style::fill()));
        }
        self.check_flush();
    }

    /// Draw the double rounded rect as one rect with two coverage effects.
    fn draw_filled_drrect(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        outer: RoundedRect,
        inner: RoundedRect,
    ) -> bool {
        let color = DrawColor::from(paint.color());
        let aa = paint.is_anti_alias();
        if let Some((batch, use_hw_aa)) = self
            .record_instanced(|ir, info| ir.record_drrect(outer, inner, view, color, aa, info))
        {
            let pipeline = self.pipeline(paint, use_hw_aa);
            self.record_batch(&pipeline, clip, batch);
            return true;
        }

        let apply_aa = aa && !self.render_target.is_unified_multisampled();
        let (inner_edge, outer_edge) = if apply_aa {
            (EdgeType::InverseFillAA, EdgeType::FillAA)
        } else {
            (EdgeType::InverseFillBW, EdgeType::FillBW)
        };

        // The effects work in device space.
        let (inner, outer, local_matrix) = if view == Affine::IDENTITY {
            (inner, outer, Affine::IDENTITY)
        } else {
            let (Some(inner), Some(outer), Some(inverse)) = (
                math::map_rrect(view, &inner),
                math::map_rrect(view, &outer),
                math::invert(view),
            ) else {
                return false;
            };
            (inner, outer, inverse)
        };
        let (Some(inner_effect), Some(outer_effect)) = (
            RRectEffect::new(inner_edge, inner),
            RRectEffect::new(outer_edge, outer),
        ) else {
            return false;
        };

        let paint = paint
            .with_anti_alias(false)
            .with_coverage_effect(Effect::RRect(inner_effect))
            .with_coverage_effect(Effect::RRect(outer_effect));
        let mut bounds = outer.rect();
        if apply_aa {
            bounds = bounds.inflate(0.5, 0.5);
        }
        self.internal_fill_rect_with_local_matrix(
            clip,
            &paint,
            Affine::IDENTITY,
            bounds,
            local_matrix,
        );
        true
    }

    /// Draw an oval with the given style.
    pub fn draw_oval(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        oval: Rect,
        style: &Style,
    ) {
        if !self.begin("draw_oval") {
            return;
        }
        self.internal_draw_oval(clip, paint, view, oval, style);
        self.check_flush();
    }

    fn internal_draw_oval(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        oval: Rect,
        style: &Style,
    ) {
        if oval.is_zero_area() {
            log::debug!("Dropping empty oval");
            return;
        }
        let color = DrawColor::from(paint.color());
        if style.is_simple_fill() {
            let aa = paint.is_anti_alias();
            if let Some((batch, use_hw_aa)) =
                self.record_instanced(|ir, info| ir.record_oval(oval, view, color, aa, info))
            {
                let pipeline = self.pipeline(paint, use_hw_aa);
                self.record_batch(&pipeline, clip, batch);
                return;
            }
        }
        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        if coverage_aa {
            if let Some(batch) = oval_renderer::oval_batch(color, view, oval, style, &self.caps) {
                let pipeline = self.pipeline(paint, use_hw_aa);
                self.record_batch(&pipeline, clip, batch);
                return;
            }
        }
        let path = volatile_path(|p| p.add_oval(oval));
        self.internal_draw_path(clip, paint, view, Shape::from_path(path, style.clone()));
    }

    /// Draw a path with the given style.
    pub fn draw_path(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        path: &Path,
        style: &Style,
    ) {
        if !self.begin("draw_path") {
            return;
        }
        self.dispatch_path(clip, paint, view, path, style);
        self.check_flush();
    }

    fn dispatch_path(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        path: &Path,
        style: &Style,
    ) {
        if path.is_empty() {
            if path.is_inverse_fill() {
                self.internal_draw_paint(clip, paint, view);
            }
            return;
        }

        let (coverage_aa, use_hw_aa) = self.coverage_aa(paint);
        if coverage_aa && !style.has_path_effect() {
            let color = DrawColor::from(paint.color());
            // Concave antialiased fills are expensive; two nested rects aren't.
            if style.is_simple_fill() && !path.is_convex() {
                if let Some(rects) = rect_batch::fills_as_nested_rects(view, path) {
                    let batch = rect_batch::aa_fill_nested(color, view, rects);
                    let pipeline = self.pipeline(paint, use_hw_aa);
                    self.record_batch(&pipeline, clip, batch);
                    return;
                }
            }
            if let Some(oval) = path.as_oval().filter(|_| !path.is_inverse_fill()) {
                if let Some(batch) = oval_renderer::oval_batch(color, view, oval, style, &self.caps)
                {
                    let pipeline = self.pipeline(paint, use_hw_aa);
                    self.record_batch(&pipeline, clip, batch);
                    return;
                }
            }
        }
        self.internal_draw_path(clip, paint, view, Shape::from_path(path.clone(), style.clone()));
    }

    /// Draw a shape with a path renderer, logging when that isn't possible.
    pub(crate) fn internal_draw_path(
        &mut self,
        clip: &Clip,
        paint: &Paint,
        view: Affine,
        shape: Shape,
    ) {
        match self.draw_shape(clip, paint, view, shape) {
            Ok(()) => {}
            Err(err @ Error::NoPathRenderer) => log::warn!("Dropping path: {err}"),
            Err(err) => log::debug!("Dropping path: {err}"),
        }
    }

    /// Find a path renderer in three tiers: the shape as given, then with
    /// its path effect applied, then with the whole style applied and the
    /// software renderer allowed. Every tier derives its shape afresh.
    fn draw_shape(&mut self, clip: &Clip, paint: &Paint, view: Affine, shape: Shape) -> Result<()> {
        let is_empty = |shape: &Shape| shape.is_empty() && !shape.inverse_filled();
        if is_empty(&shape) {
            return Err(Error::EmptyGeometry);
        }
        let (anti_alias, _) = self.coverage_aa(paint);
        let draw_type = if anti_alias {
            DrawType::ColorAntiAlias
        } else {
            DrawType::Color
        };
        let scale = math::max_scale(view);

        let mut shape = shape;
        let mut renderer =
            self.find_path_renderer(view, &shape, anti_alias, None, false, draw_type);
        if renderer.is_none() && shape.style().has_path_effect() {
            shape = shape.apply_style(ApplyStyle::PathEffectOnly, scale);
            if is_empty(&shape) {
                return Err(Error::EmptyGeometry);
            }
            renderer = self.find_path_renderer(view, &shape, anti_alias, None, false, draw_type);
        }
        if renderer.is_none() {
            if shape.style().applies() {
                shape = shape.apply_style(ApplyStyle::PathEffectAndStroke, scale);
                if is_empty(&shape) {
                    return Err(Error::EmptyGeometry);
                }
            }
            renderer = self.find_path_renderer(view, &shape, anti_alias, None, true, draw_type);
        }
        let renderer = renderer.ok_or(Error::NoPathRenderer)?;

        log::trace!("Drawing path with {:?}", renderer.kind());
        let gamma_correct = self.props.gamma_correct;
        renderer.draw_path(DrawPathArgs {
            draw_context: self,
            paint,
            user_stencil: None,
            clip,
            view,
            shape: &shape,
            anti_alias,
            gamma_correct,
        });
        Ok(())
    }

    fn find_path_renderer(
        &self,
        view: Affine,
        shape: &Shape,
        anti_alias: bool,
        user_stencil: Option<&UserStencilSettings>,
        allow_software: bool,
        draw_type: DrawType,
    ) -> Option<Rc<dyn PathRenderer>> {
        let args = path_renderer::CanDrawPathArgs {
            caps: &self.caps,
            view,
            shape,
            anti_alias,
            has_user_stencil_settings: user_stencil.is_some(),
            is_stencil_buffer_msaa: self.is_stencil_buffer_multisampled(),
        };
        self.manager
            .borrow_mut()
            .path_renderer(&args, allow_software, draw_type)
    }

    /// Let the backend drop the target's current contents.
    pub fn discard(&mut self) {
        if !self.begin("discard") {
            return;
        }
        self.with_draw_target(DrawTarget::discard);
        self.check_flush();
    }

    /// Copy pixels of `src` into this target, with `src_rect`'s top left
    /// landing on `dst_point`.
    ///
    /// Returns `false` when nothing was copied.
    pub fn copy_surface(
        &mut self,
        src: &Arc<RenderTarget>,
        src_rect: IRect,
        dst_point: (i32, i32),
    ) -> bool {
        if !self.begin("copy_surface") {
            return false;
        }
        if src.id() != self.render_target.id() {
            // Later draws into the source mustn't reorder with the copy.
            self.manager.borrow_mut().close_last_draw_target(src.id());
        }
        let copied = self
            .with_draw_target(|dt| dt.copy_surface(src, src_rect, dst_point))
            .unwrap_or(false);
        if !copied {
            log::debug!("Dropping copy_surface, nothing left after clipping");
        }
        copied
    }

    /// Record a batch built by the caller.
    pub fn draw_batch(&mut self, clip: &Clip, paint: &Paint, batch: Batch) {
        if !self.begin("draw_batch") {
            return;
        }
        let pipeline = self.pipeline(paint, self.must_use_hw_aa(paint));
        self.record_batch(&pipeline, clip, batch);
        self.check_flush();
    }

    /// Set the stencil clip bit to `inside_clip` inside `rect`.
    pub fn clear_stencil_clip(&mut self, rect: IRect, inside_clip: bool) {
        if !self.begin("clear_stencil_clip") {
            return;
        }
        self.with_draw_target(|dt| dt.clear_stencil_clip(rect, inside_clip));
    }

    /// Write a rect into the stencil buffer, color writes off.
    pub fn stencil_rect(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        use_hw_aa: bool,
        view: Affine,
        rect: Rect,
    ) {
        if !self.begin("stencil_rect") {
            return;
        }
        let paint = Paint::default()
            .with_anti_alias(use_hw_aa)
            .with_transfer(TransferMode::DisableColor);
        self.draw_filled_rect(clip, &paint, view, rect, user_stencil);
        self.check_flush();
    }

    /// Write a path into the stencil buffer, color writes off.
    pub fn stencil_path(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        use_hw_aa: bool,
        view: Affine,
        path: &Path,
    ) {
        if !self.begin("stencil_path") {
            return;
        }
        self.with_draw_target(|dt| dt.stencil_path(clip, user_stencil, use_hw_aa, view, path));
    }

    /// Draw a rect's coverage with a set operation, as used to build clip
    /// masks. Returns `false` when nothing can draw it.
    #[allow(clippy::too_many_arguments, reason = "mirrors draw_and_stencil_path")]
    pub fn draw_and_stencil_rect(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        op: RegionOp,
        invert: bool,
        do_aa: bool,
        view: Affine,
        rect: Rect,
    ) -> bool {
        if !self.begin("draw_and_stencil_rect") {
            return false;
        }
        let drawn =
            self.internal_draw_and_stencil_rect(clip, user_stencil, op, invert, do_aa, view, rect);
        self.check_flush();
        drawn
    }

    #[allow(clippy::too_many_arguments, reason = "mirrors draw_and_stencil_rect")]
    fn internal_draw_and_stencil_rect(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        op: RegionOp,
        invert: bool,
        do_aa: bool,
        view: Affine,
        rect: Rect,
    ) -> bool {
        let paint = Paint::default()
            .with_anti_alias(do_aa)
            .with_transfer(TransferMode::CoverageSetOp { op, invert });
        if self.draw_filled_rect(clip, &paint, view, rect, user_stencil) {
            return true;
        }
        let path = volatile_path(|p| p.add_rect(rect));
        self.internal_draw_and_stencil_path(clip, user_stencil, op, invert, do_aa, view, &path)
    }

    /// Draw a path's coverage with a set operation, as used to build clip
    /// masks. Software rendering is never used. Returns `false` when no path
    /// renderer accepts the path.
    #[allow(
        clippy::too_many_arguments,
        reason = "stencil settings, set op and geometry are all independent"
    )]
    pub fn draw_and_stencil_path(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        op: RegionOp,
        invert: bool,
        do_aa: bool,
        view: Affine,
        path: &Path,
    ) -> bool {
        if !self.begin("draw_and_stencil_path") {
            return false;
        }
        let drawn =
            self.internal_draw_and_stencil_path(clip, user_stencil, op, invert, do_aa, view, path);
        self.check_flush();
        drawn
    }

    #[allow(clippy::too_many_arguments, reason = "mirrors draw_and_stencil_path")]
    fn internal_draw_and_stencil_path(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        op: RegionOp,
        invert: bool,
        do_aa: bool,
        view: Affine,
        path: &Path,
    ) -> bool {
        if path.is_empty() {
            if path.is_inverse_fill() {
                let target = self.bounds_rect();
                self.internal_draw_and_stencil_rect(
                    clip,
                    user_stencil,
                    op,
                    invert,
                    false,
                    Affine::IDENTITY,
                    target,
                );
            }
            return true;
        }

        let anti_alias = do_aa && !self.render_target.is_unified_multisampled();
        let draw_type = if anti_alias {
            DrawType::ColorAntiAlias
        } else {
            DrawType::Color
        };
        let shape = Shape::from_path(path.clone(), Style::fill());
        let Some(renderer) = self.find_path_renderer(
            view,
            &shape,
            anti_alias,
            user_stencil.as_ref(),
            false,
            draw_type,
        ) else {
            log::debug!("No path renderer can draw and stencil the path");
            return false;
        };

        let paint = Paint::default().with_transfer(TransferMode::CoverageSetOp { op, invert });
        let gamma_correct = self.props.gamma_correct;
        renderer.draw_path(DrawPathArgs {
            draw_context: self,
            paint: &paint,
            user_stencil,
            clip,
            view,
            shape: &shape,
            anti_alias,
            gamma_correct,
        });
        true
    }
}
