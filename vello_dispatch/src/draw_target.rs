// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered list of batches recorded for one render target between flushes.

use std::sync::Arc;

use crate::batch::{Batch, BatchKind, DrawColor};
use crate::clip::{AppliedClip, Clip};
use crate::config::{Caps, ContextOptions};
use crate::instanced::{InstancedPipelineInfo, InstancedRendering};
use crate::kurbo::Affine;
use crate::math::{self, IRect};
use crate::paint::{Paint, TransferMode};
use crate::path::Path;
use crate::pipeline::{PipelineState, UserStencilSettings};
use crate::render_target::{RenderTarget, RenderTargetId};

/// How many earlier batches [`combine_candidate`] looks at.
const MAX_LOOKBACK: usize = 10;

/// A batch as recorded by a draw target.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedBatch {
    /// The batch.
    pub batch: Batch,
    /// The pipeline it's drawn with. `None` for clears, discards and copies,
    /// which bypass the pipeline.
    pub pipeline: Option<Arc<PipelineState>>,
    /// What's left of the clip after testing it against the batch bounds.
    pub clip: AppliedClip,
}

impl RecordedBatch {
    /// Whether two batches could be drawn with a single draw call.
    fn can_combine_with(&self, other: &Self) -> bool {
        core::mem::discriminant(self.batch.kind()) == core::mem::discriminant(other.batch.kind())
            && self.batch.kind().name() == other.batch.kind().name()
            && self.pipeline == other.pipeline
            && self.clip == other.clip
    }
}

/// An earlier batch that the batch at `index` could be drawn together with,
/// if one is found before an overlapping, incompatible batch.
pub(crate) fn combine_candidate(batches: &[RecordedBatch], index: usize) -> Option<usize> {
    let current = batches.get(index)?;
    let start = index.saturating_sub(MAX_LOOKBACK);
    for candidate in (start..index).rev() {
        let earlier = &batches[candidate];
        if current.can_combine_with(earlier) {
            return Some(candidate);
        }
        // Drawing out of order past this one would change the result.
        if math::rects_overlap(&current.batch.bounds(), &earlier.batch.bounds()) {
            return None;
        }
    }
    None
}

/// Identifies a draw target within its drawing manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DrawTargetId(pub(crate) u64);

/// Records batches for one render target until it's closed.
#[derive(Debug)]
pub(crate) struct DrawTarget {
    id: DrawTargetId,
    render_target: Arc<RenderTarget>,
    batches: Vec<RecordedBatch>,
    dependencies: Vec<RenderTargetId>,
    closed: bool,
    instanced: Option<InstancedRendering>,
    instanced_info: InstancedPipelineInfo,
}

impl DrawTarget {
    pub(crate) fn new(
        id: DrawTargetId,
        render_target: Arc<RenderTarget>,
        caps: &Caps,
        options: &ContextOptions,
    ) -> Self {
        let instanced = if options.enable_instanced_rendering {
            InstancedRendering::new(caps)
        } else {
            None
        };
        let instanced_info = InstancedPipelineInfo::new(&render_target);
        Self {
            id,
            render_target,
            batches: Vec::new(),
            dependencies: Vec::new(),
            closed: false,
            instanced,
            instanced_info,
        }
    }

    pub(crate) fn id(&self) -> DrawTargetId {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn batches(&self) -> &[RecordedBatch] {
        &self.batches
    }

    #[cfg(test)]
    pub(crate) fn dependencies(&self) -> &[RenderTargetId] {
        &self.dependencies
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop accepting batches. There is no way back.
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// The instanced renderer and the target facts it needs, when enabled.
    pub(crate) fn instanced(&self) -> Option<(&InstancedRendering, &InstancedPipelineInfo)> {
        self.instanced.as_ref().map(|ir| (ir, &self.instanced_info))
    }

    fn record(&mut self, entry: RecordedBatch) -> Option<usize> {
        debug_assert!(!self.closed, "batch recorded into a closed draw target");
        if self.closed {
            log::debug!("Dropping {} batch, the draw target is closed", entry.batch.kind().name());
            return None;
        }
        log::trace!("Recording {} batch", entry.batch.kind().name());
        self.batches.push(entry);
        Some(self.batches.len() - 1)
    }

    /// Record a batch that bypasses the pipeline and the clip.
    pub(crate) fn add_batch(&mut self, batch: Batch) -> Option<usize> {
        self.record(RecordedBatch {
            batch,
            pipeline: None,
            clip: AppliedClip::default(),
        })
    }

    /// Record a batch with its pipeline, after applying the clip to its bounds.
    ///
    /// Batches that the clip rejects entirely are dropped.
    pub(crate) fn draw_batch(
        &mut self,
        pipeline: &PipelineState,
        clip: &Clip,
        batch: Batch,
    ) -> Option<usize> {
        let rt = &self.render_target;
        let Some(applied) = clip.apply(&batch.bounds(), rt.width(), rt.height()) else {
            log::debug!("Dropping {} batch, it's clipped out", batch.kind().name());
            return None;
        };
        self.record(RecordedBatch {
            batch,
            pipeline: Some(Arc::new(pipeline.clone())),
            clip: applied,
        })
    }

    /// Let the backend drop the current contents.
    pub(crate) fn discard(&mut self) {
        let bounds = self.render_target.bounds_rect();
        self.add_batch(Batch::new(BatchKind::Discard, DrawColor::TRANSPARENT, bounds));
    }

    /// Clear `rect`, which is already limited to the target.
    pub(crate) fn clear(&mut self, rect: IRect, color: DrawColor) {
        self.add_batch(Batch::new(BatchKind::Clear { rect }, color, rect.to_rect()));
    }

    /// Set the stencil clip bit inside `rect`.
    pub(crate) fn clear_stencil_clip(&mut self, rect: IRect, inside_clip: bool) {
        let Some(rect) = rect.intersect(&self.render_target.bounds()) else {
            log::debug!("Dropping stencil clip clear outside of the target");
            return;
        };
        self.add_batch(Batch::new(
            BatchKind::ClearStencilClip { rect, inside_clip },
            DrawColor::TRANSPARENT,
            rect.to_rect(),
        ));
    }

    /// Write the path's winding into the stencil buffer, color writes off.
    pub(crate) fn stencil_path(
        &mut self,
        clip: &Clip,
        user_stencil: Option<UserStencilSettings>,
        use_hw_aa: bool,
        view: Affine,
        path: &Path,
    ) {
        let bounds = if path.is_inverse_fill() {
            self.render_target.bounds_rect()
        } else {
            math::map_rect(view, &path.bounds())
        };
        let paint = Paint::default()
            .with_anti_alias(false)
            .with_transfer(TransferMode::DisableColor);
        let pipeline = PipelineState::new(&paint, use_hw_aa).with_user_stencil(user_stencil);
        let batch = Batch::new(
            BatchKind::StencilPath {
                view,
                path: path.bez_path().clone(),
                fill: path.fill_rule(),
                use_hw_aa,
            },
            DrawColor::TRANSPARENT,
            bounds,
        );
        self.draw_batch(&pipeline, clip, batch);
    }

    /// Copy pixels from `src`, limited to both surfaces.
    ///
    /// Returns `false` when nothing is left to copy. The caller is responsible
    /// for closing the source's draw target.
    pub(crate) fn copy_surface(
        &mut self,
        src: &RenderTarget,
        src_rect: IRect,
        dst_point: (i32, i32),
    ) -> bool {
        // Clip to the source, moving the destination along. The offsets are
        // kept in i64 so extreme rects can't overflow.
        let Some(clipped_src) = src_rect.intersect(&src.bounds()) else {
            return false;
        };
        let offset_x = i64::from(dst_point.0) - i64::from(src_rect.x0);
        let offset_y = i64::from(dst_point.1) - i64::from(src_rect.y0);

        // Then to the destination, moving the source along.
        let target = self.render_target.bounds();
        let dst_x0 = (i64::from(clipped_src.x0) + offset_x).max(i64::from(target.x0));
        let dst_y0 = (i64::from(clipped_src.y0) + offset_y).max(i64::from(target.y0));
        let dst_x1 = (i64::from(clipped_src.x1) + offset_x).min(i64::from(target.x1));
        let dst_y1 = (i64::from(clipped_src.y1) + offset_y).min(i64::from(target.y1));
        if dst_x0 >= dst_x1 || dst_y0 >= dst_y1 {
            return false;
        }
        let to_i32 = |v: i64| i32::try_from(v).ok();
        let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
            to_i32(dst_x0 - offset_x),
            to_i32(dst_y0 - offset_y),
            to_i32(dst_x1 - offset_x),
            to_i32(dst_y1 - offset_y),
        ) else {
            return false;
        };
        let src_rect = IRect::new(x0, y0, x1, y1);
        // Clamped to the target, so these fit.
        let clipped_dst = IRect::new(
            to_i32(dst_x0).unwrap_or(target.x0),
            to_i32(dst_y0).unwrap_or(target.y0),
            to_i32(dst_x1).unwrap_or(target.x1),
            to_i32(dst_y1).unwrap_or(target.y1),
        );

        if src.id() != self.render_target.id() && !self.dependencies.contains(&src.id()) {
            self.dependencies.push(src.id());
        }
        self.add_batch(Batch::new(
            BatchKind::CopySurface {
                src: src.id(),
                src_rect,
                dst_point: (clipped_dst.x0, clipped_dst.y0),
            },
            DrawColor::TRANSPARENT,
            clipped_dst.to_rect(),
        ))
        .is_some()
    }

    /// Batches waiting for the next flush.
    pub(crate) fn pending_count(&self) -> usize {
        self.batches.len()
    }

    /// Hand the recorded work over, leaving the target empty and closed.
    pub(crate) fn into_parts(self) -> (Arc<RenderTarget>, Vec<RecordedBatch>, Vec<RenderTargetId>) {
        (self.render_target, self.batches, self.dependencies)
    }
}
