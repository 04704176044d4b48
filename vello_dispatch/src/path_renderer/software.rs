// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The last resort: rasterize the path on the CPU into a coverage mask.

use crate::batch::{Batch, BatchKind, DrawColor, LocalCoords, OutlineStyle, PathGeometry};
use crate::kurbo::Affine;
use crate::math::{self, IRect};
use crate::pipeline::PipelineState;
use crate::rect_batch;
use crate::style::StyleKind;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

/// Accepts anything whose style has already been resolved into a fill or a
/// hairline.
#[derive(Debug)]
pub(crate) struct SoftwarePathRenderer {
    allow_caching: bool,
}

impl SoftwarePathRenderer {
    pub(crate) fn new(allow_caching: bool) -> Self {
        Self { allow_caching }
    }
}

/// The parts of `clip` outside of `mask`, as up to four device rects.
fn around_mask(clip: IRect, mask: IRect) -> impl Iterator<Item = IRect> {
    [
        IRect::new(clip.x0, clip.y0, clip.x1, mask.y0),
        IRect::new(clip.x0, mask.y0, mask.x0, mask.y1),
        IRect::new(mask.x1, mask.y0, clip.x1, mask.y1),
        IRect::new(clip.x0, mask.y1, clip.x1, clip.y1),
    ]
    .into_iter()
    .filter(|r| !r.is_empty())
}

impl PathRenderer for SoftwarePathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::Software
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        !args.shape.style().applies()
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let shape = args.shape;
        let inverse = shape.inverse_filled();
        let (width, height) = (args.draw_context.width(), args.draw_context.height());
        let clip_bounds = args.clip.conservative_bounds(width, height);

        let mut device = math::map_rect(args.view, &shape.styled_bounds());
        if shape.style().kind() == StyleKind::Hairline || args.anti_alias {
            device = device.inflate(0.5, 0.5);
        }
        let mask_bounds = if shape.is_empty() {
            None
        } else {
            IRect::round_out(device).intersect(&clip_bounds)
        };

        let color = DrawColor::from(args.paint.color());
        let around: Vec<IRect> = if inverse {
            match mask_bounds {
                Some(mask) => around_mask(clip_bounds, mask).collect(),
                None => (!clip_bounds.is_empty()).then_some(clip_bounds).into_iter().collect(),
            }
        } else {
            Vec::new()
        };

        if let Some(mask) = mask_bounds {
            let path = shape.as_path();
            let outline = if shape.style().kind() == StyleKind::Hairline {
                OutlineStyle::Hairline
            } else {
                OutlineStyle::Fill
            };
            let batch = Batch::new(
                BatchKind::SoftwareMask {
                    view: args.view,
                    geometry: PathGeometry {
                        path: path.bez_path().clone(),
                        fill: path.fill_rule(),
                        inverse,
                        outline,
                    },
                    mask_bounds: mask,
                    cacheable: self.allow_caching && !path.is_volatile(),
                },
                color,
                mask.to_rect(),
            );
            let pipeline = super::pipeline_for(&args, false);
            args.draw_context.record_batch(&pipeline, args.clip, batch);
        } else if !inverse {
            log::debug!("Software path mask is empty, nothing to draw");
            return;
        }

        if around.is_empty() {
            return;
        }
        // The surrounding rects are drawn in device space; local coordinates
        // still follow the view transform.
        let Some(local) = math::invert(args.view) else {
            log::debug!("Dropping inverse fill outside of the mask, singular transform");
            return;
        };
        let pipeline = PipelineState::new(&args.paint.with_anti_alias(false), false)
            .with_user_stencil(args.user_stencil)
            .with_gamma_correct(args.gamma_correct);
        for rect in around {
            let batch = rect_batch::fill(
                color,
                false,
                Affine::IDENTITY,
                rect.to_rect(),
                LocalCoords::Matrix(local),
            );
            args.draw_context.record_batch(&pipeline, args.clip, batch);
        }
    }
}
