// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stencil-then-cover rendering with the backend's native path support.

use crate::batch::{LocalCoords, OutlineStyle};
use crate::math;
use crate::pipeline::{PipelineState, StencilOp, StencilTest, UserStencilSettings};
use crate::rect_batch;
use crate::shape::{ApplyStyle, Shape};
use crate::style::StyleKind;

use super::{
    CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind, StencilPathArgs, StencilSupport,
};

/// Fill the pixels the stencil pass left untouched, inside the clip, and
/// reset the others.
const INVERTED_COVER_PASS: UserStencilSettings = UserStencilSettings {
    test: StencilTest::EqualIfInClip,
    pass_op: StencilOp::Keep,
    fail_op: StencilOp::Zero,
    reference: 0,
    mask: 0xffff,
};

/// Fill the pixels the stencil pass marked, resetting them as it goes.
const COVER_PASS: UserStencilSettings = UserStencilSettings {
    test: StencilTest::NotEqual,
    pass_op: StencilOp::Zero,
    fail_op: StencilOp::Keep,
    reference: 0,
    mask: 0xffff,
};

#[derive(Debug)]
pub(crate) struct StencilAndCoverPathRenderer;

impl PathRenderer for StencilAndCoverPathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::StencilAndCover
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        if args.shape.style().kind() == StyleKind::Hairline || args.has_user_stencil_settings {
            return false;
        }
        if args.anti_alias {
            args.is_stencil_buffer_msaa
        } else {
            true
        }
    }

    fn stencil_support(&self, _shape: &Shape) -> StencilSupport {
        StencilSupport::StencilOnly
    }

    fn stencil_path(&self, args: StencilPathArgs<'_>) {
        let path = args.shape.as_path();
        args.draw_context
            .stencil_path(args.clip, None, args.is_aa, args.view, &path);
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        // The backend fills paths natively; strokes and dashes are resolved first.
        let filled = args
            .shape
            .apply_style(ApplyStyle::PathEffectAndStroke, math::max_scale(args.view));
        let path = filled.as_path();
        let anti_alias = args.paint.is_anti_alias();

        if path.is_inverse_fill() {
            // The cover pass spans the whole target, in local space so that it
            // shares the view transform of the stencil pass.
            let Some(inverse) = math::invert(args.view) else {
                log::debug!("Dropping inverse path under a singular transform");
                return;
            };
            args.draw_context.stencil_path(
                args.clip,
                Some(INVERTED_COVER_PASS),
                anti_alias,
                args.view,
                &path,
            );

            let bloat = math::max_scale(args.view) * 0.5;
            let bounds = math::map_rect(inverse, &args.draw_context.bounds_rect())
                .inflate(bloat, bloat);
            let batch = rect_batch::fill(
                args.paint.color().into(),
                false,
                args.view,
                bounds,
                LocalCoords::None,
            );
            let use_hw_aa = anti_alias && !args.draw_context.has_mixed_samples();
            let pipeline = PipelineState::new(args.paint, use_hw_aa)
                .with_user_stencil(Some(INVERTED_COVER_PASS))
                .with_gamma_correct(args.gamma_correct);
            args.draw_context.record_batch(&pipeline, args.clip, batch);
        } else {
            let inner = DrawPathArgs {
                shape: &filled,
                ..args
            };
            let batch =
                super::path_batch(PathRendererKind::StencilAndCover, &inner, OutlineStyle::Fill);
            let pipeline = PipelineState::new(inner.paint, anti_alias)
                .with_user_stencil(Some(COVER_PASS))
                .with_gamma_correct(inner.gamma_correct);
            inner.draw_context.record_batch(&pipeline, inner.clip, batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Caps;
    use crate::kurbo::{Affine, Rect};
    use crate::path::Path;
    use crate::style::Style;

    fn args<'a>(caps: &'a Caps, shape: &'a Shape) -> CanDrawPathArgs<'a> {
        CanDrawPathArgs {
            caps,
            view: Affine::IDENTITY,
            shape,
            anti_alias: false,
            has_user_stencil_settings: false,
            is_stencil_buffer_msaa: false,
        }
    }

    #[test]
    fn antialiasing_needs_a_multisampled_stencil() {
        let caps = Caps::default();
        let shape = Shape::from_path(Path::from_oval(Rect::new(0.0, 0.0, 8.0, 8.0)), Style::fill());
        let pr = StencilAndCoverPathRenderer;
        assert!(pr.can_draw_path(&args(&caps, &shape)));
        let aa = CanDrawPathArgs {
            anti_alias: true,
            ..args(&caps, &shape)
        };
        assert!(!pr.can_draw_path(&aa));
        assert!(pr.can_draw_path(&CanDrawPathArgs {
            is_stencil_buffer_msaa: true,
            ..aa
        }));
    }

    #[test]
    fn hairlines_and_user_stencils_are_declined() {
        let caps = Caps::default();
        let rect = Rect::new(0.0, 0.0, 8.0, 8.0);
        let hairline = Shape::from_rect(rect, Style::hairline());
        let pr = StencilAndCoverPathRenderer;
        assert!(!pr.can_draw_path(&args(&caps, &hairline)));
        let fill = Shape::from_rect(rect, Style::fill());
        assert!(!pr.can_draw_path(&CanDrawPathArgs {
            has_user_stencil_settings: true,
            ..args(&caps, &fill)
        }));
        assert_eq!(pr.stencil_support(&fill), StencilSupport::StencilOnly);
    }
}
