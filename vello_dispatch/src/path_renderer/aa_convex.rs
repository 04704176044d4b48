// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Antialiased convex fills with analytic edge coverage.

use crate::batch::OutlineStyle;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

#[derive(Debug)]
pub(crate) struct AaConvexPathRenderer;

impl PathRenderer for AaConvexPathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::AaConvex
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        args.caps.shader_derivative_support
            && args.anti_alias
            && args.shape.style().is_simple_fill()
            && !args.shape.inverse_filled()
            && args.shape.is_convex()
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let batch = super::path_batch(PathRendererKind::AaConvex, &args, OutlineStyle::Fill);
        super::submit(args, batch);
    }
}
