// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Antialiased hairlines, and strokes thin enough to pass for them.

use crate::batch::OutlineStyle;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

#[derive(Debug)]
pub(crate) struct AaHairlinePathRenderer;

impl PathRenderer for AaHairlinePathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::AaHairline
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        if !args.anti_alias || !super::is_stroke_hair_or_equivalent(args.shape.style(), args.view) {
            return false;
        }
        // Curves are evaluated in the fragment shader.
        super::has_only_lines(args.shape) || args.caps.shader_derivative_support
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let batch = super::path_batch(PathRendererKind::AaHairline, &args, OutlineStyle::Hairline);
        super::submit(args, batch);
    }
}
