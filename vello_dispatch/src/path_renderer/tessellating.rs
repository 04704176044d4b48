// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aliased concave fills, triangulated on the CPU.

use crate::batch::OutlineStyle;

use super::{CanDrawPathArgs, DrawPathArgs, PathRenderer, PathRendererKind};

#[derive(Debug)]
pub(crate) struct TessellatingPathRenderer;

impl PathRenderer for TessellatingPathRenderer {
    fn kind(&self) -> PathRendererKind {
        PathRendererKind::Tessellating
    }

    fn can_draw_path(&self, args: &CanDrawPathArgs<'_>) -> bool {
        let shape = args.shape;
        // Convex shapes are cheaper elsewhere, and volatile paths can't reuse
        // their triangulation.
        shape.style().is_simple_fill()
            && !args.anti_alias
            && !shape.is_convex()
            && shape.has_unstyled_key()
    }

    fn draw_path(&self, args: DrawPathArgs<'_>) {
        let batch = super::path_batch(PathRendererKind::Tessellating, &args, OutlineStyle::Fill);
        super::submit(args, batch);
    }
}
