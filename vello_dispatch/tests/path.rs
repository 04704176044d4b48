// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path dispatch: fast paths, the renderer chain and the software fallback.

use std::sync::Arc;

use crate::util::{aliased, blue, Harness};
use vello_dispatch::kurbo::{Affine, Cap, Rect, Stroke};
use vello_dispatch::peniko::Fill;
use vello_dispatch::{
    BatchKind, Caps, Clip, ContextOptions, Direction, GpuPathRenderers, IRect, OvalKind, Path,
    PathEffect, PathRendererKind, Style,
};

fn nested_rects(outer: Rect, inner: Rect) -> Path {
    let mut path = Path::new();
    path.add_rect_with_direction(outer, Direction::Clockwise);
    path.add_rect_with_direction(inner, Direction::CounterClockwise);
    path
}

fn arrow() -> Path {
    let mut path = Path::new();
    path.move_to((10.0, 10.0));
    path.line_to((60.0, 30.0));
    path.line_to((10.0, 50.0));
    path.line_to((25.0, 30.0));
    path.close_path();
    path
}

#[test]
fn uniform_nested_rects_take_the_fast_path() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let outer = Rect::new(10.0, 10.0, 50.0, 50.0);
    let inner = Rect::new(12.0, 12.0, 48.0, 48.0);

    dc.draw_path(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        &nested_rects(outer, inner),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::NestedRects {
            view: Affine::IDENTITY,
            outer,
            inner,
        }
    );
}

#[test]
fn thin_uneven_margins_skip_the_fast_path() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_path(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        &nested_rects(
            Rect::new(10.0, 10.0, 50.0, 50.0),
            Rect::new(10.5, 12.0, 48.0, 48.0),
        ),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(!matches!(
        batches[0].batch.kind(),
        BatchKind::NestedRects { .. }
    ));
}

#[test]
fn oval_paths_use_the_oval_renderer() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_path(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        &Path::from_oval(Rect::new(10.0, 10.0, 50.0, 30.0)),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Oval {
            kind: OvalKind::Ellipse,
            ..
        }
    ));
}

#[test]
fn concave_antialiased_fill_falls_back_to_software() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_path(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        &arrow(),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::SoftwareMask { mask_bounds, .. } = batches[0].batch.kind() else {
        panic!("expected a software mask, got {:?}", batches[0].batch.kind());
    };
    assert_eq!(*mask_bounds, IRect::new(9, 9, 61, 51));
}

#[test]
fn concave_aliased_fill_is_tessellated() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_path(
        &Clip::wide_open(),
        &aliased(blue()),
        Affine::IDENTITY,
        &arrow(),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Path {
            renderer: PathRendererKind::Tessellating,
            ..
        }
    ));
}

#[test]
fn same_draw_twice_gives_equal_independent_batches() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let path = arrow();

    for _ in 0..2 {
        dc.draw_path(
            &Clip::wide_open(),
            &aliased(blue()),
            Affine::translate((5.0, 5.0)),
            &path,
            &Style::fill(),
        );
    }

    let batches = harness.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1]);
    let (a, b) = (
        batches[0].pipeline.as_ref().unwrap(),
        batches[1].pipeline.as_ref().unwrap(),
    );
    assert!(!Arc::ptr_eq(a, b));
}

#[test]
fn empty_inverse_path_fills_everything() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let mut empty = Path::new();
    dc.draw_path(&Clip::wide_open(), &blue(), Affine::IDENTITY, &empty, &Style::fill());
    empty.set_inverse_fill(true);
    dc.draw_path(&Clip::wide_open(), &blue(), Affine::IDENTITY, &empty, &Style::fill());

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::Clear {
            rect: IRect::new(0, 0, 100, 100)
        }
    );
}

#[test]
fn dashed_lines_use_the_dash_renderer() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let mut line = Path::new();
    line.move_to((10.0, 50.0));
    line.line_to((90.0, 50.0));
    let style = Style::stroke(Stroke::new(2.0).with_caps(Cap::Butt))
        .with_path_effect(PathEffect::dash([4.0, 2.0], 0.0));

    dc.draw_path(&Clip::wide_open(), &blue(), Affine::IDENTITY, &line, &style);

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(batches[0].batch.kind(), BatchKind::DashLine { .. }));
}

#[test]
fn dashed_hairline_curves_are_dashed_then_drawn_on_the_gpu() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let mut curve = Path::new();
    curve.move_to((10.0, 80.0));
    curve.quad_to((50.0, 0.0), (90.0, 80.0));
    let style = Style::hairline().with_path_effect(PathEffect::dash([6.0, 3.0], 0.0));

    // Not a line, so the dash renderer passes. Once dashed, the plain hairline
    // is taken by the hairline renderer rather than software.
    dc.draw_path(&Clip::wide_open(), &blue(), Affine::IDENTITY, &curve, &style);

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Path {
            renderer: PathRendererKind::AaHairline,
            ..
        }
    ));
}

#[test]
fn software_takes_expanded_strokes() {
    let options = ContextOptions {
        gpu_path_renderers: GpuPathRenderers::none(),
        ..ContextOptions::default()
    };
    let harness = Harness::with(Caps::default(), options);
    let mut dc = harness.draw_context(100, 100);

    // No GPU renderer; software takes the stroke once it's expanded to a fill.
    dc.draw_path(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        &arrow(),
        &Style::stroke(Stroke::new(3.0)),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::SoftwareMask { geometry, .. } = batches[0].batch.kind() else {
        panic!("expected a software mask, got {:?}", batches[0].batch.kind());
    };
    assert_eq!(geometry.fill, Fill::NonZero);
}
