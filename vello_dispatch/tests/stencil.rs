// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stencil and clip mask operations.

use crate::util::Harness;
use vello_dispatch::kurbo::{Affine, Rect};
use vello_dispatch::peniko::Fill;
use vello_dispatch::{
    BatchKind, Clip, IRect, Path, PathRendererKind, RegionOp, TransferMode, UserStencilSettings,
};

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
fn draw_and_stencil_rect_writes_coverage_with_the_set_op() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let settings = UserStencilSettings::replace(1);

    assert!(dc.draw_and_stencil_rect(
        &Clip::wide_open(),
        Some(settings),
        RegionOp::Union,
        false,
        true,
        Affine::IDENTITY,
        Rect::new(10.0, 10.0, 50.0, 50.0),
    ));

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::FillRect { aa: true, .. }
    ));
    let pipeline = batches[0].pipeline.as_ref().unwrap();
    assert_eq!(
        pipeline.transfer(),
        TransferMode::CoverageSetOp {
            op: RegionOp::Union,
            invert: false
        }
    );
    assert_eq!(pipeline.user_stencil(), Some(&settings));
}

#[test]
fn skewed_stencil_rect_goes_through_a_path_renderer() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    assert!(dc.draw_and_stencil_rect(
        &Clip::wide_open(),
        None,
        RegionOp::Intersect,
        true,
        true,
        Affine::skew(0.5, 0.0),
        Rect::new(10.0, 10.0, 50.0, 50.0),
    ));

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Path {
            renderer: PathRendererKind::AaConvex,
            ..
        }
    ));
    assert_eq!(
        batches[0].pipeline.as_ref().unwrap().transfer(),
        TransferMode::CoverageSetOp {
            op: RegionOp::Intersect,
            invert: true
        }
    );
}

#[test]
fn draw_and_stencil_path_never_uses_software() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let clip = Clip::wide_open();
    let path = arrow();

    // Antialiased concave fills are only drawn in software.
    assert!(!dc.draw_and_stencil_path(
        &clip,
        None,
        RegionOp::Replace,
        false,
        true,
        Affine::IDENTITY,
        &path,
    ));
    assert!(dc.draw_and_stencil_path(
        &clip,
        None,
        RegionOp::Replace,
        false,
        false,
        Affine::IDENTITY,
        &path,
    ));

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Path {
            renderer: PathRendererKind::Tessellating,
            ..
        }
    ));
}

#[test]
fn empty_inverse_stencil_path_covers_the_target() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(64, 48);
    let mut empty = Path::new();
    empty.set_inverse_fill(true);

    assert!(dc.draw_and_stencil_path(
        &Clip::wide_open(),
        None,
        RegionOp::Difference,
        false,
        true,
        Affine::IDENTITY,
        &empty,
    ));

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::FillRect { aa, rect, .. } = batches[0].batch.kind() else {
        panic!("expected a rect fill, got {:?}", batches[0].batch.kind());
    };
    assert!(!aa);
    assert_eq!(*rect, Rect::new(0.0, 0.0, 64.0, 48.0));
}

#[test]
fn stencil_path_disables_color() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let settings = UserStencilSettings::replace(7);

    dc.stencil_path(
        &Clip::wide_open(),
        Some(settings),
        false,
        Affine::IDENTITY,
        &arrow(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::StencilPath {
        fill, use_hw_aa, ..
    } = batches[0].batch.kind()
    else {
        panic!("expected a stencil path, got {:?}", batches[0].batch.kind());
    };
    assert_eq!(*fill, Fill::NonZero);
    assert!(!use_hw_aa);
    assert_eq!(batches[0].batch.bounds(), Rect::new(10.0, 10.0, 60.0, 50.0));
    let pipeline = batches[0].pipeline.as_ref().unwrap();
    assert_eq!(pipeline.transfer(), TransferMode::DisableColor);
    assert_eq!(pipeline.user_stencil(), Some(&settings));
}

#[test]
fn stencil_rect_disables_color() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.stencil_rect(
        &Clip::wide_open(),
        Some(UserStencilSettings::test_equal(2)),
        false,
        Affine::IDENTITY,
        Rect::new(0.0, 0.0, 30.0, 30.0),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::FillRect { aa: false, .. }
    ));
    assert_eq!(
        batches[0].pipeline.as_ref().unwrap().transfer(),
        TransferMode::DisableColor
    );
}

#[test]
fn stencil_clip_clears_are_limited_to_the_target() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.clear_stencil_clip(IRect::new(-5, -5, 20, 20), true);
    dc.clear_stencil_clip(IRect::new(200, 200, 220, 220), false);

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::ClearStencilClip {
            rect: IRect::new(0, 0, 20, 20),
            inside_clip: true
        }
    );
    assert!(batches[0].pipeline.is_none());
}
