// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rect fills and strokes, and what they degrade into.

use crate::util::{aliased, blue, Harness};
use vello_dispatch::kurbo::{Affine, Join, Rect, Stroke};
use vello_dispatch::peniko::color::palette::css::BLUE;
use vello_dispatch::{
    BatchKind, Clip, DrawColor, IRect, LocalCoords, Paint, PathRendererKind, RectJoin, Style,
};

fn stroke(width: f64, join: Join) -> Style {
    Style::stroke(Stroke::new(width).with_join(join))
}

#[test]
fn rect_covering_the_target_becomes_a_clear() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        Rect::new(-10.0, -10.0, 200.0, 200.0),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::Clear {
            rect: IRect::new(0, 0, 100, 100)
        }
    );
    assert_eq!(batches[0].batch.color(), DrawColor::from(BLUE));
}

#[test]
fn translucent_cover_is_cropped_instead() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &Paint::new(BLUE.with_alpha(0.5)),
        Affine::IDENTITY,
        Rect::new(-10.0, -10.0, 200.0, 200.0),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::FillRect { aa, rect, .. } = batches[0].batch.kind() else {
        panic!("expected a rect fill, got {:?}", batches[0].batch.kind());
    };
    assert!(aa);
    assert_eq!(*rect, Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn zero_height_miter_stroke_is_a_vertical_outset() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    let clip = Clip::wide_open();

    dc.draw_rect(
        &clip,
        &blue(),
        Affine::IDENTITY,
        Rect::new(10.0, 20.0, 50.0, 20.0),
        &stroke(4.0, Join::Miter),
    );
    dc.draw_rect(
        &clip,
        &blue(),
        Affine::IDENTITY,
        Rect::new(10.0, 18.0, 50.0, 22.0),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1]);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::FillRect { rect, .. } if *rect == Rect::new(10.0, 18.0, 50.0, 22.0)
    ));
}

#[test]
fn zero_width_bevel_stroke_grows_horizontally() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &aliased(blue()),
        Affine::IDENTITY,
        Rect::new(10.0, 10.0, 10.0, 50.0),
        &stroke(4.0, Join::Bevel),
    );

    let batches = harness.batches();
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::FillRect {
            aa: false,
            view: Affine::IDENTITY,
            rect: Rect::new(8.0, 10.0, 12.0, 50.0),
            local: LocalCoords::None,
        }
    );
}

#[test]
fn round_stroke_of_a_line_is_a_rounded_rect() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        Rect::new(10.0, 20.0, 50.0, 20.0),
        &stroke(4.0, Join::Round),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::RRect { rrect, .. } = batches[0].batch.kind() else {
        panic!("expected a rounded rect, got {:?}", batches[0].batch.kind());
    };
    assert_eq!(rrect.rect(), Rect::new(8.0, 18.0, 52.0, 22.0));
}

#[test]
fn antialiased_mitered_stroke() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &blue(),
        Affine::IDENTITY,
        Rect::new(10.0, 10.0, 50.0, 50.0),
        &stroke(2.0, Join::Miter),
    );

    let batches = harness.batches();
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::StrokeRect {
            aa: true,
            view: Affine::IDENTITY,
            rect: Rect::new(10.0, 10.0, 50.0, 50.0),
            width: 2.0,
            join: RectJoin::Miter,
        }
    );
    assert_eq!(batches[0].batch.bounds(), Rect::new(8.5, 8.5, 51.5, 51.5));
}

#[test]
fn aliased_hairlines_snap_to_pixel_centers() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &aliased(blue()),
        Affine::IDENTITY,
        Rect::new(10.0, 10.0, 50.0, 50.0),
        &Style::hairline(),
    );

    let batches = harness.batches();
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::StrokeRect { aa: false, width, .. } if *width == 0.0
    ));
    assert!(batches[0].pipeline.as_ref().unwrap().snap_to_pixel_centers());
}

#[test]
fn skewed_antialiased_fill_uses_a_path_renderer() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &blue(),
        Affine::skew(0.5, 0.0),
        Rect::new(10.0, 10.0, 50.0, 50.0),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::Path {
            renderer: PathRendererKind::AaConvex,
            ..
        }
    ));
}

#[test]
fn rotated_antialiased_fill_stays_a_rect() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.draw_rect(
        &Clip::wide_open(),
        &blue(),
        Affine::translate((50.0, 50.0)) * Affine::rotate(0.3),
        Rect::new(-10.0, -10.0, 10.0, 10.0),
        &Style::fill(),
    );

    let batches = harness.batches();
    assert!(matches!(
        batches[0].batch.kind(),
        BatchKind::FillRect { aa: true, .. }
    ));
}

#[test]
fn rect_to_rect_crops_local_coordinates() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    dc.fill_rect_to_rect(
        &Clip::from_rect(Rect::new(0.0, 0.0, 50.0, 100.0)),
        &aliased(blue()),
        Affine::IDENTITY,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Rect::new(0.0, 0.0, 1.0, 1.0),
    );
    dc.fill_rect_with_local_matrix(
        &Clip::wide_open(),
        &aliased(blue()),
        Affine::IDENTITY,
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Affine::scale(0.1),
    );

    let batches = harness.batches();
    assert_eq!(
        batches[0].batch.kind(),
        &BatchKind::FillRect {
            aa: false,
            view: Affine::IDENTITY,
            rect: Rect::new(0.0, 0.0, 50.0, 100.0),
            local: LocalCoords::Rect(Rect::new(0.0, 0.0, 0.5, 1.0)),
        }
    );
    assert!(matches!(
        batches[1].batch.kind(),
        BatchKind::FillRect { local: LocalCoords::Matrix(m), .. } if *m == Affine::scale(0.1)
    ));
}

#[test]
fn draw_paint_covers_the_target() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(64, 32);

    dc.draw_paint(&Clip::wide_open(), &Paint::new(BLUE.with_alpha(0.5)), Affine::scale(2.0));
    // Singular transforms draw nothing.
    dc.draw_paint(&Clip::wide_open(), &blue(), Affine::scale(0.0));

    let batches = harness.batches();
    assert_eq!(batches.len(), 1);
    let BatchKind::FillRect { aa, rect, .. } = batches[0].batch.kind() else {
        panic!("expected a rect fill, got {:?}", batches[0].batch.kind());
    };
    assert!(!aa);
    assert_eq!(*rect, Rect::new(0.0, 0.0, 32.0, 16.0));
    assert_eq!(batches[0].batch.bounds(), Rect::new(0.0, 0.0, 64.0, 32.0));
}
