// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw target lifetime: flushing, abandoning, copies and implicit flushes.

use crate::util::{aliased, blue, Harness};
use vello_dispatch::kurbo::{Affine, Rect};
use vello_dispatch::peniko::color::palette::css::RED;
use vello_dispatch::{
    BatchKind, Caps, Clip, ContextOptions, Error, IRect, PixelConfig, RenderTargetDesc, Style,
    SurfaceProps,
};

fn fill(dc: &mut vello_dispatch::DrawContext, rect: Rect) {
    dc.draw_rect(
        &Clip::wide_open(),
        &aliased(blue()),
        Affine::IDENTITY,
        rect,
        &Style::fill(),
    );
}

#[test]
fn draws_after_a_flush_start_a_new_draw_target() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);

    fill(&mut dc, Rect::new(0.0, 0.0, 10.0, 10.0));
    let first = harness.flush();
    fill(&mut dc, Rect::new(0.0, 0.0, 20.0, 20.0));
    fill(&mut dc, Rect::new(0.0, 0.0, 30.0, 30.0));
    let second = harness.flush();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].batches.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].batches.len(), 2);
    assert_eq!(first[0].render_target.id(), second[0].render_target.id());
    assert!(harness.flush().is_empty());
}

#[test]
fn draw_contexts_on_one_target_share_its_draw_target() {
    let harness = Harness::new();
    let target = harness.target(RenderTargetDesc::new(100, 100));
    let mut a = harness
        .context
        .make_draw_context(target.clone(), SurfaceProps::default());
    fill(&mut a, Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut b = harness
        .context
        .make_draw_context(target, SurfaceProps::default());
    fill(&mut b, Rect::new(0.0, 0.0, 20.0, 20.0));
    fill(&mut a, Rect::new(0.0, 0.0, 30.0, 30.0));

    let submissions = harness.flush();
    assert_eq!(submissions.len(), 1);
    let bounds: Vec<_> = submissions[0]
        .batches
        .iter()
        .map(|b| b.batch.bounds().x1)
        .collect();
    assert_eq!(bounds, [10.0, 20.0, 30.0]);
}

#[test]
fn abandoned_contexts_ignore_everything() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    fill(&mut dc, Rect::new(0.0, 0.0, 10.0, 10.0));

    harness.context.abandon();
    assert!(harness.context.was_abandoned());
    fill(&mut dc, Rect::new(0.0, 0.0, 20.0, 20.0));
    dc.clear(None, RED, true);
    assert!(!dc.draw_and_stencil_rect(
        &Clip::wide_open(),
        None,
        vello_dispatch::RegionOp::Replace,
        false,
        false,
        Affine::IDENTITY,
        Rect::new(0.0, 0.0, 10.0, 10.0),
    ));

    assert!(harness.flush().is_empty());
    assert_eq!(harness.context.pending_batches(), 0);
    assert!(matches!(
        harness
            .context
            .create_render_target(RenderTargetDesc::new(10, 10)),
        Err(Error::Abandoned)
    ));
}

#[test]
fn implicit_flush_after_enough_batches() {
    let options = ContextOptions {
        max_pending_batches: 2,
        ..ContextOptions::default()
    };
    let harness = Harness::with(Caps::default(), options);
    let mut dc = harness.draw_context(100, 100);

    fill(&mut dc, Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(harness.sink.len(), 0);
    assert_eq!(harness.context.pending_batches(), 1);
    fill(&mut dc, Rect::new(0.0, 0.0, 20.0, 20.0));
    assert_eq!(harness.sink.len(), 1);
    assert_eq!(harness.context.pending_batches(), 0);

    fill(&mut dc, Rect::new(0.0, 0.0, 30.0, 30.0));
    assert_eq!(harness.context.pending_batches(), 1);
}

#[test]
fn copies_order_the_source_before_the_destination() {
    let harness = Harness::new();
    let src = harness.target(RenderTargetDesc::new(50, 50));
    let dst = harness.target(RenderTargetDesc::new(100, 100));
    let mut src_dc = harness
        .context
        .make_draw_context(src.clone(), SurfaceProps::default());
    let mut dst_dc = harness
        .context
        .make_draw_context(dst.clone(), SurfaceProps::default());

    fill(&mut src_dc, Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(dst_dc.copy_surface(&src, IRect::new(-10, 0, 20, 20), (5, 5)));
    // The source's earlier draw target is closed, so this lands after the copy.
    fill(&mut src_dc, Rect::new(0.0, 0.0, 20.0, 20.0));
    assert!(!dst_dc.copy_surface(&src, IRect::new(60, 60, 70, 70), (0, 0)));

    let submissions = harness.flush();
    let order: Vec<_> = submissions.iter().map(|s| s.render_target.id()).collect();
    assert_eq!(order, [src.id(), dst.id(), src.id()]);
    assert_eq!(submissions[1].dependencies, [src.id()]);
    assert_eq!(
        submissions[1].batches[0].batch.kind(),
        &BatchKind::CopySurface {
            src: src.id(),
            src_rect: IRect::new(0, 0, 20, 20),
            dst_point: (15, 5),
        }
    );
}

#[test]
fn render_targets_are_checked_against_the_caps() {
    let caps = Caps {
        renderable_configs: vec![PixelConfig::Rgba8],
        ..Caps::default()
    };
    let harness = Harness::with(caps, ContextOptions::default());

    let too_big = RenderTargetDesc::new(10_000, 10);
    assert!(matches!(
        harness.context.create_render_target(too_big),
        Err(Error::UnsupportedRenderTarget { reason: "size", .. })
    ));
    let too_many_samples = RenderTargetDesc::new(10, 10).with_samples(8);
    assert!(harness
        .context
        .create_render_target(too_many_samples)
        .is_err());
    let alpha = RenderTargetDesc {
        config: PixelConfig::Alpha8,
        ..RenderTargetDesc::new(10, 10)
    };
    assert!(harness.context.create_render_target(alpha).is_err());

    let first = harness.target(RenderTargetDesc::new(10, 10));
    let second = harness.target(RenderTargetDesc::new(10, 10));
    assert_ne!(first.id(), second.id());
}

#[test]
fn flushing_releases_unused_render_targets() {
    let harness = Harness::new();
    let target = harness.target(RenderTargetDesc::new(10, 10));
    assert_eq!(harness.context.render_target_count(), 1);
    harness.context.flush();
    assert_eq!(harness.context.render_target_count(), 1);
    drop(target);
    harness.context.flush();
    assert_eq!(harness.context.render_target_count(), 0);
}

#[test]
fn matching_batches_are_offered_for_combining() {
    let harness = Harness::new();
    let mut dc = harness.draw_context(100, 100);
    fill(&mut dc, Rect::new(0.0, 0.0, 10.0, 10.0));
    fill(&mut dc, Rect::new(20.0, 0.0, 30.0, 10.0));

    let submissions = harness.flush();
    assert_eq!(submissions[0].combine_candidate(1), Some(0));
    assert_eq!(submissions[0].combine_candidate(0), None);
    assert_eq!(submissions[0].combine_candidate(5), None);
}
