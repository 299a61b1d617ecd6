use super::*;
use crate::foundation::core::{PipeId, Rect};
use crate::layering::format::PixelFormat;
use crate::layering::gles::GlesWindow;
use crate::layering::layer::DisplayMode;

fn full(format: PixelFormat) -> Layer {
    Layer::new(Rect::new(0, 0, 1080, 2400), format)
}

fn frame_of(pipes: Vec<PipeLayers>) -> Frame {
    Frame {
        pipes,
        ..Frame::default()
    }
}

fn bounds() -> BoundTable {
    BoundTable(vec![400, 600, 800, 1000])
}

#[test]
fn weight_follows_bytes_per_pixel() {
    let cfg = LayeringConfig::default();
    assert_eq!(layer_weight(&full(PixelFormat::Argb8888), &cfg), 400);
    assert_eq!(layer_weight(&full(PixelFormat::Rgb888), &cfg), 300);
    assert_eq!(layer_weight(&full(PixelFormat::Rgb565), &cfg), 200);
    assert_eq!(layer_weight(&full(PixelFormat::Dim), &cfg), 0);
}

#[test]
fn offloaded_downscale_costs_its_source() {
    let cfg = LayeringConfig::default();
    let mut layer = full(PixelFormat::Argb8888);
    layer.src = Rect::new(0, 0, 2160, 4800);
    layer.caps.insert(LayerCaps::OFFLOAD_DIRECT_LINK);
    assert_eq!(offload_ratio(&layer), 400);
    assert_eq!(layer_weight(&layer, &cfg), 1600);

    // upscaling offload reads less, but is weighed as unscaled
    layer.src = Rect::new(0, 0, 540, 1200);
    assert_eq!(layer_weight(&layer, &cfg), 400);
}

#[test]
fn ratio_cache_clamps_and_evicts() {
    let mut cache = RatioCache::new(2);
    assert!(!cache.record(1, 500));
    assert!(cache.record(2, 2000));
    assert_eq!(cache.get(2), Some(RATIO_SCALE));
    assert!(!cache.record(3, 250));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(1), None);
    assert_eq!(cache.get(3), Some(250));
    // zero ratios are not stored
    cache.record(4, 0);
    assert_eq!(cache.get(4), None);
}

#[test]
fn ratios_up_to_the_glitch_threshold_are_kept() {
    let mut cache = RatioCache::new(4);
    assert!(!cache.record(7, 1010));
    assert_eq!(cache.get(7), Some(1010));
    assert!(!cache.record(8, 1024));
    assert_eq!(cache.get(8), Some(1024));
    assert!(cache.record(9, 1025));
    assert_eq!(cache.get(9), Some(RATIO_SCALE));
}

#[test]
fn monitor_weight_needs_compressed_unchanged_buffers() {
    let mut cache = RatioCache::new(4);
    cache.record(7, 250);
    let mut layer = full(PixelFormat::Argb8888);
    layer.buffer_id = 7;
    assert_eq!(monitor_weight(&layer, 400, &cache), None);
    layer.compress = true;
    assert_eq!(monitor_weight(&layer, 400, &cache), None);
    layer.caps.insert(LayerCaps::UNCHANGED);
    assert_eq!(monitor_weight(&layer, 400, &cache), Some(100));
    layer.buffer_id = 8;
    assert_eq!(monitor_weight(&layer, 400, &cache), None);
}

#[test]
fn window_counts_as_one_full_screen_target() {
    let layers = (0..4).map(|_| full(PixelFormat::Argb8888)).collect();
    let pipe = PipeLayers::with_window(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        layers,
        GlesWindow::new(2, 3),
    );
    let mut frame = frame_of(vec![pipe]);
    let mut arena = SweepArena::default();
    let out = sweep_frame(
        &mut frame,
        &bounds(),
        &LayeringConfig::default(),
        &mut arena,
        &RatioCache::default(),
    );
    assert_eq!(frame.pipes[0].weight, 1200);
    assert_eq!(out.weight, 1200);
    assert_eq!(out.level, 0);
    assert_eq!(out.monitor_weight, None);
}

#[test]
fn mirror_and_uncounted_pipes_do_not_add_bandwidth() {
    let layers = || (0..2).map(|_| full(PixelFormat::Argb8888)).collect::<Vec<_>>();
    let mirror = PipeLayers::new(PipeId::SECONDARY, DisplayMode::DecoupleMirror, layers());
    let third = PipeLayers::new(PipeId(2), DisplayMode::DirectLink, layers());
    let primary = PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, layers());
    let mut frame = frame_of(vec![primary, mirror, third]);
    let out = sweep_frame(
        &mut frame,
        &bounds(),
        &LayeringConfig::default(),
        &mut SweepArena::default(),
        &RatioCache::default(),
    );
    assert_eq!(out.weight, 800);
    assert_eq!(frame.pipes[1].weight, 0);
    assert_eq!(frame.pipes[2].weight, 0);
    // layers are weighed even when the pipe is not counted
    assert_eq!(frame.pipes[2].layers[0].weight, 400);
}

#[test]
fn monitor_pass_uses_cached_ratios() {
    let cfg = LayeringConfig {
        bw_monitor: true,
        ..LayeringConfig::default()
    };
    let mut cache = RatioCache::new(4);
    cache.record(42, 500);
    let mut cached = full(PixelFormat::Argb8888);
    cached.compress = true;
    cached.buffer_id = 42;
    cached.caps.insert(LayerCaps::UNCHANGED);
    let pipe = PipeLayers::new(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        vec![full(PixelFormat::Argb8888), cached],
    );
    let mut frame = frame_of(vec![pipe]);
    let out = sweep_frame(&mut frame, &bounds(), &cfg, &mut SweepArena::default(), &cache);
    assert_eq!(out.weight, 800);
    assert_eq!(out.monitor_weight, Some(600));
    assert!(frame.pipes[0].layers[1]
        .caps
        .contains(LayerCaps::UNCHANGED_RATIO_VALID));
    assert!(!frame.pipes[0].layers[0]
        .caps
        .contains(LayerCaps::UNCHANGED_RATIO_VALID));
}

#[test]
fn over_budget_frame_is_reduced_to_the_worst_tier() {
    let cfg = LayeringConfig::default();
    let layers = (0..12).map(|_| full(PixelFormat::Argb8888)).collect();
    let pipe = PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, layers);
    let mut frame = frame_of(vec![pipe]);
    let mut out = sweep_frame(
        &mut frame,
        &bounds(),
        &cfg,
        &mut SweepArena::default(),
        &RatioCache::default(),
    );
    assert_eq!(out.weight, 4800);
    assert_eq!(out.level, 4);

    let mut diag = Diagnostics::default();
    assert!(reduce_to_worst_tier(&mut frame, &bounds(), &cfg, &mut out, &mut diag));
    assert_eq!(frame.pipes[0].gles.bounds(), Some((9, 11)));
    assert_eq!(frame.pipes[0].phy_layer_count(), 10);
    assert_eq!(out.level, 3);
    assert_eq!(out.weight, 4000);
    assert_eq!(diag.tier_reductions, 1);
}

#[test]
fn reduction_reserves_a_layer_for_each_remaining_pipe() {
    let cfg = LayeringConfig::default();
    let primary = PipeLayers::new(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        (0..10).map(|_| full(PixelFormat::Argb8888)).collect(),
    );
    let secondary = PipeLayers::new(
        PipeId::SECONDARY,
        DisplayMode::DirectLink,
        (0..4).map(|_| full(PixelFormat::Argb8888)).collect(),
    );
    let mut frame = frame_of(vec![primary, secondary]);
    let mut out = sweep_frame(
        &mut frame,
        &bounds(),
        &cfg,
        &mut SweepArena::default(),
        &RatioCache::default(),
    );
    assert_eq!(out.level, 4);
    reduce_to_worst_tier(&mut frame, &bounds(), &cfg, &mut out, &mut Diagnostics::default());
    // secondary goes first with 10 - 1 slots and keeps all four layers
    assert!(frame.pipes[1].gles.is_empty());
    // primary gets the remaining 6
    assert_eq!(frame.pipes[0].gles.bounds(), Some((5, 9)));
    assert_eq!(frame.pipes[0].phy_layer_count(), 6);
}

#[test]
fn within_budget_frames_are_left_alone() {
    let cfg = LayeringConfig::default();
    let mut frame = frame_of(vec![PipeLayers::new(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        vec![full(PixelFormat::Argb8888)],
    )]);
    let mut out = BandwidthOutcome {
        level: 2,
        weight: 3000,
        monitor_weight: None,
    };
    assert!(!reduce_to_worst_tier(
        &mut frame,
        &bounds(),
        &cfg,
        &mut out,
        &mut Diagnostics::default()
    ));
    assert!(frame.pipes[0].gles.is_empty());
}

#[test]
fn light_frames_report_the_plain_sum_when_the_scan_is_not_forced() {
    let split = || {
        vec![
            Layer::new(Rect::new(0, 0, 1080, 1200), PixelFormat::Argb8888),
            Layer::new(Rect::new(0, 1200, 1080, 1200), PixelFormat::Argb8888),
        ]
    };
    let lazy = LayeringConfig {
        force_overlap_scan: false,
        ..LayeringConfig::default()
    };
    let sweep = |cfg: &LayeringConfig, pipes: Vec<PipeLayers>| {
        let mut frame = frame_of(pipes);
        let out = sweep_frame(
            &mut frame,
            &bounds(),
            cfg,
            &mut SweepArena::default(),
            &RatioCache::default(),
        );
        (out, frame)
    };
    let primary = || PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, split());

    // the two halves never overlap, so the sweep sees one layer at a time
    let (out, _) = sweep(&LayeringConfig::default(), vec![primary()]);
    assert_eq!(out.weight, 400);

    let (out, frame) = sweep(&lazy, vec![primary()]);
    assert_eq!(out.weight, 800);
    assert_eq!(frame.pipes[0].bwm_weight, 800);

    // an active secondary pipe forces the sweep
    let secondary = PipeLayers::new(
        PipeId::SECONDARY,
        DisplayMode::DirectLink,
        vec![full(PixelFormat::Rgb565)],
    );
    let (out, frame) = sweep(&lazy, vec![primary(), secondary]);
    assert_eq!(frame.pipes[0].weight, 400);
    assert_eq!(out.weight, 600);
}
