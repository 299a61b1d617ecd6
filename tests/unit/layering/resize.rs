use super::*;
use crate::foundation::core::PipeId;
use crate::layering::format::PixelFormat;
use crate::layering::layer::DisplayMode;
use crate::topology::{PanelSize, StaticTopology};

fn scaled(src: (u32, u32), dst: Rect) -> Layer {
    let mut layer = Layer::new(dst, PixelFormat::Argb8888);
    layer.src = Rect::new(0, 0, src.0, src.1);
    layer
}

fn primary_topo() -> PipeTopology {
    StaticTopology::reference().pipes[0].clone().unwrap()
}

fn dual_topo() -> PipeTopology {
    PipeTopology {
        dual_pipe: true,
        panel: PanelSize {
            width: 1080,
            height: 2400,
        },
        ..primary_topo()
    }
}

fn primary(layers: Vec<Layer>) -> PipeLayers {
    PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, layers)
}

#[test]
fn downscale_is_never_rpo_and_falls_back() {
    let mut pipe = primary(vec![scaled((10, 10), Rect::new(0, 0, 8, 8))]);
    let scenario = resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert_eq!(scenario, ResizeScenario::None);
    assert!(!pipe.layers[0].caps.is_rpo());
    assert_eq!(pipe.gles.bounds(), Some((0, 0)));
}

#[test]
fn upscale_within_limits_is_selected() {
    let mut pipe = primary(vec![scaled((540, 1200), Rect::new(0, 0, 1080, 2400))]);
    let scenario = resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert_eq!(scenario, ResizeScenario::OneScaling);
    assert!(pipe.layers[0].caps.is_rpo());
    assert!(pipe.gles.is_empty());
}

#[test]
fn near_unity_growth_is_not_worth_the_resizer() {
    let mut pipe = primary(vec![scaled((1070, 2400), Rect::new(0, 0, 1080, 2400))]);
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(!pipe.layers[0].caps.is_rpo());
    assert_eq!(pipe.gles.bounds(), Some((0, 0)));
}

#[test]
fn tiny_sources_are_skipped() {
    let mut pipe = primary(vec![scaled((4, 100), Rect::new(0, 0, 400, 400))]);
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(!pipe.layers[0].caps.is_rpo());
}

#[test]
fn scale_budget_caps_selection() {
    let mut pipe = primary(vec![
        scaled((270, 600), Rect::new(0, 0, 540, 1200)),
        scaled((270, 600), Rect::new(540, 1200, 540, 1200)),
    ]);
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(pipe.layers[0].caps.is_rpo());
    assert!(!pipe.layers[1].caps.is_rpo());
    assert_eq!(pipe.gles.bounds(), Some((1, 1)));
}

#[test]
fn mdp_resize_layers_keep_their_own_path() {
    let mut layer = scaled((540, 1200), Rect::new(0, 0, 1080, 2400));
    layer.caps.insert(LayerCaps::MDP_RESIZE);
    let mut pipe = primary(vec![layer]);
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(!pipe.layers[0].caps.is_rpo());
    assert!(pipe.gles.is_empty());
}

#[test]
fn offloaded_layers_are_not_resized_or_rolled_back() {
    let mut layer = scaled((540, 1200), Rect::new(0, 0, 1080, 2400));
    layer.caps.insert(LayerCaps::OFFLOAD_DIRECT_LINK);
    let mut pipe = primary(vec![layer]);
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(!pipe.layers[0].caps.is_rpo());
    assert!(pipe.gles.is_empty());
}

#[test]
fn layers_at_or_above_the_window_head_are_not_considered() {
    let mut pipe = PipeLayers::with_window(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        vec![
            Layer::new(Rect::new(0, 0, 1080, 2400), PixelFormat::Argb8888),
            scaled((540, 1200), Rect::new(0, 0, 1080, 2400)),
        ],
        crate::layering::gles::GlesWindow::new(1, 1),
    );
    resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert!(!pipe.layers[1].caps.is_rpo());
}

#[test]
fn secondary_pipes_never_resize() {
    let mut pipe = PipeLayers::new(
        PipeId::SECONDARY,
        DisplayMode::DirectLink,
        vec![scaled((960, 540), Rect::new(0, 0, 1920, 1080))],
    );
    let scenario = resize_pipe(&mut pipe, &primary_topo(), &LayeringConfig::default());
    assert_eq!(scenario, ResizeScenario::None);
    assert_eq!(pipe.gles.bounds(), Some((0, 0)));
}

#[test]
fn centered_upscale_splits_into_two_upscaling_tiles() {
    let tiles = split_tiles(200, 340, 400, 1080, TileOverhead::default()).unwrap();
    assert_eq!(tiles[0].step, 16343);
    assert_eq!(tiles[0].out_x, 340);
    assert_eq!((tiles[0].in_len, tiles[0].out_len), (104, 200));
    assert_eq!((tiles[0].int_offset, tiles[0].sub_offset), (-1, 32756));
    assert_eq!((tiles[1].in_len, tiles[1].out_len), (104, 200));
    assert_eq!((tiles[1].int_offset, tiles[1].sub_offset), (3, 24580));
    for tile in tiles {
        assert!(tile.in_len > 0);
        assert!(tile.in_len <= tile.out_len);
    }
}

#[test]
fn widening_the_source_flips_the_split_to_rejected() {
    assert!(split_tiles(390, 340, 400, 1080, TileOverhead::default()).is_ok());
    assert!(matches!(
        split_tiles(398, 340, 400, 1080, TileOverhead::default()),
        Err(TileSplitError::RightTile { .. })
    ));
    assert!(split_tiles(400, 340, 400, 1080, TileOverhead::default()).is_err());
}

#[test]
fn degenerate_widths_are_rejected() {
    assert!(matches!(
        split_tiles(1, 0, 400, 1080, TileOverhead::default()),
        Err(TileSplitError::Degenerate { .. })
    ));
}

#[test]
fn dual_pipe_requires_a_midline_crossing() {
    let cfg = LayeringConfig::default();
    let mut left_only = primary(vec![scaled((200, 200), Rect::new(0, 0, 400, 400))]);
    select_rpo(&mut left_only, &dual_topo(), &cfg);
    assert!(!left_only.layers[0].caps.is_rpo());

    let mut centered = primary(vec![scaled((200, 200), Rect::new(340, 0, 400, 400))]);
    assert_eq!(select_rpo(&mut centered, &dual_topo(), &cfg), 1);
    assert!(centered.layers[0].caps.is_rpo());
}
