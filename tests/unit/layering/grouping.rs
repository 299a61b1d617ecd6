use super::*;
use crate::foundation::core::{PipeId, Rect};
use crate::layering::format::PixelFormat;
use crate::layering::gles::GlesWindow;
use crate::layering::layer::{DisplayMode, LayerCaps};
use crate::topology::StaticTopology;

fn bar(row: u32) -> Layer {
    Layer::new(Rect::new(0, row * 100, 1080, 100), PixelFormat::Argb8888)
}

fn background() -> Layer {
    Layer::new(Rect::new(0, 0, 1080, 2400), PixelFormat::Argb8888)
}

fn pipe_with(layers: Vec<Layer>) -> PipeLayers {
    PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, layers)
}

fn group(pipe: &mut PipeLayers) -> usize {
    let topo = StaticTopology::reference();
    let primary = topo.pipes[0].clone().unwrap();
    group_ext_layers(pipe, &primary, &LayeringConfig::default())
}

#[test]
fn disjoint_bars_chain_three_deep() {
    let mut layers = vec![background()];
    layers.extend((0..6).map(bar));
    let mut pipe = pipe_with(layers);
    let total = group(&mut pipe);

    let ext: Vec<_> = pipe.layers.iter().map(|l| l.ext).collect();
    assert_eq!(
        ext,
        vec![None, None, Some(1), Some(1), Some(1), None, Some(5)]
    );
    assert_eq!(total, 4);
}

#[test]
fn layer_zero_is_never_a_base() {
    let mut pipe = pipe_with(vec![bar(0), bar(1)]);
    group(&mut pipe);
    assert!(pipe.layers.iter().all(|l| l.ext.is_none()));
}

#[test]
fn overlapping_rows_break_the_chain() {
    let mut layers = vec![background(), bar(0), bar(1)];
    layers.push(Layer::new(Rect::new(0, 150, 200, 100), PixelFormat::Argb8888));
    let mut pipe = pipe_with(layers);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, Some(1));
    // collides with layer 2 which rides on layer 1
    assert_eq!(pipe.layers[3].ext, None);
}

#[test]
fn yuv_candidates_and_yuv_bases_are_rejected() {
    let mut video = bar(1);
    video.format = PixelFormat::Nv12;
    let mut pipe = pipe_with(vec![background(), bar(0), video, bar(2)]);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, None);
    // a YUV layer is treated as overlapping everything after it
    assert_eq!(pipe.layers[3].ext, None);
}

#[test]
fn dim_and_resized_layers_cannot_be_bases() {
    let mut dim = bar(0);
    dim.format = PixelFormat::Dim;
    let mut pipe = pipe_with(vec![background(), dim, bar(1)]);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, None);

    let mut scaled = bar(0);
    scaled.caps.insert(LayerCaps::RPO_RESIZE);
    let mut pipe = pipe_with(vec![background(), scaled, bar(1)]);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, None);
}

#[test]
fn offload_layers_neither_attach_nor_carry() {
    let mut offload = bar(1);
    offload.caps.insert(LayerCaps::OFFLOAD_DIRECT_LINK);
    let mut pipe = pipe_with(vec![background(), bar(0), offload, bar(2)]);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, None);
    assert_eq!(pipe.layers[3].ext, None);
}

#[test]
fn decoupled_offload_restarts_the_chain() {
    let mut offload = bar(0);
    offload.caps.insert(LayerCaps::OFFLOAD_DECOUPLE);
    let mut pipe = pipe_with(vec![background(), offload, bar(1), bar(2)]);
    group(&mut pipe);
    assert_eq!(pipe.layers[2].ext, None);
    assert_eq!(pipe.layers[3].ext, Some(2));
}

#[test]
fn window_neighbours_restart_the_chain() {
    let mut layers = vec![background()];
    layers.extend((0..5).map(bar));
    let mut pipe = PipeLayers::with_window(
        PipeId::PRIMARY,
        DisplayMode::DirectLink,
        layers,
        GlesWindow::new(2, 3),
    );
    group(&mut pipe);
    let ext: Vec<_> = pipe.layers.iter().map(|l| l.ext).collect();
    // layer 4 follows the window and becomes the next base
    assert_eq!(ext, vec![None, None, None, None, None, Some(4)]);
}

#[test]
fn quota_applies_only_to_crowded_pipes() {
    let cfg = LayeringConfig {
        ovl_layer_num: 8,
        max_ext_layers: 1,
        ..LayeringConfig::default()
    };
    let topo = StaticTopology::reference();
    let primary = topo.pipes[0].clone().unwrap();

    let mut layers = vec![background()];
    layers.extend((0..8).map(bar));
    let mut pipe = pipe_with(layers);
    // nine layers over an eight-layer engine: at most one attachment
    assert_eq!(group_ext_layers(&mut pipe, &primary, &cfg), 1);

    let mut layers = vec![background()];
    layers.extend((0..7).map(bar));
    let mut pipe = pipe_with(layers);
    assert!(group_ext_layers(&mut pipe, &primary, &cfg) > 1);
}
