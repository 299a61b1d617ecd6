use super::*;
use crate::foundation::core::Rect;
use crate::layering::dispatch::{EngineSlot, ExtSlot};
use crate::layering::format::PixelFormat;
use crate::layering::gles::Stage;
use crate::layering::layer::{DisplayMode, Layer};
use crate::request::model::{LayerDesc, PipeRequest};

fn resolved_frame() -> Frame {
    let mut layers = vec![Layer::new(Rect::new(0, 0, 100, 100), PixelFormat::Argb8888); 4];
    for (i, layer) in layers.iter_mut().enumerate() {
        layer.weight = 400;
        layer.placement = Some(Placement {
            plane: [0, 1, 1, 2][i],
            slot: EngineSlot {
                engine_id: 0x10,
                sub_layer: i.min(1) as u32,
            },
            ext_slot: if i == 3 { ExtSlot::Ext(0) } else { ExtSlot::Normal },
        });
    }
    layers[3].ext = Some(0);
    layers[0].caps = LayerCaps::MDP_FALLBACK;
    let mut pipe = PipeLayers::new(PipeId::PRIMARY, DisplayMode::DirectLink, layers);
    pipe.cover_gles(1, 2, Stage::CapacityChecked);
    pipe.weight = 1200;
    Frame {
        pipes: vec![pipe],
        ..Frame::default()
    }
}

#[test]
fn decision_mirrors_the_frame() {
    let d = FrameDecision::from_frame(&resolved_frame(), 2, 1200, None);
    assert_eq!(d.hrt_level, 2);
    let p = d.pipe(PipeId::PRIMARY).unwrap();
    assert_eq!(p.gles.bounds(), Some((1, 2)));
    assert_eq!(p.weight, 1200);
    assert_eq!(p.layers[3].ext_base, Some(0));
    assert_eq!(p.window_trace.len(), 2);
    assert!(d.pipe(PipeId::SECONDARY).is_none());
}

#[test]
fn write_back_fills_the_request_outputs() {
    let d = FrameDecision::from_frame(&resolved_frame(), 2, 1200, None);
    let layers = vec![LayerDesc::new([0, 0, 100, 100], PixelFormat::Argb8888.fourcc()); 4];
    let mut req = LayeringRequest {
        sequence: 0,
        pipes: vec![PipeRequest::new(0, 1, layers), PipeRequest::new(1, 1, vec![])],
        ..LayeringRequest::default()
    };
    d.write_back(&mut req);

    assert_eq!(req.hrt_level, 2);
    assert_eq!(req.hrt_weight, 1200);
    let p = &req.pipes[0];
    assert_eq!((p.gles_head, p.gles_tail), (1, 2));
    let ovl: Vec<_> = p.layers.iter().map(|l| l.ovl_id).collect();
    assert_eq!(ovl, vec![0, 1, 1, 2]);
    assert_eq!(p.layers[3].ext_slot, 1);
    assert_eq!(p.layers[3].ext_sel_layer, 0);
    assert_eq!(p.layers[0].ext_sel_layer, UNSET);
    assert_eq!(p.layers[0].caps, LayerCaps::MDP_FALLBACK.bits());
    assert_eq!(p.layers[2].weight, 400);
    assert_eq!((req.pipes[1].gles_head, req.pipes[1].gles_tail), (UNSET, UNSET));
}

#[test]
fn decision_serializes_windows_as_pairs() {
    let d = FrameDecision::from_frame(&resolved_frame(), 0, 0, Some(0));
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["pipes"][0]["gles"], serde_json::json!([1, 2]));
    assert_eq!(json["pipes"][0]["window_trace"][1]["stage"], "capacity_checked");
    assert_eq!(json["bwm_weight"], 0);
}
