use crate::foundation::core::{FrameSeq, PipeId, Rect};
use crate::foundation::error::{LayeringError, LayeringResult};
use crate::layering::format::PixelFormat;
use crate::layering::gles::GlesWindow;
use crate::layering::layer::{DisplayMode, Frame, Layer, LayerCaps, PipeLayers};
use crate::request::model::{LayerDesc, LayeringRequest, PipeRequest};

fn rect(r: [u32; 4]) -> Rect {
    Rect::new(r[0], r[1], r[2], r[3])
}

/// Copy a validated request into the resolver's working model.
pub(crate) fn normalize_request(req: &LayeringRequest) -> LayeringResult<Frame> {
    let pipes = req
        .pipes
        .iter()
        .map(normalize_pipe)
        .collect::<LayeringResult<Vec<_>>>()?;
    Ok(Frame {
        sequence: FrameSeq(req.sequence),
        pipes,
        scenario: Default::default(),
    })
}

fn normalize_pipe(p: &PipeRequest) -> LayeringResult<PipeLayers> {
    let pipe = PipeId::new(p.pipe)?;
    let mode = DisplayMode::from_code(p.mode).ok_or_else(|| {
        LayeringError::invalid_argument(format!("{pipe}: unknown display mode {}", p.mode))
    })?;
    let layers = p
        .layers
        .iter()
        .map(normalize_layer)
        .collect::<LayeringResult<Vec<_>>>()?;
    Ok(PipeLayers::with_window(
        pipe,
        mode,
        layers,
        GlesWindow::from_wire(p.gles_head, p.gles_tail),
    ))
}

fn normalize_layer(d: &LayerDesc) -> LayeringResult<Layer> {
    let caps = LayerCaps::from_bits(d.caps).ok_or_else(|| {
        LayeringError::invalid_argument(format!("unknown capability bits {:#x}", d.caps))
    })?;
    let mut layer = Layer::new(rect(d.dst), PixelFormat::from_fourcc(d.format));
    layer.src = rect(d.src);
    layer.caps = caps.difference(LayerCaps::RESOLVER_SET);
    layer.compress = d.compress;
    layer.secure = d.secure;
    layer.buffer_id = d.buffer_id;
    Ok(layer)
}

#[cfg(test)]
#[path = "../../tests/unit/request/normalize.rs"]
mod tests;
