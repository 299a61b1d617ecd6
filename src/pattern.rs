//! Built-in five-layer request for bring-up and smoke tests.

use crate::layering::format::PixelFormat;
use crate::request::model::{LayerDesc, LayeringRequest, PipeRequest};

/// Panel width the pattern is laid out for.
pub const PATTERN_WIDTH: u32 = 1080;
/// Panel height the pattern is laid out for.
pub const PATTERN_HEIGHT: u32 = 1920;

/// Primary-pipe request: two full-screen layers, a dialog, a status bar and a one-pixel
/// scroll indicator along the right edge.
pub fn test_pattern() -> LayeringRequest {
    let argb = PixelFormat::Argb8888.fourcc();
    let full = [0, 0, PATTERN_WIDTH, PATTERN_HEIGHT];
    let layers = vec![
        LayerDesc::new(full, argb),
        LayerDesc::new(full, argb),
        LayerDesc::new([269, 72, 657, 612], argb),
        LayerDesc::new([0, 0, PATTERN_WIDTH, 72], argb),
        LayerDesc::new([PATTERN_WIDTH - 1, 72, 1, 1704], argb),
    ];
    LayeringRequest {
        pipes: vec![PipeRequest::new(0, 1, layers)],
        ..LayeringRequest::default()
    }
}
