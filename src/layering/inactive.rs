//! Idle-layer caching: idle layers are folded into the GPU window.

use crate::layering::gles::Stage;
use crate::layering::layer::{LayerCaps, PipeLayers};

/// Hand idle layers to the GPU so it can reuse its cached composition.
///
/// Applies only when the pipe has no window yet and at least two layers are idle; the window
/// becomes the hull of the idle layers.
pub(crate) fn cache_inactive(pipe: &mut PipeLayers) -> bool {
    if !pipe.gles.is_empty() {
        return false;
    }
    let mut idle = pipe
        .layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.caps.contains(LayerCaps::INACTIVE))
        .map(|(i, _)| i);
    let Some(first) = idle.next() else {
        return false;
    };
    let Some(last) = idle.last() else {
        return false;
    };
    pipe.cover_gles(first, last, Stage::Resized);
    tracing::debug!(pipe = %pipe.pipe, first, last, "idle layers cached on GPU");
    true
}

#[cfg(test)]
#[path = "../../tests/unit/layering/inactive.rs"]
mod tests;
