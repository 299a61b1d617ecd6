//! Clear layer: a solid-color fill drawn by the overlay under the GPU target.

use crate::layering::gles::Stage;
use crate::layering::layer::{LayerCaps, PipeLayers};
use crate::topology::PipeTopology;

/// Promote the topmost clear-capable layer inside the window.
///
/// The rest of the pipe goes to the GPU. A promoted layer at either end of the window leaves it
/// and is shown as a regular overlay layer; one in the middle is flagged [`LayerCaps::CLEAR`] and
/// dispatched below the GPU target. A scaled layer without the MDP resize hint cannot be filled
/// and stays in the window. Returns the promoted layer.
pub(crate) fn promote_clear_layer(pipe: &mut PipeLayers, topo: &PipeTopology) -> Option<usize> {
    if pipe.len() <= 1 || topo.slot_limit() < 2 {
        return None;
    }
    let head = pipe.gles.head()?;
    let top = (head..pipe.len())
        .rev()
        .find(|i| pipe.layers[*i].caps.contains(LayerCaps::CLEAR_CAPABLE))?;
    if !pipe.in_gles(top) {
        return None;
    }

    pipe.cover_gles(0, pipe.len() - 1, Stage::Cleared);
    if !pipe.release_from_gles(top, Stage::Cleared) {
        pipe.layers[top].caps.insert(LayerCaps::CLEAR);
    }

    // covering the whole pipe already dropped every attachment and resize
    let layer = &mut pipe.layers[top];
    if layer.is_scaled() && !layer.caps.contains(LayerCaps::MDP_RESIZE) {
        layer.caps.remove(LayerCaps::CLEAR);
        pipe.include_in_gles(top, Stage::Cleared);
        tracing::debug!(pipe = %pipe.pipe, layer = top, "clear layer needs a resize; left on GPU");
        return None;
    }

    tracing::debug!(pipe = %pipe.pipe, layer = top, window = ?pipe.gles.bounds(), "clear layer promoted");
    Some(top)
}

#[cfg(test)]
#[path = "../../tests/unit/layering/clear.rs"]
mod tests;
