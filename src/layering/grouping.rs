//! Extended-layer grouping: chain layers that share no rows onto a preceding physical layer so
//! they consume an engine's extended slot instead of a full one.

use crate::config::LayeringConfig;
use crate::layering::gles::Stage;
use crate::layering::layer::{Layer, PipeLayers};
use crate::topology::PipeTopology;

/// Layer at `idx` can carry extended layers.
pub(crate) fn is_valid_base(layer: &Layer, idx: usize) -> bool {
    idx != 0 && !layer.format.is_dim() && !layer.caps.is_rpo() && !layer.caps.is_offload()
}

/// YUV layers are always treated as overlapping their followers.
fn overlaps_y(lhs: &Layer, rhs: &Layer) -> bool {
    lhs.format.is_yuv() || lhs.dst.overlaps_y(rhs.dst)
}

/// Walk back through the current extended run to its physical layer and report whether
/// layer `idx` collides with any of them or the physical layer cannot be a base.
fn blocked_by_run(layers: &[Layer], idx: usize) -> bool {
    let candidate = &layers[idx];
    for j in (0..idx).rev() {
        let prev = &layers[j];
        if prev.is_ext() {
            if overlaps_y(prev, candidate) {
                return true;
            }
            continue;
        }
        return overlaps_y(prev, candidate) || !is_valid_base(prev, j);
    }
    true
}

/// Rebuild extended attachments for `pipe`. Returns the number of attached layers.
pub(crate) fn group_ext_layers(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    cfg: &LayeringConfig,
) -> usize {
    for layer in &mut pipe.layers {
        layer.ext = None;
    }

    let n = pipe.len();
    let quota = (cfg.ovl_layer_num as usize)
        .saturating_sub(topo.slot_limit())
        .min(cfg.max_ext_layers as usize);
    let quota_applies = n > cfg.ovl_layer_num as usize;
    let max_chain = cfg.max_chain_len as usize;

    let mut chain = 0usize;
    let mut base = 0usize;
    let mut total = 0usize;
    for i in 1..n {
        if pipe.layers[i - 1].caps.is_offload_decouple() {
            chain = 0;
            base = i;
            continue;
        }
        if pipe.in_gles(i) || pipe.in_gles(i - 1) {
            chain = 0;
            base = i;
            continue;
        }

        let layer = &pipe.layers[i];
        let eligible = !blocked_by_run(&pipe.layers, i)
            && !(quota_applies && total >= quota)
            && !layer.format.is_yuv()
            && !layer.caps.is_rpo()
            && !layer.caps.is_offload();

        if eligible && chain < max_chain {
            chain += 1;
            total += 1;
            pipe.layers[i].ext = Some(base);
        } else {
            chain = 0;
            base = i;
        }
    }

    pipe.mark(Stage::Grouped);
    total
}

#[cfg(test)]
#[path = "../../tests/unit/layering/grouping.rs"]
mod tests;
