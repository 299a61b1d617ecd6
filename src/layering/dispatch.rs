//! Final plane assignment.

use crate::diagnostics::{Diagnostics, report_internal};
use crate::foundation::error::ErrorKind;
use crate::layering::capacity::EXT_SLOTS_PER_ENGINE;
use crate::layering::gles::Stage;
use crate::layering::layer::{LayerCaps, PipeLayers};
use crate::topology::PipeTopology;

/// Whether a layer owns its slot or rides in one of the engine's extended slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtSlot {
    /// Regular layer slot.
    Normal,
    /// Extended slot `n` of the engine.
    Ext(u8),
}

impl ExtSlot {
    /// Boundary encoding: `0` for a regular slot, `n + 1` for extended slot `n`.
    pub fn to_wire(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Ext(n) => u32::from(n) + 1,
        }
    }
}

/// Engine position of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct EngineSlot {
    /// Hardware component id of the overlay engine.
    pub engine_id: u32,
    /// Layer index inside the engine.
    pub sub_layer: u32,
}

/// Where a layer ends up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Placement {
    /// Plane id; layers inside the GLES window share the window's plane.
    pub plane: u32,
    /// Engine and sub-layer.
    pub slot: EngineSlot,
    /// Extended slot.
    pub ext_slot: ExtSlot,
}

enum Pass {
    Done(Option<EngineSlot>),
    Restart,
    Exhausted,
}

/// Assign planes on `pipe`.
///
/// `committed` is the decoupled-offload slot from the previous frame. Returns the slot of this
/// frame's decoupled-offload layer, which the caller commits for the next frame.
pub(crate) fn dispatch_pipe(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    committed: Option<EngineSlot>,
    diag: &mut Diagnostics,
) -> Option<EngineSlot> {
    // each restart grows the window, so one pass per layer is enough
    for _ in 0..=pipe.len() + 1 {
        match dispatch_pass(pipe, topo, committed, diag) {
            Pass::Done(slot) => {
                pipe.mark(Stage::Dispatched);
                return slot;
            }
            Pass::Restart => continue,
            Pass::Exhausted => {
                diag.slot_exhaustion += 1;
                report_internal("overlay slots exhausted during dispatch");
                let has_clear = pipe.layers.iter().any(|l| l.caps.is_clear());
                if pipe.gles.len() == pipe.len() && !has_clear {
                    break;
                }
                pipe.fall_back(ErrorKind::Internal, Stage::Dispatched);
            }
        }
    }
    for layer in &mut pipe.layers {
        layer.placement = None;
    }
    pipe.mark(Stage::Dispatched);
    None
}

fn revoke_offload(pipe: &mut PipeLayers, idx: usize) {
    let caps = &mut pipe.layers[idx].caps;
    caps.remove(LayerCaps::OFFLOAD_DECOUPLE | LayerCaps::OFFLOAD_DIRECT_LINK);
    caps.insert(LayerCaps::MDP_FALLBACK);
    pipe.needs_repaint = true;
}

fn dispatch_pass(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    committed: Option<EngineSlot>,
    diag: &mut Diagnostics,
) -> Pass {
    for layer in &mut pipe.layers {
        layer.placement = None;
    }

    // the clear layer takes the first slot of its own, below the window
    let clear = pipe.layers.iter().position(|l| l.caps.is_clear());
    let mut map = topo.layer_map(pipe.phy_layer_count() + usize::from(clear.is_some()));
    let mut bit: u16 = 0;
    let mut plane = 0u32;
    let mut ext_cnt = 0usize;
    let mut prev_engine: Option<usize> = None;
    let mut last: Option<Placement> = None;
    let mut offload_at: Option<(usize, usize, EngineSlot)> = None;
    let mut rpo_at: Option<(usize, usize)> = None;
    let mut decouple_slot = None;

    let order = clear
        .into_iter()
        .chain((0..pipe.len()).filter(|i| Some(*i) != clear));
    for i in order {
        if Some(i) != clear && pipe.is_gles_body(i) {
            pipe.layers[i].placement = last;
            continue;
        }

        let is_ext = pipe.layers[i].is_ext();
        if !is_ext {
            map &= !bit;
        }
        bit = map & map.wrapping_neg();
        if bit == 0 {
            return Pass::Exhausted;
        }
        let slot_idx = bit.trailing_zeros();
        let engine = topo.engine_of_slot(slot_idx);
        let Some(&engine_id) = topo.engines.get(engine) else {
            return Pass::Exhausted;
        };
        let slot = EngineSlot {
            engine_id,
            sub_layer: topo.sub_layer(slot_idx),
        };

        let ext_slot = if is_ext {
            if ext_cnt >= EXT_SLOTS_PER_ENGINE {
                return Pass::Exhausted;
            }
            ext_cnt += 1;
            ExtSlot::Ext((ext_cnt - 1) as u8)
        } else {
            if prev_engine != Some(engine) {
                ext_cnt = 0;
            }
            ExtSlot::Normal
        };

        let caps = pipe.layers[i].caps;
        if caps.is_offload() {
            offload_at = Some((i, engine, slot));
        } else if caps.is_rpo() {
            rpo_at = Some((i, engine));
        }
        if let (Some((oi, oe, oslot)), Some((ri, re))) = (offload_at, rpo_at)
            && oe == re
        {
            diag.offload_conflicts += 1;
            let keep_offload = i == ri || committed == Some(oslot);
            if keep_offload {
                tracing::debug!(pipe = %pipe.pipe, layer = ri, "offload and resize share an engine; resize dropped");
                pipe.layers[ri].caps.remove(LayerCaps::RPO_RESIZE);
                pipe.include_in_gles(ri, Stage::Dispatched);
                return Pass::Restart;
            }
            tracing::debug!(pipe = %pipe.pipe, layer = oi, "offload and resize share an engine; offload dropped");
            revoke_offload(pipe, oi);
            offload_at = None;
        }

        if pipe.layers[i].caps.is_offload_decouple()
            && let Some(prev) = committed
            && prev != slot
        {
            tracing::debug!(pipe = %pipe.pipe, layer = i, ?prev, ?slot, "decoupled offload moved");
            revoke_offload(pipe, i);
        }

        let placement = Placement {
            plane,
            slot,
            ext_slot,
        };
        pipe.layers[i].placement = Some(placement);
        if pipe.layers[i].caps.is_offload_decouple() {
            decouple_slot = Some(slot);
        }
        last = Some(placement);
        plane += 1;
        prev_engine = Some(engine);
    }
    Pass::Done(decouple_slot)
}

#[cfg(test)]
#[path = "../../tests/unit/layering/dispatch.rs"]
mod tests;
