//! Capacity filter: make the pipe's physical layer count fit its overlay slots.

use smallvec::SmallVec;

use crate::diagnostics::{Diagnostics, report_internal};
use crate::layering::gles::Stage;
use crate::layering::grouping::is_valid_base;
use crate::layering::layer::{LayerCaps, PipeLayers};
use crate::layering::resize::ResizeScenario;
use crate::topology::PipeTopology;

/// Extended slots each overlay engine offers.
pub const EXT_SLOTS_PER_ENGINE: usize = 3;

/// Slots left after a rollback pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RollbackOutcome {
    pub(crate) available: usize,
    /// The pass would have gone below zero and was clamped.
    pub(crate) clamped: bool,
}

/// What the capacity check did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CapacityVerdict {
    /// Already fits.
    Fits,
    /// The first layer gave up its display resize; grouping must run again.
    ResizeReleased,
    /// The GLES window grew.
    RolledBack,
}

/// Result of [`check_capacity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CapacityOutcome {
    pub(crate) verdict: CapacityVerdict,
    pub(crate) phy_count: usize,
    pub(crate) limit: usize,
}

/// Grow the GLES window until at most `available` overlay slots are used.
///
/// Bottom-up keeps the lowest layers on hardware; top-down, run only when a window already
/// existed, hands the leftover slots to the layers above it.
pub(crate) fn rollback_to_gpu(
    pipe: &mut PipeLayers,
    available: usize,
    stage: Stage,
) -> RollbackOutcome {
    let had_window = !pipe.gles.is_empty();
    let mut avail = available as i64;
    let mut clamped = bottom_up(pipe, &mut avail, stage);
    if had_window {
        clamped |= top_down(pipe, &mut avail, stage);
    }
    RollbackOutcome {
        available: avail.max(0) as usize,
        clamped,
    }
}

fn bottom_up(pipe: &mut PipeLayers, avail: &mut i64, stage: Stage) -> bool {
    let n = pipe.len();
    for i in 0..n {
        if pipe.layers[i].is_ext() {
            continue;
        }
        *avail -= 1;
        if pipe.in_gles(i) {
            break;
        }
        if *avail <= 0 {
            *avail = 0;
            // the last layer fitting exactly needs no window
            if i + 1 < n {
                pipe.cover_gles(i, n - 1, stage);
            }
            break;
        }
    }
    clamp_negative(avail)
}

fn top_down(pipe: &mut PipeLayers, avail: &mut i64, stage: Stage) -> bool {
    let Some((head, tail)) = pipe.gles.bounds() else {
        return false;
    };
    let mut run_top: Option<usize> = None;
    for i in (tail + 1..pipe.len()).rev() {
        if pipe.layers[i].is_ext() {
            run_top.get_or_insert(i);
            continue;
        }
        if *avail <= 0 {
            *avail = 0;
            pipe.cover_gles(head, run_top.unwrap_or(i), stage);
            break;
        }
        run_top = None;
        *avail -= 1;
    }
    clamp_negative(avail)
}

fn clamp_negative(avail: &mut i64) -> bool {
    if *avail < 0 {
        *avail = 0;
        true
    } else {
        false
    }
}

/// Drop the display resize from the first layer when the platform took it as the single
/// scaling layer and the client can pre-scale it instead.
pub(crate) fn unset_resize_attr(pipe: &mut PipeLayers, scenario: &mut ResizeScenario) -> bool {
    let Some(first) = pipe.layers.first_mut() else {
        return false;
    };
    if *scenario == ResizeScenario::OneScaling
        && first.caps.contains(LayerCaps::MDP_RESIZE | LayerCaps::RPO_RESIZE)
    {
        first.caps.remove(LayerCaps::RPO_RESIZE);
        *scenario = ResizeScenario::None;
        return true;
    }
    false
}

/// Compare the physical layer count against the pipe's slots and roll back on overflow.
pub(crate) fn check_capacity(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    scenario: &mut ResizeScenario,
    allow_release: bool,
    diag: &mut Diagnostics,
) -> CapacityOutcome {
    let limit = topo.slot_limit();
    let phy_count = pipe.phy_layer_count();
    if phy_count <= limit {
        pipe.mark(Stage::CapacityChecked);
        return CapacityOutcome {
            verdict: CapacityVerdict::Fits,
            phy_count,
            limit,
        };
    }

    if allow_release && pipe.pipe.is_primary() && unset_resize_attr(pipe, scenario) {
        diag.resize_released += 1;
        tracing::debug!(pipe = %pipe.pipe, phy_count, limit, "released display resize on layer 0");
        return CapacityOutcome {
            verdict: CapacityVerdict::ResizeReleased,
            phy_count,
            limit,
        };
    }

    let outcome = rollback_to_gpu(pipe, limit, Stage::CapacityChecked);
    if outcome.clamped {
        diag.negative_capacity += 1;
        report_internal("negative overlay capacity");
    }
    tracing::debug!(
        pipe = %pipe.pipe,
        phy_count,
        limit,
        window = ?pipe.gles.bounds(),
        "rolled back to GPU"
    );
    CapacityOutcome {
        verdict: CapacityVerdict::RolledBack,
        phy_count: pipe.phy_layer_count(),
        limit,
    }
}

/// Capacity check followed by the per-engine extended-slot walk.
///
/// Whenever a run of extended layers would need more extended slots than its engine has, the
/// run is re-based and the check repeats.
pub(crate) fn fit_to_slots(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    scenario: &mut ResizeScenario,
    allow_release: bool,
    diag: &mut Diagnostics,
) -> CapacityOutcome {
    let mut outcome = check_capacity(pipe, topo, scenario, allow_release, diag);
    if outcome.verdict == CapacityVerdict::ResizeReleased {
        return outcome;
    }
    for _ in 0..pipe.len() {
        let Some(idx) = first_engine_overflow(pipe, topo) else {
            break;
        };
        rebase_run(pipe, idx);
        diag.ext_rebases += 1;
        tracing::debug!(pipe = %pipe.pipe, layer = idx, "re-based extended run");
        let again = check_capacity(pipe, topo, scenario, false, diag);
        if again.verdict == CapacityVerdict::RolledBack {
            outcome = again;
        } else {
            outcome.phy_count = again.phy_count;
        }
    }
    outcome
}

/// First extended layer that would overflow its engine's extended slots.
pub(crate) fn first_engine_overflow(pipe: &PipeLayers, topo: &PipeTopology) -> Option<usize> {
    let required = pipe.phy_layer_count();
    let mut ext_cnt = 0usize;
    let mut cur_phy = 0usize;
    for (i, layer) in pipe.layers.iter().enumerate() {
        if layer.is_ext() {
            ext_cnt += 1;
            if ext_cnt > EXT_SLOTS_PER_ENGINE {
                return Some(i);
            }
            continue;
        }
        if pipe.is_gles_body(i) {
            continue;
        }
        if cur_phy > 0
            && topo.engine_of_phy(required, cur_phy) != topo.engine_of_phy(required, cur_phy - 1)
        {
            ext_cnt = 0;
        }
        cur_phy += 1;
    }
    None
}

/// Make the first valid layer of the run at `idx` physical and attach the rest to it.
fn rebase_run(pipe: &mut PipeLayers, idx: usize) {
    let n = pipe.len();
    let end = (idx + EXT_SLOTS_PER_ENGINE).min(n);
    let mut run: SmallVec<[usize; EXT_SLOTS_PER_ENGINE]> = SmallVec::new();
    for j in idx..end {
        run.push(j);
        if j + 1 == n || !pipe.layers[j + 1].is_ext() {
            break;
        }
    }

    let mut new_base = None;
    for j in run {
        match new_base {
            None => {
                pipe.layers[j].ext = None;
                if is_valid_base(&pipe.layers[j], j) {
                    new_base = Some(j);
                }
            }
            Some(base) => pipe.layers[j].ext = Some(base),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layering/capacity.rs"]
mod tests;
