//! Bandwidth weights and the frame's HRT tier.

use std::cmp::Reverse;
use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::config::LayeringConfig;
use crate::diagnostics::{Diagnostics, report_internal};
use crate::foundation::core::{MAX_PIPES, PipeId};
use crate::layering::capacity::rollback_to_gpu;
use crate::layering::gles::Stage;
use crate::layering::layer::{Frame, Layer, LayerCaps, PipeLayers};
use crate::layering::sweep::{SweepArena, SweepItem};
use crate::topology::BoundTable;

/// Compression ratios are expressed in thousandths.
pub const RATIO_SCALE: u32 = 1000;
/// Ratios above this are monitor glitches and are replaced by [`RATIO_SCALE`]; values up to it
/// are stored as reported.
const RATIO_GLITCH: u32 = 1024;

/// Default weight of one layer.
///
/// Offloaded layers are weighed at their pre-scaled size, since the offload engine reads the
/// full source when it shrinks.
pub(crate) fn layer_weight(layer: &Layer, cfg: &LayeringConfig) -> u32 {
    let mut weight = u64::from(cfg.unit_weight) * u64::from(layer.format.bytes_per_pixel());
    if layer.caps.is_offload() {
        let ratio = offload_ratio(layer);
        if ratio != 100 {
            weight = weight * ratio / 100;
        }
    }
    u32::try_from(weight).unwrap_or(u32::MAX)
}

/// Downscale factor of an offloaded layer in percent, multiplied across both axes.
pub(crate) fn offload_ratio(layer: &Layer) -> u64 {
    let mut ratio = 100u64;
    if layer.dst.w > 0 && layer.src.w > layer.dst.w {
        ratio = ratio * u64::from(layer.src.w) / u64::from(layer.dst.w);
    }
    if layer.dst.h > 0 && layer.src.h > layer.dst.h {
        ratio = ratio * u64::from(layer.src.h) / u64::from(layer.dst.h);
    }
    ratio
}

/// Peak compression ratio per unchanged buffer, as reported by the bandwidth monitor.
///
/// Bounded; the oldest buffer is evicted first.
#[derive(Clone, Debug, Default)]
pub struct RatioCache {
    entries: VecDeque<(u64, u32)>,
    capacity: usize,
}

impl RatioCache {
    /// Empty cache holding at most `capacity` buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Store the ratio for `buffer_id`. Returns `true` when the value had to be clamped.
    pub fn record(&mut self, buffer_id: u64, peak_ratio: u32) -> bool {
        if peak_ratio == 0 || self.capacity == 0 {
            return false;
        }
        let clamped = peak_ratio > RATIO_GLITCH;
        let ratio = if clamped { RATIO_SCALE } else { peak_ratio };
        if let Some(entry) = self.entries.iter_mut().find(|(id, _)| *id == buffer_id) {
            entry.1 = ratio;
        } else {
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back((buffer_id, ratio));
        }
        clamped
    }

    /// Cached ratio for `buffer_id`.
    pub fn get(&self, buffer_id: u64) -> Option<u32> {
        self.entries
            .iter()
            .find(|(id, _)| *id == buffer_id)
            .map(|(_, r)| *r)
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bandwidth-monitor weight: unchanged compressed buffers only cost their compressed share.
pub(crate) fn monitor_weight(layer: &Layer, weight: u32, cache: &RatioCache) -> Option<u32> {
    if !layer.compress || !layer.caps.contains(LayerCaps::UNCHANGED) {
        return None;
    }
    let ratio = cache.get(layer.buffer_id)?;
    Some((u64::from(weight) * u64::from(ratio) / u64::from(RATIO_SCALE)) as u32)
}

/// Peak overlap of the pipe's hardware layers plus one full-screen GLES target.
fn pipe_overlap(
    arena: &mut SweepArena,
    pipe: &PipeLayers,
    weight_of: impl Fn(&Layer) -> u32,
    lower_bound: u32,
    gles_weight: u32,
) -> u32 {
    let items: SmallVec<[SweepItem; 16]> = pipe
        .layers
        .iter()
        .enumerate()
        .filter(|(i, _)| !pipe.in_gles(*i))
        .map(|(_, l)| SweepItem {
            rect: l.dst,
            weight: weight_of(l),
        })
        .collect();
    let mut overlap = arena.max_overlap(&items, lower_bound);
    if !pipe.gles.is_empty() {
        overlap = overlap.saturating_add(gles_weight);
    }
    overlap
}

/// Sum of the pipe's hardware layer weights plus the GLES target, with no overlap sweep.
fn plain_sum(pipe: &PipeLayers, weight_of: impl Fn(&Layer) -> u32, gles_weight: u32) -> u32 {
    let mut sum = pipe
        .layers
        .iter()
        .enumerate()
        .filter(|(i, _)| !pipe.in_gles(*i))
        .fold(0u32, |acc, (_, l)| acc.saturating_add(weight_of(l)));
    if !pipe.gles.is_empty() {
        sum = sum.saturating_add(gles_weight);
    }
    sum
}

/// Frame tier and weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BandwidthOutcome {
    /// Tier index; equal to the number of tiers when the frame exceeds all of them.
    pub(crate) level: u32,
    /// Sum of default overlap weights.
    pub(crate) weight: u32,
    /// Sum of bandwidth-monitor overlap weights when the monitor is enabled.
    pub(crate) monitor_weight: Option<u32>,
}

/// Weigh every layer and sweep each bandwidth-limited pipe.
///
/// The default and monitor weights are swept as two separate passes over the same arena.
/// Unless `force_overlap_scan` is set, a pipe whose plain sum is within the first tier skips the
/// sweep while no secondary pipe is active.
pub(crate) fn sweep_frame(
    frame: &mut Frame,
    bounds: &BoundTable,
    cfg: &LayeringConfig,
    arena: &mut SweepArena,
    cache: &RatioCache,
) -> BandwidthOutcome {
    let bpp = cfg.bound_bpp;
    let lower = bounds.lower_bound(bpp);
    let gles_weight = cfg.gles_weight();
    let mut sum = 0u32;
    let mut monitor_sum = 0u32;
    let has_secondary = frame
        .pipes
        .iter()
        .any(|p| p.pipe == PipeId::SECONDARY && p.has_hrt_limit());

    for pipe in &mut frame.pipes {
        let use_monitor = cfg.bw_monitor && pipe.pipe.is_primary();
        for layer in &mut pipe.layers {
            layer.weight = layer_weight(layer, cfg);
            let cached = if use_monitor {
                monitor_weight(layer, layer.weight, cache)
            } else {
                None
            };
            layer.caps.set(LayerCaps::UNCHANGED_RATIO_VALID, cached.is_some());
            layer.bwm_weight = cached.unwrap_or(layer.weight);
        }

        if !pipe.has_hrt_limit() || !cfg.counts_bandwidth(pipe.pipe.index()) {
            pipe.weight = 0;
            pipe.bwm_weight = 0;
            pipe.mark(Stage::BandwidthSwept);
            continue;
        }

        let plain = plain_sum(pipe, |l| l.weight, gles_weight);
        if cfg.force_overlap_scan || plain > lower || has_secondary {
            pipe.weight = pipe_overlap(arena, pipe, |l| l.weight, lower, gles_weight);
            pipe.bwm_weight = if use_monitor {
                pipe_overlap(arena, pipe, |l| l.bwm_weight, lower, gles_weight)
            } else {
                pipe.weight
            };
        } else {
            pipe.weight = plain;
            pipe.bwm_weight = if use_monitor {
                plain_sum(pipe, |l| l.bwm_weight, gles_weight)
            } else {
                plain
            };
        }
        sum = sum.saturating_add(pipe.weight);
        monitor_sum = monitor_sum.saturating_add(pipe.bwm_weight);
        pipe.mark(Stage::BandwidthSwept);
        tracing::debug!(pipe = %pipe.pipe, weight = pipe.weight, bwm = pipe.bwm_weight, "pipe swept");
    }

    let tier_sum = if cfg.bw_monitor { monitor_sum } else { sum };
    BandwidthOutcome {
        level: bounds.level_of(tier_sum, bpp),
        weight: sum,
        monitor_weight: cfg.bw_monitor.then_some(monitor_sum),
    }
}

/// Second capacity pass when the frame exceeds the worst tier.
///
/// The worst bound, read as a layer budget, is shared across the bandwidth-limited pipes from
/// the last pipe to the first; each pipe leaves one layer for every pipe still to come.
/// Returns `true` when a reduction happened.
pub(crate) fn reduce_to_worst_tier(
    frame: &mut Frame,
    bounds: &BoundTable,
    cfg: &LayeringConfig,
    outcome: &mut BandwidthOutcome,
    diag: &mut Diagnostics,
) -> bool {
    if outcome.level < bounds.levels() {
        return false;
    }
    let Some(worst) = bounds.worst() else {
        tracing::warn!("worst tier unsupported; frame stays over budget");
        return false;
    };

    let mut limited: SmallVec<[usize; MAX_PIPES]> = frame
        .pipes
        .iter()
        .enumerate()
        .filter(|(_, p)| p.has_hrt_limit() && cfg.counts_bandwidth(p.pipe.index()))
        .map(|(i, _)| i)
        .collect();
    if limited.is_empty() {
        return false;
    }
    limited.sort_by_key(|i| Reverse(frame.pipes[*i].pipe));

    let mut valid = i64::from(worst / cfg.unit_weight);
    let mut reserve = limited.len() as i64 - 1;
    for idx in limited {
        let pipe = &mut frame.pipes[idx];
        let budget = (valid - reserve).max(0) as usize;
        let rolled = rollback_to_gpu(pipe, budget, Stage::BandwidthSwept);
        if rolled.clamped {
            diag.negative_capacity += 1;
            report_internal("negative bandwidth budget");
        }
        tracing::debug!(pipe = %pipe.pipe, budget, window = ?pipe.gles.bounds(), "tier reduction");
        valid = rolled.available as i64 + reserve;
        reserve -= 1;
    }

    let ceiling = worst.saturating_mul(cfg.bound_bpp);
    outcome.level = bounds.level_of(ceiling, cfg.bound_bpp);
    outcome.weight = ceiling;
    outcome.monitor_weight = outcome.monitor_weight.map(|w| w.min(ceiling));
    diag.tier_reductions += 1;
    true
}

#[cfg(test)]
#[path = "../../tests/unit/layering/bandwidth.rs"]
mod tests;
