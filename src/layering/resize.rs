//! Display resize (RPO) selection.
//!
//! The primary pipe owns one resizer shared by all selected layers, so candidates are judged on
//! the joined source and destination regions. Every other scaled layer without a rescale path
//! falls back to the GPU.

use crate::config::{LayeringConfig, TileOverhead};
use crate::foundation::core::Rect;
use crate::layering::gles::Stage;
use crate::layering::layer::{Layer, LayerCaps, PipeLayers};
use crate::topology::PipeTopology;

/// Fixed-point unit of the resizer phase.
pub const TILE_UNIT: i64 = 32768;
/// Extra input columns each tile reads beyond its output overhead.
const TILE_IN_LOSS: i64 = 4;
/// Sources this small are below the resizer's minimum input.
const MIN_SRC_SIZE: u32 = 4;

/// Resize arrangement of the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeScenario {
    /// The resizer is idle.
    #[default]
    None,
    /// The resizer scales layers on the primary pipe.
    OneScaling,
}

/// Resizer configuration of one half of a split panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileParam {
    /// First output column.
    pub out_x: u32,
    /// Fixed-point step per output pixel.
    pub step: i64,
    /// Integer part of the initial phase.
    pub int_offset: i64,
    /// Fractional part of the initial phase.
    pub sub_offset: i64,
    /// Input columns read.
    pub in_len: i64,
    /// Output columns written.
    pub out_len: i64,
}

/// Why a layer cannot be split across the two halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TileSplitError {
    /// Source or destination too narrow to compute a step.
    #[error("degenerate scale {src_w} -> {dst_w}")]
    Degenerate {
        /// Source width.
        src_w: u32,
        /// Destination width.
        dst_w: u32,
    },
    /// The left half would start before its input.
    #[error("left tile phase {0} out of range")]
    LeftPhase(i64),
    /// The right half would start before its input or would not scale.
    #[error("right tile infeasible (phase {int_offset}, in {in_len}, out {out_len})")]
    RightTile {
        /// Integer phase.
        int_offset: i64,
        /// Input length.
        in_len: i64,
        /// Output length.
        out_len: i64,
    },
    /// A half would shrink.
    #[error("tile scales down")]
    Downscale,
}

/// Split an upscale of `src_w` columns onto `dst_x..dst_x + dst_w` across the midline of a
/// `panel_w` wide dual-pipe panel.
pub fn split_tiles(
    src_w: u32,
    dst_x: u32,
    dst_w: u32,
    panel_w: u32,
    overhead: TileOverhead,
) -> Result<[TileParam; 2], TileSplitError> {
    if src_w < 2 || dst_w < 2 {
        return Err(TileSplitError::Degenerate { src_w, dst_w });
    }
    let (src_w, dst_x, dst_w) = (i64::from(src_w), i64::from(dst_x), i64::from(dst_w));
    let half = i64::from(panel_w / 2);
    let tile_idx = if dst_x >= half { 1 } else { 0 };

    let step = (TILE_UNIT * (src_w - 1) + (dst_w - 2)) / (dst_w - 1);
    let offset0 = (step * (dst_w - 1) - TILE_UNIT * (src_w - 1)) / 2;
    let (int0, sub0) = normalize_phase(-offset0);

    // left half
    let out_loss0 = i64::from(overhead.left);
    let mut in_loss0 = out_loss0 + TILE_IN_LOSS;
    let mut in_len0 = ((half - dst_x) * src_w * 10 / dst_w + 5) / 10;
    if in_len0 + in_loss0 >= src_w {
        in_loss0 = src_w - in_len0;
    }
    let out_len0 = half - dst_x + out_loss0;
    if in_len0 + in_loss0 > out_len0 {
        in_loss0 = out_len0 - in_len0;
    }
    in_len0 += in_loss0;

    let mut params = [TileParam::default(); 2];
    params[tile_idx] = TileParam {
        out_x: dst_x as u32,
        step,
        int_offset: int0,
        sub_offset: sub0,
        in_len: in_len0,
        out_len: out_len0,
    };
    if int0 < -1 {
        return Err(TileSplitError::LeftPhase(int0));
    }

    // right half
    let out_loss1 = i64::from(overhead.right);
    let mut in_loss1 = out_loss1 + TILE_IN_LOSS;
    let out_len1 = dst_w - (out_len0 - out_loss0) + out_loss1;
    let mut in_len1 = ((out_len1 - out_loss1) * src_w * 10 / dst_w + 5) / 10;
    if in_len1 + in_loss1 >= src_w {
        in_loss1 = src_w - in_len1;
    }
    if in_len1 + in_loss1 > out_len1 {
        in_loss1 = out_len1 - in_len1;
    }
    in_len1 += in_loss1;

    let offset1 =
        -offset0 + (out_len0 - out_loss0 - out_loss1) * step - (src_w - in_len1) * TILE_UNIT;
    let int1 = offset1 / TILE_UNIT;
    let sub1 = if offset1 >= 0 {
        offset1 - TILE_UNIT * int1
    } else {
        TILE_UNIT * int1 - offset1
    };
    params[1] = TileParam {
        out_x: 0,
        step,
        int_offset: int1,
        sub_offset: sub1,
        in_len: in_len1,
        out_len: out_len1,
    };

    if in_len1 == out_len1 || int1 < -1 || out_len1 >= dst_w {
        return Err(TileSplitError::RightTile {
            int_offset: int1,
            in_len: in_len1,
            out_len: out_len1,
        });
    }
    if in_len1 > out_len1 || in_len0 > out_len0 {
        return Err(TileSplitError::Downscale);
    }
    Ok(params)
}

fn normalize_phase(sub: i64) -> (i64, i64) {
    if sub < 0 {
        (-1, sub + TILE_UNIT)
    } else if sub >= TILE_UNIT {
        (1, sub - TILE_UNIT)
    } else {
        (0, sub)
    }
}

/// Strict upscale on both axes.
fn is_upscale(layer: &Layer) -> bool {
    layer.is_scaled() && layer.src.w <= layer.dst.w && layer.src.h <= layer.dst.h
}

/// Growth too small to be worth the resizer, relative to the panel.
fn below_ratio_limit(layer: &Layer, panel_w: u32, panel_h: u32, limit: u32) -> bool {
    if panel_w == 0 || panel_h == 0 {
        return false;
    }
    let diff_w = i64::from(layer.dst.w) - i64::from(layer.src.w);
    let diff_h = i64::from(layer.dst.h) - i64::from(layer.src.h);
    let limit = i64::from(limit);
    (diff_w > 0 && 100 * diff_w / i64::from(panel_w) < limit)
        || (diff_h > 0 && 100 * diff_h / i64::from(panel_h) < limit)
}

/// Left edge of the split panel lies strictly inside the layer.
fn crosses_midline(layer: &Layer, panel_w: u32) -> bool {
    let half = u64::from(panel_w / 2);
    !(layer.dst.right() <= half || u64::from(layer.dst.x) > half)
}

/// Source region of `layer` expressed in destination coordinates.
fn source_roi(layer: &Layer) -> Rect {
    let map = |offset: u32, src: u32, dst: u32| -> u32 {
        let v = (u64::from(offset) * u64::from(src) * 10 / u64::from(dst).max(1) + 5) / 10;
        u32::try_from(v).unwrap_or(u32::MAX)
    };
    Rect::new(
        map(layer.dst.x, layer.src.w, layer.dst.w),
        map(layer.dst.y, layer.src.h, layer.dst.h),
        layer.src.w,
        layer.src.h,
    )
}

/// Pick display-resize layers on the primary pipe. Returns the number selected.
pub(crate) fn select_rpo(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    cfg: &LayeringConfig,
) -> usize {
    let panel = topo.panel;
    let head = pipe.gles.head();
    let mut src_roi = Rect::default();
    let mut dst_roi = Rect::default();
    let mut selected = 0usize;

    for (i, layer) in pipe.layers.iter_mut().enumerate() {
        if head.is_some_and(|h| h <= i) {
            continue;
        }
        if layer.src.w <= MIN_SRC_SIZE || layer.src.h <= MIN_SRC_SIZE {
            continue;
        }
        if !is_upscale(layer) {
            continue;
        }
        if below_ratio_limit(layer, panel.width, panel.height, cfg.ratio_limit_percent) {
            continue;
        }

        src_roi = src_roi.join(source_roi(layer));
        dst_roi = dst_roi.join(layer.dst);
        if src_roi.w > dst_roi.w || src_roi.h > dst_roi.h {
            tracing::debug!(layer = i, ?src_roi, ?dst_roi, "joined resize region scales down");
            continue;
        }

        if topo.dual_pipe {
            if !crosses_midline(layer, panel.width) {
                continue;
            }
            let tiles = match split_tiles(
                src_roi.w,
                dst_roi.x,
                dst_roi.w,
                panel.width,
                cfg.tile_overhead,
            ) {
                Ok(tiles) => tiles,
                Err(err) => {
                    tracing::debug!(layer = i, %err, "dual-pipe split rejected");
                    continue;
                }
            };
            let tile_len = i64::from(cfg.rpo_tile_length);
            if tiles.iter().any(|t| t.in_len > tile_len) || src_roi.h > cfg.rpo_max_height {
                continue;
            }
        } else if src_roi.w > cfg.rpo_tile_length || src_roi.h > cfg.rpo_max_height {
            continue;
        }

        if layer.caps.is_offload() {
            continue;
        }
        if layer.caps.contains(LayerCaps::MDP_RESIZE) && !cfg.rpo_allows_mdp_layers {
            continue;
        }
        if selected >= cfg.rpo_scale_num as usize {
            break;
        }

        layer.caps.insert(LayerCaps::RPO_RESIZE);
        selected += 1;
    }
    selected
}

/// Send every scaled layer that has no rescale path to the GPU.
pub(crate) fn rollback_unscalable(pipe: &mut PipeLayers) {
    let stuck: Vec<usize> = pipe
        .layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_scaled() && !l.caps.has_resize() && !l.caps.is_offload())
        .map(|(i, _)| i)
        .collect();
    for idx in stuck {
        pipe.include_in_gles(idx, Stage::Resized);
    }
}

/// Resize stage for one pipe: selection on the primary pipe when enabled, then the rollback
/// of whatever still cannot be scaled.
pub(crate) fn resize_pipe(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    cfg: &LayeringConfig,
) -> ResizeScenario {
    let selected = if cfg.rpo && pipe.pipe.is_primary() {
        select_rpo(pipe, topo, cfg)
    } else {
        0
    };
    rollback_unscalable(pipe);
    pipe.mark(Stage::Resized);
    if selected > 0 {
        ResizeScenario::OneScaling
    } else {
        ResizeScenario::None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layering/resize.rs"]
mod tests;
