//! Resolver tuning: feature switches and platform constants.
//!
//! Every field has a default so an empty JSON object is a valid configuration.

use std::path::Path;

use crate::foundation::core::MAX_PIPES;
use crate::foundation::error::{LayeringError, LayeringResult};

/// Longest run of extended layers a single physical layer may carry.
pub const EXT_CHAIN_HARD_LIMIT: u32 = 3;

/// Per-side output overhead added to dual-pipe resize tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TileOverhead {
    /// Extra output columns on the left half.
    pub left: u32,
    /// Extra output columns on the right half.
    pub right: u32,
}

/// Resolver configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayeringConfig {
    /// Enable extended-layer chaining on the primary pipe.
    pub ext_layer: bool,
    /// Also chain extended layers on non-primary pipes.
    pub ext_layer_on_secondary: bool,
    /// Enable the display resize (RPO) selector.
    pub rpo: bool,
    /// Use bandwidth-monitor weights for the frame tier.
    pub bw_monitor: bool,
    /// Fold inactive layers into the GLES window when no window exists.
    pub inactive_layer_cache: bool,
    /// Promote a clear-capable layer inside the window to a solid-color overlay layer.
    pub clear_layer: bool,
    /// Always sweep for the peak overlap. When off, a pipe whose plain weight sum stays within
    /// the first tier reports that sum unless a secondary pipe is active.
    pub force_overlap_scan: bool,
    /// Weight of one byte per pixel of full-screen coverage.
    pub unit_weight: u32,
    /// Bytes per pixel the bound table is expressed in, also the GLES target bpp.
    pub bound_bpp: u32,
    /// Layer capacity of the overlay engines on the primary pipe.
    pub ovl_layer_num: u32,
    /// Hard cap on extended layers per frame.
    pub max_ext_layers: u32,
    /// Longest extended chain per physical layer, at most 3.
    pub max_chain_len: u32,
    /// Maximum resize input tile width.
    pub rpo_tile_length: u32,
    /// Maximum resize input height.
    pub rpo_max_height: u32,
    /// Layers the resizer can take per frame.
    pub rpo_scale_num: u32,
    /// Minimum growth, in percent of the panel, for a layer to be worth resizing.
    pub ratio_limit_percent: u32,
    /// Platforms whose resizer also accepts layers carrying the MDP resize hint.
    pub rpo_allows_mdp_layers: bool,
    /// Dual-pipe tile overhead.
    pub tile_overhead: TileOverhead,
    /// Pipes whose overlap weight counts toward the frame bandwidth tier.
    pub hrt_pipes: Vec<u8>,
    /// Entries kept in the compression ratio cache.
    pub ratio_cache_capacity: usize,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            ext_layer: true,
            ext_layer_on_secondary: false,
            rpo: true,
            bw_monitor: false,
            inactive_layer_cache: false,
            clear_layer: false,
            force_overlap_scan: true,
            unit_weight: 100,
            bound_bpp: 4,
            ovl_layer_num: 12,
            max_ext_layers: 6,
            max_chain_len: EXT_CHAIN_HARD_LIMIT,
            rpo_tile_length: 1440,
            rpo_max_height: 2560,
            rpo_scale_num: 1,
            ratio_limit_percent: 2,
            rpo_allows_mdp_layers: false,
            tile_overhead: TileOverhead::default(),
            hrt_pipes: vec![0, 1],
            ratio_cache_capacity: 32,
        }
    }
}

impl LayeringConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(text: &str) -> LayeringResult<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> LayeringResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LayeringError::config(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check ranges that the resolver relies on.
    pub fn validate(&self) -> LayeringResult<()> {
        if self.unit_weight == 0 {
            return Err(LayeringError::config("unit_weight must be > 0"));
        }
        if self.bound_bpp == 0 {
            return Err(LayeringError::config("bound_bpp must be > 0"));
        }
        if self.ovl_layer_num == 0 || self.ovl_layer_num > 16 {
            return Err(LayeringError::config("ovl_layer_num must be in 1..=16"));
        }
        if self.max_chain_len == 0 || self.max_chain_len > EXT_CHAIN_HARD_LIMIT {
            return Err(LayeringError::config(format!(
                "max_chain_len must be in 1..={EXT_CHAIN_HARD_LIMIT}"
            )));
        }
        if let Some(p) = self.hrt_pipes.iter().find(|p| usize::from(**p) >= MAX_PIPES) {
            return Err(LayeringError::config(format!(
                "hrt_pipes entry {p} out of range"
            )));
        }
        Ok(())
    }

    /// Return `true` when `pipe` counts toward the frame bandwidth tier.
    pub(crate) fn counts_bandwidth(&self, pipe: usize) -> bool {
        self.hrt_pipes.iter().any(|p| usize::from(*p) == pipe)
    }

    /// Full-screen GLES target weight.
    pub(crate) fn gles_weight(&self) -> u32 {
        self.unit_weight.saturating_mul(self.bound_bpp)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
