//! Hardware topology tables.
//!
//! The resolver treats these as opaque, read-only lookup tables: which overlay slots exist on
//! each pipe, how slots group into engines, and the bandwidth bound of every tier.

use std::path::Path;

use crate::foundation::core::{MAX_PIPES, PipeId};
use crate::foundation::error::{LayeringError, LayeringResult};

/// Source of topology tables for the resolver.
pub trait Topology: Send + Sync {
    /// Tables for one pipe, or `None` when the pipe has no overlay hardware configured.
    fn pipe(&self, pipe: PipeId) -> Option<&PipeTopology>;

    /// Bandwidth ceiling per tier.
    fn bounds(&self) -> &BoundTable;
}

/// Panel resolution of a pipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PanelSize {
    /// Horizontal resolution.
    pub width: u32,
    /// Vertical resolution.
    pub height: u32,
}

/// Slot layout of one pipe.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipeTopology {
    /// Usable-slot mask indexed by the number of physical layers required.
    ///
    /// Requests beyond the table use the last entry, which is the full mask.
    pub layer_maps: Vec<u16>,
    /// One bit per engine, set at the engine's last slot.
    pub ovl_map: u16,
    /// Hardware component id per engine, in slot order.
    pub engines: Vec<u32>,
    /// Whether the pipe drives a split (left/right) panel.
    #[serde(default)]
    pub dual_pipe: bool,
    /// Panel resolution.
    pub panel: PanelSize,
}

impl PipeTopology {
    /// Slot mask to use when `required` physical layers are needed.
    pub fn layer_map(&self, required: usize) -> u16 {
        self.layer_maps
            .get(required)
            .or_else(|| self.layer_maps.last())
            .copied()
            .unwrap_or(0)
    }

    /// Mask of every usable slot.
    pub fn full_map(&self) -> u16 {
        self.layer_maps.last().copied().unwrap_or(0)
    }

    /// Number of physical layers the pipe can show at once.
    pub fn slot_limit(&self) -> usize {
        self.full_map().count_ones() as usize
    }

    /// Engine index owning `slot`.
    pub fn engine_of_slot(&self, slot: u32) -> usize {
        let below = if slot >= 16 {
            self.ovl_map
        } else {
            self.ovl_map & ((1u16 << slot) - 1)
        };
        below.count_ones() as usize
    }

    /// Position of `slot` inside its engine.
    pub fn sub_layer(&self, slot: u32) -> u32 {
        let mut cnt = 0;
        let mut i = slot;
        while i > 0 && self.ovl_map & (1 << (i - 1)) == 0 {
            cnt += 1;
            i -= 1;
        }
        cnt
    }

    /// Engine that the `phy`-th physical layer lands on when `required` layers are placed.
    pub fn engine_of_phy(&self, required: usize, phy: usize) -> Option<usize> {
        nth_set_bit(self.layer_map(required), phy).map(|slot| self.engine_of_slot(slot))
    }

    fn validate(&self, pipe: usize) -> LayeringResult<()> {
        let Some(&full) = self.layer_maps.last() else {
            return Err(LayeringError::config(format!("pipe{pipe}: layer_maps is empty")));
        };
        if let Some(m) = self.layer_maps.iter().find(|m| **m & !full != 0) {
            return Err(LayeringError::config(format!(
                "pipe{pipe}: layer map {m:#06x} uses slots outside the full map {full:#06x}"
            )));
        }
        if let Some((k, m)) = self
            .layer_maps
            .iter()
            .enumerate()
            .find(|(k, m)| (m.count_ones() as usize) < *k)
        {
            return Err(LayeringError::config(format!(
                "pipe{pipe}: layer map {k} ({m:#06x}) has fewer than {k} slots"
            )));
        }
        let engines = self.ovl_map.count_ones() as usize;
        if engines != self.engines.len() {
            return Err(LayeringError::config(format!(
                "pipe{pipe}: ovl_map marks {engines} engines but {} ids are listed",
                self.engines.len()
            )));
        }
        if full != 0 {
            let top = 15 - full.leading_zeros();
            if self.ovl_map >> top == 0 {
                return Err(LayeringError::config(format!(
                    "pipe{pipe}: slot {top} is not covered by any engine"
                )));
            }
        }
        Ok(())
    }
}

/// Bit position of the `n`-th set bit (0-based) in `mask`.
pub fn nth_set_bit(mask: u16, n: usize) -> Option<u32> {
    let mut seen = 0;
    for bit in 0..16 {
        if mask & (1 << bit) != 0 {
            if seen == n {
                return Some(bit);
            }
            seen += 1;
        }
    }
    None
}

/// Bandwidth ceiling per tier; `-1` marks a tier the platform does not support.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BoundTable(pub Vec<i32>);

impl BoundTable {
    /// Number of tiers; also the level reported when a sum exceeds every tier.
    pub fn levels(&self) -> u32 {
        self.0.len() as u32
    }

    /// Lowest tier whose scaled bound covers `sum`.
    pub fn level_of(&self, sum: u32, bpp: u32) -> u32 {
        self.0
            .iter()
            .position(|b| *b >= 0 && u64::from(sum) <= (*b as u64) * u64::from(bpp))
            .map_or(self.levels(), |l| l as u32)
    }

    /// Ceiling of the first tier, scaled to weight units.
    pub fn lower_bound(&self, bpp: u32) -> u32 {
        self.0
            .first()
            .map_or(0, |b| ((*b).max(0) as u32).saturating_mul(bpp))
    }

    /// Ceiling of the worst supported tier, unscaled.
    pub fn worst(&self) -> Option<u32> {
        self.0.last().and_then(|b| u32::try_from(*b).ok())
    }
}

/// Topology loaded from a JSON table.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StaticTopology {
    /// Per-pipe tables; `null` entries are pipes without overlay hardware.
    pub pipes: Vec<Option<PipeTopology>>,
    /// Bandwidth bound per tier.
    pub bounds: BoundTable,
}

impl StaticTopology {
    /// Parse and validate topology JSON.
    pub fn from_json_str(text: &str) -> LayeringResult<Self> {
        let topo: Self = serde_json::from_str(text)?;
        topo.validate()?;
        Ok(topo)
    }

    /// Read and validate a topology file.
    pub fn from_path(path: &Path) -> LayeringResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LayeringError::config(format!("read topology '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check table consistency.
    pub fn validate(&self) -> LayeringResult<()> {
        if self.pipes.len() > MAX_PIPES {
            return Err(LayeringError::config(format!(
                "topology lists {} pipes (max {MAX_PIPES})",
                self.pipes.len()
            )));
        }
        if self.bounds.0.is_empty() {
            return Err(LayeringError::config("bound table is empty"));
        }
        for (idx, pipe) in self.pipes.iter().enumerate() {
            if let Some(pipe) = pipe {
                pipe.validate(idx)?;
            }
        }
        Ok(())
    }

    /// Small two-engine platform: six primary slots (4 + 2), two secondary slots, one on the
    /// third pipe, and four bandwidth tiers.
    pub fn reference() -> Self {
        let prefix_maps = |slots: u16| -> Vec<u16> {
            (0..=slots).map(|k| ((1u32 << k) - 1) as u16).collect()
        };
        Self {
            pipes: vec![
                Some(PipeTopology {
                    layer_maps: prefix_maps(6),
                    ovl_map: 0b10_1000,
                    engines: vec![0x10, 0x11],
                    dual_pipe: false,
                    panel: PanelSize {
                        width: 1080,
                        height: 2400,
                    },
                }),
                Some(PipeTopology {
                    layer_maps: prefix_maps(2),
                    ovl_map: 0b10,
                    engines: vec![0x20],
                    dual_pipe: false,
                    panel: PanelSize {
                        width: 1920,
                        height: 1080,
                    },
                }),
                Some(PipeTopology {
                    layer_maps: prefix_maps(1),
                    ovl_map: 0b1,
                    engines: vec![0x30],
                    dual_pipe: false,
                    panel: PanelSize {
                        width: 1920,
                        height: 1080,
                    },
                }),
                None,
            ],
            bounds: BoundTable(vec![400, 600, 800, 1000]),
        }
    }
}

impl Topology for StaticTopology {
    fn pipe(&self, pipe: PipeId) -> Option<&PipeTopology> {
        self.pipes.get(pipe.index()).and_then(Option::as_ref)
    }

    fn bounds(&self) -> &BoundTable {
        &self.bounds
    }
}

#[cfg(test)]
#[path = "../tests/unit/topology.rs"]
mod tests;
