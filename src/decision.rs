//! Typed result of one resolution and its boundary encoding.

use crate::foundation::core::PipeId;
use crate::foundation::error::ErrorKind;
use crate::layering::dispatch::Placement;
use crate::layering::gles::{GlesWindow, WindowStep};
use crate::layering::layer::{Frame, LayerCaps, PipeLayers};
use crate::request::model::{LayeringRequest, UNSET};

/// Outcome for one layer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct LayerDecision {
    /// Plane assignment; `None` when the pipe has no overlay hardware.
    pub placement: Option<Placement>,
    /// Base layer when attached as an extended layer.
    pub ext_base: Option<usize>,
    /// Capability flags after resolution.
    pub caps: LayerCaps,
    /// Default bandwidth weight.
    pub weight: u32,
    /// Bandwidth-monitor weight.
    pub bwm_weight: u32,
}

/// Outcome for one pipe.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PipeDecision {
    /// Pipe index.
    pub pipe: PipeId,
    /// GPU fallback window.
    pub gles: GlesWindow,
    /// Overlap weight.
    pub weight: u32,
    /// Bandwidth-monitor overlap weight.
    pub bwm_weight: u32,
    /// Client must redraw because a capability was revoked.
    pub needs_repaint: bool,
    /// Why the whole pipe went to the GPU, if it did.
    pub fallback: Option<ErrorKind>,
    /// Per-layer outcomes, bottom first.
    pub layers: Vec<LayerDecision>,
    /// Every window change, in order.
    pub window_trace: Vec<WindowStep>,
}

/// Outcome for one frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameDecision {
    /// Resolver sequence number of this frame.
    pub sequence: u32,
    /// Bandwidth tier.
    pub hrt_level: u32,
    /// Aggregate overlap weight.
    pub hrt_weight: u32,
    /// Aggregate bandwidth-monitor weight, when the monitor is enabled.
    pub bwm_weight: Option<u32>,
    /// Per-pipe outcomes in request order.
    pub pipes: Vec<PipeDecision>,
}

impl PipeDecision {
    fn from_pipe(pipe: &PipeLayers) -> Self {
        Self {
            pipe: pipe.pipe,
            gles: pipe.gles,
            weight: pipe.weight,
            bwm_weight: pipe.bwm_weight,
            needs_repaint: pipe.needs_repaint,
            fallback: pipe.fallback,
            layers: pipe
                .layers
                .iter()
                .map(|l| LayerDecision {
                    placement: l.placement,
                    ext_base: l.ext,
                    caps: l.caps,
                    weight: l.weight,
                    bwm_weight: l.bwm_weight,
                })
                .collect(),
            window_trace: pipe.window_trace().to_vec(),
        }
    }
}

impl FrameDecision {
    pub(crate) fn from_frame(
        frame: &Frame,
        hrt_level: u32,
        hrt_weight: u32,
        bwm_weight: Option<u32>,
    ) -> Self {
        Self {
            sequence: frame.sequence.0,
            hrt_level,
            hrt_weight,
            bwm_weight,
            pipes: frame.pipes.iter().map(PipeDecision::from_pipe).collect(),
        }
    }

    /// Decision for `pipe`.
    pub fn pipe(&self, pipe: PipeId) -> Option<&PipeDecision> {
        self.pipes.iter().find(|p| p.pipe == pipe)
    }

    /// Write the outputs into the request they were resolved from.
    ///
    /// Pipes are matched by index; request pipes without a decision are left untouched.
    pub fn write_back(&self, req: &mut LayeringRequest) {
        req.sequence = self.sequence;
        req.hrt_level = self.hrt_level;
        req.hrt_weight = self.hrt_weight;
        for decision in &self.pipes {
            let Some(pipe) = req
                .pipes
                .iter_mut()
                .find(|p| p.pipe == u32::from(decision.pipe.0))
            else {
                continue;
            };
            (pipe.gles_head, pipe.gles_tail) = decision.gles.to_wire();
            for (desc, layer) in pipe.layers.iter_mut().zip(&decision.layers) {
                desc.caps = layer.caps.bits();
                desc.weight = layer.weight;
                desc.ext_sel_layer = layer.ext_base.map_or(UNSET, |b| b as i32);
                match layer.placement {
                    Some(p) => {
                        desc.ovl_id = p.plane;
                        desc.ext_slot = p.ext_slot.to_wire();
                    }
                    None => {
                        desc.ovl_id = 0;
                        desc.ext_slot = 0;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/decision.rs"]
mod tests;
