use crate::foundation::core::{FrameSeq, MAX_PIPES, PipeId, Rect};
use crate::foundation::error::{ErrorKind, LayeringError, LayeringResult};
use crate::layering::dispatch::Placement;
use crate::layering::format::PixelFormat;
use crate::layering::gles::{GlesWindow, Stage, WindowTrace};
use crate::layering::resize::ResizeScenario;

bitflags::bitflags! {
    /// Per-layer capability and hint flags.
    ///
    /// The low bits are client hints; `RPO_RESIZE`, `MDP_FALLBACK`, `UNCHANGED_RATIO_VALID`
    /// and `CLEAR` are set by the resolver.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct LayerCaps: u32 {
        /// Client pre-scales the buffer with the MDP engine.
        const MDP_RESIZE = 1 << 0;
        /// Display resizer (RPO) scales this layer.
        const RPO_RESIZE = 1 << 1;
        /// Offload engine processes the buffer ahead of scan-out (decoupled).
        const OFFLOAD_DECOUPLE = 1 << 2;
        /// Offload engine streams straight into the overlay (direct link).
        const OFFLOAD_DIRECT_LINK = 1 << 3;
        /// Offload was revoked; the client must fall back to an MDP pass.
        const MDP_FALLBACK = 1 << 4;
        /// Layer content is idle and may be cached by the GPU.
        const INACTIVE = 1 << 5;
        /// Buffer content did not change since the previous frame.
        const UNCHANGED = 1 << 6;
        /// Bandwidth weight used a cached compression ratio.
        const UNCHANGED_RATIO_VALID = 1 << 7;
        /// Client can replace the layer's content with a solid-color fill.
        const CLEAR_CAPABLE = 1 << 8;
        /// Drawn by the overlay as a solid-color layer below the GPU target.
        const CLEAR = 1 << 9;
    }
}

impl LayerCaps {
    /// Bits owned by the resolver; cleared when a request is copied in.
    pub const RESOLVER_SET: Self = Self::RPO_RESIZE
        .union(Self::MDP_FALLBACK)
        .union(Self::UNCHANGED_RATIO_VALID)
        .union(Self::CLEAR);

    /// Any offload path.
    pub fn is_offload(self) -> bool {
        self.intersects(Self::OFFLOAD_DECOUPLE | Self::OFFLOAD_DIRECT_LINK)
    }

    /// Decoupled offload only.
    pub fn is_offload_decouple(self) -> bool {
        self.contains(Self::OFFLOAD_DECOUPLE)
    }

    /// Layer already has a hardware rescale path.
    pub fn has_resize(self) -> bool {
        self.intersects(Self::MDP_RESIZE | Self::RPO_RESIZE)
    }

    /// Layer is scaled by the display resizer.
    pub fn is_rpo(self) -> bool {
        self.contains(Self::RPO_RESIZE)
    }

    /// Layer is shown as a solid-color clear layer.
    pub fn is_clear(self) -> bool {
        self.contains(Self::CLEAR)
    }
}

/// Display mode code of a pipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Pipe is off.
    #[default]
    Inactive,
    /// Single direct-link path.
    DirectLink,
    /// Decoupled mirror of another pipe; reads no extra bandwidth budget.
    DecoupleMirror,
    /// Two direct-link paths.
    DoubleDirectLink,
    /// Three direct-link paths.
    TripleDirectLink,
}

impl DisplayMode {
    /// Decode a boundary mode code.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Inactive,
            1 => Self::DirectLink,
            2 => Self::DecoupleMirror,
            3 => Self::DoubleDirectLink,
            4 => Self::TripleDirectLink,
            _ => return None,
        })
    }
}

/// One display surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    /// Source crop in buffer pixels.
    pub src: Rect,
    /// Destination on the panel.
    pub dst: Rect,
    /// Buffer format.
    pub format: PixelFormat,
    /// Capability and hint flags.
    pub caps: LayerCaps,
    /// Buffer is compressed.
    pub compress: bool,
    /// Buffer is protected.
    pub secure: bool,
    /// Opaque buffer identity, used only as a cache key.
    pub buffer_id: u64,
    /// Base layer this layer rides on as an extended layer.
    pub ext: Option<usize>,
    /// Default bandwidth weight.
    pub weight: u32,
    /// Bandwidth-monitor weight.
    pub bwm_weight: u32,
    /// Plane assignment.
    pub placement: Option<Placement>,
}

impl Layer {
    /// Unscaled RGBA layer covering `dst`.
    pub fn new(dst: Rect, format: PixelFormat) -> Self {
        Self {
            src: Rect::new(0, 0, dst.w, dst.h),
            dst,
            format,
            caps: LayerCaps::empty(),
            compress: false,
            secure: false,
            buffer_id: 0,
            ext: None,
            weight: 0,
            bwm_weight: 0,
            placement: None,
        }
    }

    /// Return `true` when attached to a base layer.
    pub fn is_ext(&self) -> bool {
        self.ext.is_some()
    }

    /// Source and destination sizes differ.
    pub fn is_scaled(&self) -> bool {
        !self.src.same_size(self.dst)
    }
}

/// Ordered layers of one pipe plus per-pipe outputs.
#[derive(Clone, Debug)]
pub struct PipeLayers {
    /// Pipe index.
    pub pipe: PipeId,
    /// Display mode.
    pub mode: DisplayMode,
    /// Layers, bottom first.
    pub layers: Vec<Layer>,
    /// GPU fallback window.
    pub gles: GlesWindow,
    /// Overlap weight of the pipe.
    pub weight: u32,
    /// Bandwidth-monitor overlap weight of the pipe.
    pub bwm_weight: u32,
    /// Client must redraw because a capability was revoked.
    pub needs_repaint: bool,
    /// Set when the pipe was forced onto the GPU.
    pub fallback: Option<ErrorKind>,
    pub(crate) trace: WindowTrace,
}

impl PipeLayers {
    /// Pipe with no fallback window yet.
    pub fn new(pipe: PipeId, mode: DisplayMode, layers: Vec<Layer>) -> Self {
        Self::with_window(pipe, mode, layers, GlesWindow::EMPTY)
    }

    /// Pipe with a client-supplied window.
    pub fn with_window(
        pipe: PipeId,
        mode: DisplayMode,
        layers: Vec<Layer>,
        gles: GlesWindow,
    ) -> Self {
        let mut trace = WindowTrace::default();
        trace.record(Stage::Unresolved, gles);
        Self {
            pipe,
            mode,
            layers,
            gles,
            weight: 0,
            bwm_weight: 0,
            needs_repaint: false,
            fallback: None,
            trace,
        }
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when the pipe shows nothing.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Pipe takes part in bandwidth accounting.
    pub fn has_hrt_limit(&self) -> bool {
        !self.is_empty() && self.mode != DisplayMode::DecoupleMirror
    }

    /// Layer `idx` is composited by the GPU.
    pub fn in_gles(&self, idx: usize) -> bool {
        self.gles.contains(idx)
    }

    /// Layer `idx` is inside the window but is not its head.
    pub fn is_gles_body(&self, idx: usize) -> bool {
        self.in_gles(idx) && self.gles.head() != Some(idx)
    }

    /// Overlay layers needed: the window counts once and extended layers ride for free.
    pub fn phy_layer_count(&self) -> usize {
        let gles_saved = self.gles.len().saturating_sub(1);
        let ext_outside = self
            .layers
            .iter()
            .enumerate()
            .filter(|(i, l)| l.is_ext() && !self.in_gles(*i))
            .count();
        self.len()
            .saturating_sub(gles_saved)
            .saturating_sub(ext_outside)
    }

    /// Grow the window to cover `head..=tail` and drop attachments it invalidates.
    ///
    /// Layers inside the window lose their attachment and display resize; layers above it
    /// whose base sits at or below the tail become physical again.
    pub(crate) fn cover_gles(&mut self, head: usize, tail: usize, stage: Stage) {
        self.gles.cover(head, tail);
        self.detach_window();
        self.trace.record(stage, self.gles);
    }

    /// Grow the window to cover layer `idx`.
    pub(crate) fn include_in_gles(&mut self, idx: usize, stage: Stage) {
        self.cover_gles(idx, idx, stage);
    }

    /// Take layer `idx` out of the window when it sits at either end.
    pub(crate) fn release_from_gles(&mut self, idx: usize, stage: Stage) -> bool {
        let released = self.gles.release_end(idx);
        if released {
            self.trace.record(stage, self.gles);
        }
        released
    }

    /// Record the window at the end of `stage`.
    pub(crate) fn mark(&mut self, stage: Stage) {
        self.trace.record(stage, self.gles);
    }

    /// Send every layer to the GPU.
    pub(crate) fn fall_back(&mut self, kind: ErrorKind, stage: Stage) {
        self.fallback = Some(kind);
        for layer in &mut self.layers {
            layer.caps.remove(LayerCaps::CLEAR);
        }
        if !self.is_empty() {
            self.cover_gles(0, self.len() - 1, stage);
        }
    }

    fn detach_window(&mut self) {
        let Some((head, tail)) = self.gles.bounds() else {
            return;
        };
        for layer in self.layers.iter_mut().take(tail + 1).skip(head) {
            layer.ext = None;
            layer.caps.remove(LayerCaps::RPO_RESIZE);
        }
        // a chain may not reach across the window
        for layer in self.layers.iter_mut().skip(tail + 1) {
            if layer.ext.is_some_and(|base| base <= tail) {
                layer.ext = None;
            }
        }
    }

    /// Window history for this resolution.
    pub fn window_trace(&self) -> &[crate::layering::gles::WindowStep] {
        self.trace.steps()
    }
}

/// All pipes of one frame plus frame-level state.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Client sequence number.
    pub sequence: FrameSeq,
    /// Pipes present in the request, in request order.
    pub pipes: Vec<PipeLayers>,
    /// Resize scenario of the primary pipe.
    pub scenario: ResizeScenario,
}

impl Frame {
    /// Pipe by index.
    pub fn pipe(&self, pipe: PipeId) -> Option<&PipeLayers> {
        self.pipes.iter().find(|p| p.pipe == pipe)
    }

    /// Mutable pipe by index.
    pub fn pipe_mut(&mut self, pipe: PipeId) -> Option<&mut PipeLayers> {
        self.pipes.iter_mut().find(|p| p.pipe == pipe)
    }

    /// Check the structural invariants every stage relies on.
    ///
    /// Pipe ids are in range and unique, windows lie inside their pipe, and an extended layer
    /// rides on a layer below it.
    pub fn check(&self) -> LayeringResult<()> {
        let mut seen = [false; MAX_PIPES];
        for pipe in &self.pipes {
            let Some(slot) = seen.get_mut(pipe.pipe.index()) else {
                return Err(LayeringError::invalid_argument(format!(
                    "{}: pipe index out of range (max {})",
                    pipe.pipe,
                    MAX_PIPES - 1
                )));
            };
            if std::mem::replace(slot, true) {
                return Err(LayeringError::invalid_argument(format!(
                    "{}: listed more than once",
                    pipe.pipe
                )));
            }
            if let Some((head, tail)) = pipe.gles.bounds()
                && tail >= pipe.len()
            {
                return Err(LayeringError::invalid_argument(format!(
                    "{}: window [{head}, {tail}] invalid for {} layers",
                    pipe.pipe,
                    pipe.len()
                )));
            }
            for (idx, layer) in pipe.layers.iter().enumerate() {
                if let Some(base) = layer.ext
                    && base >= idx
                {
                    return Err(LayeringError::invalid_argument(format!(
                        "{}: layer {idx} rides on layer {base}, which is not below it",
                        pipe.pipe
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layering/layer.rs"]
mod tests;
