//! Boundary record exchanged with the compositor client.
//!
//! Inputs and outputs share one record: the resolver validates the inputs, resolves the frame
//! and writes the outputs back into the same fields. Output fields are ignored on entry, so a
//! record that was already resolved can be submitted again.

/// Index value meaning "unset".
pub const UNSET: i32 = -1;

fn unset() -> i32 {
    UNSET
}

/// One frame's layering request.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayeringRequest {
    /// Frame sequence number; overwritten with the resolver's counter.
    #[serde(default)]
    pub sequence: u32,
    /// Output: bandwidth tier.
    #[serde(default)]
    pub hrt_level: u32,
    /// Output: aggregate overlap weight.
    #[serde(default)]
    pub hrt_weight: u32,
    /// Pipes taking part in this frame.
    pub pipes: Vec<PipeRequest>,
}

/// Layers of one pipe.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipeRequest {
    /// Pipe index, `0..4`.
    pub pipe: u32,
    /// Display mode code.
    #[serde(default)]
    pub mode: u32,
    /// Declared layer count; must match `layers`.
    pub layer_count: i32,
    /// Layers, bottom first.
    #[serde(default)]
    pub layers: Vec<LayerDesc>,
    /// GPU fallback window head, `-1` when unset. Written back.
    #[serde(default = "unset")]
    pub gles_head: i32,
    /// GPU fallback window tail, `-1` when unset. Written back.
    #[serde(default = "unset")]
    pub gles_tail: i32,
}

/// One layer descriptor.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayerDesc {
    /// Source crop `[x, y, w, h]`.
    pub src: [u32; 4],
    /// Destination `[x, y, w, h]`.
    pub dst: [u32; 4],
    /// DRM fourcc.
    pub format: u32,
    /// Capability and hint bits. Written back.
    #[serde(default)]
    pub caps: u32,
    /// Output: base layer of an extended attachment, `-1` when none.
    #[serde(default = "unset")]
    pub ext_sel_layer: i32,
    /// Buffer is compressed.
    #[serde(default)]
    pub compress: bool,
    /// Buffer is protected.
    #[serde(default)]
    pub secure: bool,
    /// Opaque buffer identity.
    #[serde(default)]
    pub buffer_id: u64,
    /// Output: plane id.
    #[serde(default)]
    pub ovl_id: u32,
    /// Output: extended slot code.
    #[serde(default)]
    pub ext_slot: u32,
    /// Output: bandwidth weight.
    #[serde(default)]
    pub weight: u32,
}

impl LayerDesc {
    /// Unscaled layer at `dst` with output fields cleared.
    pub fn new(dst: [u32; 4], format: u32) -> Self {
        Self {
            src: [0, 0, dst[2], dst[3]],
            dst,
            format,
            caps: 0,
            ext_sel_layer: UNSET,
            compress: false,
            secure: false,
            buffer_id: 0,
            ovl_id: 0,
            ext_slot: 0,
            weight: 0,
        }
    }
}

impl PipeRequest {
    /// Pipe without a fallback window.
    pub fn new(pipe: u32, mode: u32, layers: Vec<LayerDesc>) -> Self {
        Self {
            pipe,
            mode,
            layer_count: layers.len() as i32,
            layers,
            gles_head: UNSET,
            gles_tail: UNSET,
        }
    }
}
