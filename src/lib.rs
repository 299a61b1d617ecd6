//! Per-frame hardware overlay layer resolver.
//!
//! Given the layers a compositor wants on each display pipe, the [`Resolver`] decides which
//! layers map onto the overlay engines, which collapse into the GPU fallback window, which ride
//! as extended layers or use the display resizer, and which bandwidth tier the frame needs.
//!
//! - Describe the hardware with a [`Topology`] (e.g. [`StaticTopology`] loaded from JSON)
//! - Build a [`LayeringRequest`] per frame
//! - Call [`Resolver::resolve`] and read the [`FrameDecision`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod config;
pub(crate) mod decision;
pub(crate) mod diagnostics;
pub(crate) mod layering;
pub(crate) mod pattern;
pub(crate) mod request;
pub(crate) mod resolver;
pub(crate) mod topology;

pub use crate::foundation::core::{FrameSeq, MAX_PIPES, PipeId, Rect, fourcc};
pub use crate::foundation::error::{ErrorKind, LayeringError, LayeringResult};

pub use crate::config::{EXT_CHAIN_HARD_LIMIT, LayeringConfig, TileOverhead};
pub use crate::decision::{FrameDecision, LayerDecision, PipeDecision};
pub use crate::diagnostics::Diagnostics;
pub use crate::layering::bandwidth::{RATIO_SCALE, RatioCache};
pub use crate::layering::capacity::EXT_SLOTS_PER_ENGINE;
pub use crate::layering::dispatch::{EngineSlot, ExtSlot, Placement};
pub use crate::layering::format::{FOURCC_DIM, FormatClass, PixelFormat};
pub use crate::layering::gles::{GlesWindow, Stage, WindowStep};
pub use crate::layering::layer::{DisplayMode, Frame, Layer, LayerCaps, PipeLayers};
pub use crate::layering::resize::{
    ResizeScenario, TILE_UNIT, TileParam, TileSplitError, split_tiles,
};
pub use crate::pattern::{PATTERN_HEIGHT, PATTERN_WIDTH, test_pattern};
pub use crate::request::model::{LayerDesc, LayeringRequest, PipeRequest, UNSET};
pub use crate::resolver::Resolver;
pub use crate::topology::{BoundTable, PanelSize, PipeTopology, StaticTopology, Topology};
