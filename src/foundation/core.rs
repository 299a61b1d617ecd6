use crate::foundation::error::{LayeringError, LayeringResult};

/// Number of display pipes a frame can carry (primary, secondary, third, fourth).
pub const MAX_PIPES: usize = 4;

/// Axis-aligned integer rectangle: pixel offset plus size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left offset in pixels.
    pub x: u32,
    /// Top offset in pixels.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Rect {
    /// Build a rectangle from offset and size.
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Zero-area rectangles take no part in overlap accounting.
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    /// Return `true` when the vertical spans share at least one row.
    pub fn overlaps_y(self, other: Rect) -> bool {
        u64::from(self.y) < other.bottom() && u64::from(other.y) < self.bottom()
    }

    /// Return `true` when width and height match `other`.
    pub fn same_size(self, other: Rect) -> bool {
        self.w == other.w && self.h == other.h
    }

    /// Smallest rectangle covering both. An empty side yields the other one.
    pub fn join(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            x,
            y,
            w: clamp_u32(right - u64::from(x)),
            h: clamp_u32(bottom - u64::from(y)),
        }
    }
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Display pipe index in `0..MAX_PIPES`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PipeId(pub u8);

impl PipeId {
    /// Main panel.
    pub const PRIMARY: PipeId = PipeId(0);
    /// External display.
    pub const SECONDARY: PipeId = PipeId(1);

    /// Validate a raw pipe index coming from the boundary.
    pub fn new(raw: u32) -> LayeringResult<Self> {
        if raw as usize >= MAX_PIPES {
            return Err(LayeringError::invalid_argument(format!(
                "pipe index {raw} out of range (max {})",
                MAX_PIPES - 1
            )));
        }
        Ok(Self(raw as u8))
    }

    /// Index into per-pipe arrays.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Return `true` for the main panel pipe.
    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl std::fmt::Display for PipeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipe{}", self.0)
    }
}

/// Per-resolver frame sequence counter.
///
/// The counter skips `u32::MAX` and restarts at zero instead of wrapping through it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameSeq(pub u32);

impl FrameSeq {
    /// Next sequence value with reset-on-wrap.
    pub fn advance(self) -> Self {
        let next = self.0.wrapping_add(1);
        if next == u32::MAX { Self(0) } else { Self(next) }
    }
}

/// DRM-style four character code.
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
