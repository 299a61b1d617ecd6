//! GLES fallback window: the contiguous run of layers composited by the GPU into one target.

use smallvec::SmallVec;

/// Resolution stage of a pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Copied in from the request.
    Unresolved,
    /// Resize selection done.
    Resized,
    /// Extended layers grouped.
    Grouped,
    /// Engine count fits the pipe.
    CapacityChecked,
    /// Bandwidth tier computed.
    BandwidthSwept,
    /// Clear layer promoted.
    Cleared,
    /// Planes assigned.
    Dispatched,
}

/// Inclusive `[head, tail]` layer range; empty when no layer falls back to the GPU.
///
/// The window only grows: every mutator except [`GlesWindow::release_end`] takes the hull with
/// the current range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlesWindow(Option<(usize, usize)>);

impl GlesWindow {
    /// No fallback layers.
    pub const EMPTY: GlesWindow = GlesWindow(None);

    /// Window spanning `head..=tail`.
    pub fn new(head: usize, tail: usize) -> Self {
        Self(Some((head.min(tail), head.max(tail))))
    }

    /// Window from boundary indices where `-1` means unset.
    pub fn from_wire(head: i32, tail: i32) -> Self {
        match (usize::try_from(head), usize::try_from(tail)) {
            (Ok(h), Ok(t)) => Self::new(h, t),
            _ => Self::EMPTY,
        }
    }

    /// Boundary encoding, `(-1, -1)` when empty.
    pub fn to_wire(self) -> (i32, i32) {
        match self.0 {
            Some((h, t)) => (h as i32, t as i32),
            None => (-1, -1),
        }
    }

    /// `(head, tail)` if set.
    pub fn bounds(self) -> Option<(usize, usize)> {
        self.0
    }

    /// First fallback layer.
    pub fn head(self) -> Option<usize> {
        self.0.map(|(h, _)| h)
    }

    /// Last fallback layer.
    pub fn tail(self) -> Option<usize> {
        self.0.map(|(_, t)| t)
    }

    /// Return `true` when no layer falls back.
    pub fn is_empty(self) -> bool {
        self.0.is_none()
    }

    /// Number of layers inside the window.
    pub fn len(self) -> usize {
        self.0.map_or(0, |(h, t)| t - h + 1)
    }

    /// Return `true` when layer `idx` is inside the window.
    pub fn contains(self, idx: usize) -> bool {
        self.0.is_some_and(|(h, t)| h <= idx && idx <= t)
    }

    /// Grow the window to cover `head..=tail`.
    pub fn cover(&mut self, head: usize, tail: usize) {
        let (h, t) = (head.min(tail), head.max(tail));
        self.0 = Some(match self.0 {
            Some((oh, ot)) => (oh.min(h), ot.max(t)),
            None => (h, t),
        });
    }

    /// Grow the window to cover layer `idx`.
    pub fn include(&mut self, idx: usize) {
        self.cover(idx, idx);
    }

    /// Drop layer `idx` from the window if it is the head or the tail.
    ///
    /// A single-layer window becomes empty. Returns `false` and leaves the window alone when
    /// `idx` is not an end.
    pub fn release_end(&mut self, idx: usize) -> bool {
        let Some((h, t)) = self.0 else {
            return false;
        };
        self.0 = if h == t && idx == h {
            None
        } else if idx == h {
            Some((h + 1, t))
        } else if idx == t {
            Some((h, t - 1))
        } else {
            return false;
        };
        true
    }

    /// Return `true` when every layer of `other` is inside `self`.
    pub fn covers(self, other: GlesWindow) -> bool {
        match (self.0, other.0) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some((h, t)), Some((oh, ot))) => h <= oh && ot <= t,
        }
    }
}

impl serde::Serialize for GlesWindow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Window after a stage changed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct WindowStep {
    /// Stage that produced the change.
    pub stage: Stage,
    /// Window after the change.
    pub window: GlesWindow,
}

/// Change log of a pipe's window during one resolution.
#[derive(Clone, Debug, Default)]
pub(crate) struct WindowTrace {
    steps: SmallVec<[WindowStep; 4]>,
}

impl WindowTrace {
    pub(crate) fn record(&mut self, stage: Stage, window: GlesWindow) {
        if self.steps.last().map(|s| s.window) == Some(window) {
            return;
        }
        self.steps.push(WindowStep { stage, window });
    }

    pub(crate) fn steps(&self) -> &[WindowStep] {
        &self.steps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layering/gles.rs"]
mod tests;
