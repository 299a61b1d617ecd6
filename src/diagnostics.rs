//! Counters for clamped invariant violations and notable degradations.

/// Event counters accumulated across frames by one resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostics {
    /// Frames resolved successfully.
    pub frames: u64,
    /// Rollback found fewer free slots than layers it had to keep.
    pub negative_capacity: u64,
    /// Dispatch ran out of slots and forced a pipe onto the GPU.
    pub slot_exhaustion: u64,
    /// Offload and display resize landed on the same engine.
    pub offload_conflicts: u64,
    /// Extended runs re-based because an engine ran out of extended slots.
    pub ext_rebases: u64,
    /// Display resize released on the first layer to make the frame fit.
    pub resize_released: u64,
    /// Second capacity reduction because the frame exceeded the worst bandwidth tier.
    pub tier_reductions: u64,
    /// Compression ratios clamped on entry to the cache.
    pub ratio_clamps: u64,
}

/// Log an internal invariant violation that was clamped.
pub(crate) fn report_internal(what: &str) {
    tracing::error!(event = what, "layering invariant violated");
}
