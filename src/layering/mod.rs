pub(crate) mod bandwidth;
pub(crate) mod capacity;
pub(crate) mod clear;
pub(crate) mod dispatch;
pub(crate) mod format;
pub(crate) mod gles;
pub(crate) mod grouping;
pub(crate) mod inactive;
pub(crate) mod layer;
pub(crate) mod resize;
pub(crate) mod sweep;
