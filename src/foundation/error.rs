/// Result alias used throughout the resolver.
pub type LayeringResult<T> = Result<T, LayeringError>;

/// Error taxonomy surfaced at the resolver boundary.
///
/// Every variant means the same thing to a compositor: render this frame on the GPU.
#[derive(thiserror::Error, Debug)]
pub enum LayeringError {
    /// The request violates a precondition (pipe index, layer count, window bounds).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The resolver has no hardware topology for the pipe or the frame.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// An internal invariant was violated and clamped.
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration or topology tables are malformed.
    #[error("config error: {0}")]
    Config(String),

    /// Boundary JSON failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of [`LayeringError`] for callers that only branch on the taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`LayeringError::InvalidArgument`].
    InvalidArgument,
    /// See [`LayeringError::NotConfigured`].
    NotConfigured,
    /// See [`LayeringError::Internal`].
    Internal,
    /// Configuration, serialization and opaque errors.
    Other,
}

impl LayeringError {
    /// Build an [`LayeringError::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`LayeringError::NotConfigured`].
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    /// Build a [`LayeringError::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build a [`LayeringError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LayeringError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotConfigured(_) => ErrorKind::NotConfigured,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Config(_) | Self::Serde(_) | Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for LayeringError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
