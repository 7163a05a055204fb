//! Embedding types.

use serde::Serialize;

/// Provider metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub dimensions: usize,
}

/// Where the shared model handle is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LoadStatus {
    /// No load has been attempted yet.
    Uninitialized,
    /// A load is in flight; other callers are told to come back later.
    Loading,
    /// The model is loaded and will be reused for the life of the process.
    Ready,
    /// The last attempt failed; the next request tries again.
    Failed(String),
}

impl LoadStatus {
    /// Whether a caller seeing this status should start a new load.
    #[must_use]
    pub const fn needs_load(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Failed(_))
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
