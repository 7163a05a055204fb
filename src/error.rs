//! Error types for vecbridge.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Retryability flags so callers know when trying again can help
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vecbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store
    StoreNotFound,
    CollectionNotFound,
    DatabaseError,

    // Model
    ModelUnavailable,
    EmbeddingError,

    // Input
    InvalidArgument,

    // Environment
    ConfigError,
    IoError,

    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StoreNotFound => "STORE_NOT_FOUND",
            Self::CollectionNotFound => "COLLECTION_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ModelUnavailable => "MODEL_UNAVAILABLE",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may succeed by trying again.
    ///
    /// True when the model is still loading (retry later) and for input
    /// errors (retry with corrected input). Nothing is retried internally.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelUnavailable | Self::InvalidArgument)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in vecbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Vector store path not found: {}", path.display())]
    StoreNotFound { path: PathBuf },

    #[error("Collection not found: {name}")]
    CollectionNotFound {
        name: String,
        /// Names of the collections that do exist, for hint display.
        available: Vec<String>,
    },

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::StoreNotFound { .. } => ErrorCode::StoreNotFound,
            Self::CollectionNotFound { .. } => ErrorCode::CollectionNotFound,
            Self::ModelUnavailable => ErrorCode::ModelUnavailable,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Embedding(_) => ErrorCode::EmbeddingError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::StoreNotFound { .. } => Some(
                "Point --store (or VECTOR_STORE_PATH) at the directory holding vectors.sqlite3"
                    .to_string(),
            ),

            Self::CollectionNotFound { available, .. } => {
                if available.is_empty() {
                    Some("The store has no collections yet.".to_string())
                } else {
                    let mut hint = String::from("Available collections:\n");
                    for name in available.iter().take(5) {
                        hint.push_str(&format!("    {name}\n"));
                    }
                    if available.len() > 5 {
                        hint.push_str(&format!("    ... and {} more\n", available.len() - 5));
                    }
                    hint.push_str("  Select one with --collection <name>");
                    Some(hint)
                }
            }

            Self::ModelUnavailable => {
                Some("The embedding model is still loading or failed to load; retry later.".to_string())
            }

            Self::Database(_)
            | Self::Io(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Embedding(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_unavailable_is_retryable() {
        let err = Error::ModelUnavailable;
        assert_eq!(err.error_code(), ErrorCode::ModelUnavailable);
        assert!(err.error_code().is_retryable());
        assert_eq!(err.to_string(), "Model not loaded");
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = Error::StoreNotFound {
            path: PathBuf::from("/nope"),
        };
        assert!(!err.error_code().is_retryable());
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn test_collection_hint_lists_available() {
        let err = Error::CollectionNotFound {
            name: "phones".into(),
            available: vec!["laptops".into(), "tablets".into()],
        };
        let hint = err.hint().unwrap();
        assert!(hint.contains("laptops"));
        assert!(hint.contains("tablets"));
    }

    #[test]
    fn test_collection_hint_truncates() {
        let available = (0..8).map(|i| format!("c{i}")).collect();
        let err = Error::CollectionNotFound {
            name: "phones".into(),
            available,
        };
        let hint = err.hint().unwrap();
        assert!(hint.contains("c4"));
        assert!(!hint.contains("c5"));
        assert!(hint.contains("... and 3 more"));
    }

    #[test]
    fn test_storage_errors_map_to_codes() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.error_code(), ErrorCode::DatabaseError);
        assert_eq!(err.error_code().as_str(), "DATABASE_ERROR");

        let err = Error::from(std::io::Error::other("disk full"));
        assert_eq!(err.error_code().as_str(), "IO_ERROR");
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_structured_json() {
        let err = Error::CollectionNotFound {
            name: "phones".into(),
            available: vec![],
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "COLLECTION_NOT_FOUND");
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].is_string());

        let json = Error::Other("boom".into()).to_structured_json();
        assert_eq!(json["error"]["message"], "boom");
        assert!(json["error"].get("hint").is_none());
    }
}
