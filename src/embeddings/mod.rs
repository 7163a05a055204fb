//! Embedding model access for the HTTP service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  HTTP handlers   │
//! └────────┬─────────┘
//!          │ require()
//!          ▼
//! ┌─────────────────┐
//! │   ModelHandle   │  ← lazy, load-once, retried on failure
//! └────────┬────────┘
//!          │ loader (backend from config)
//!          ▼
//! ┌──────────────────────┐
//! │ XlmRobertaProvider   │ ← BGE-M3 snapshot (default)
//! │ Model2VecProvider    │ ← static model directory
//! └──────────────────────┘
//! ```
//!
//! Whatever the backend, a model whose output width differs from the
//! advertised dimension fails to load.
//!
//! Providers return raw vectors; [`vector::normalize_all`] guarantees the
//! unit-length contract regardless of backend.

pub mod handle;
pub mod model2vec;
pub mod provider;
pub mod types;
pub mod vector;
pub mod xlm_roberta;

// Re-exports for convenience
pub use handle::ModelHandle;
pub use model2vec::Model2VecProvider;
pub use provider::{EmbeddingProvider, SharedProvider};
pub use types::{LoadStatus, ProviderInfo};
pub use vector::{l2_norm, l2_normalize, normalize_all};
pub use xlm_roberta::XlmRobertaProvider;

use std::sync::Arc;

use crate::config::{Backend, ServerConfig};
use crate::error::{Error, Result};

/// Build the handle that loads the configured model on first use.
#[must_use]
pub fn model_handle(config: &ServerConfig) -> ModelHandle {
    let backend = config.backend;
    let path = config.model_path.clone();
    let model_name = config.model_name.clone();
    let dimensions = config.dimensions;

    ModelHandle::new(move || {
        let provider: SharedProvider = match backend {
            Backend::XlmRoberta => Arc::new(XlmRobertaProvider::from_path(&path, &model_name)?),
            Backend::Model2vec => Arc::new(Model2VecProvider::from_path(&path, &model_name)?),
        };
        check_dimensions(provider, dimensions)
    })
}

/// Reject a provider whose vectors are not `expected` wide.
///
/// # Errors
///
/// Returns `Embedding` naming both widths on mismatch.
pub fn check_dimensions(provider: SharedProvider, expected: usize) -> Result<SharedProvider> {
    let info = provider.info();
    if info.dimensions == expected {
        Ok(provider)
    } else {
        Err(Error::Embedding(format!(
            "Model {} produces {}-dimensional vectors, expected {expected}",
            info.model, info.dimensions
        )))
    }
}
