//! Embedding provider trait.
//!
//! Defines the interface every embedding backend implements. Calls are
//! synchronous and CPU-bound; the HTTP layer runs them on the blocking pool.

use crate::error::{Error, Result};
use std::sync::Arc;

use super::types::ProviderInfo;

/// Trait for embedding providers.
///
/// The trait is object-safe so the service can hold any provider behind
/// an `Arc<dyn EmbeddingProvider>` once the model is loaded.
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider metadata.
    fn info(&self) -> ProviderInfo;

    /// Generate embeddings for multiple texts, one vector per text, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model fails.
    fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    ///
    /// Default implementation calls `generate_embeddings` with one text.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails or returns nothing.
    fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embeddings(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Model returned no embeddings".into()))
    }
}

/// Shared handle to a loaded provider.
pub type SharedProvider = Arc<dyn EmbeddingProvider>;
