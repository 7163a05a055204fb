//! Model2Vec embedding provider.
//!
//! Loads a static embedding model from a local snapshot directory. The model
//! is read entirely into memory on construction, so loading is the slow part
//! and encoding afterwards is cheap.

use crate::error::{Error, Result};
use model2vec_rs::model::StaticModel;
use std::path::{Path, PathBuf};

use super::provider::EmbeddingProvider;
use super::types::ProviderInfo;

/// Local Model2Vec provider.
pub struct Model2VecProvider {
    model: StaticModel,
    /// Reported model name (e.g. "BAAI/bge-m3")
    model_name: String,
    /// Directory the model was loaded from
    path: PathBuf,
    /// Output dimensions, measured after load
    dimensions: usize,
}

impl Model2VecProvider {
    /// Load a model from a local directory.
    ///
    /// Output vectors are normalized by the model itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or the model files cannot
    /// be loaded.
    pub fn from_path(path: &Path, model_name: &str) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Embedding(format!(
                "Model path not found: {}",
                path.display()
            )));
        }

        let model = StaticModel::from_pretrained(
            path,
            None,       // Local files, no HF token
            Some(true), // Normalize embeddings
            None,       // No subfolder
        )
        .map_err(|e| {
            Error::Embedding(format!("Failed to load model from '{}': {e}", path.display()))
        })?;

        let dimensions = model
            .encode(&[String::from("dimension_check")])
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::Embedding("Model returned no embeddings".into()))?;

        Ok(Self {
            model,
            model_name: model_name.to_string(),
            path: path.to_path_buf(),
            dimensions,
        })
    }

    /// Directory the model was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EmbeddingProvider for Model2VecProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "model2vec".to_string(),
            model: self.model_name.clone(),
            dimensions: self.dimensions,
        }
    }

    fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.encode(texts);

        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Model returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_fails_fast() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-model-here");

        let err = Model2VecProvider::from_path(&missing, "test/model")
            .err()
            .expect("load should fail");
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("not found"));
    }
}
