//! XLM-RoBERTa dense encoder (BGE-M3 and friends).
//!
//! Loads a Hugging Face snapshot directory with `config.json`,
//! `tokenizer.json` and either `model.safetensors` or `pytorch_model.bin`,
//! runs the transformer on the CPU and pools with the first (CLS) token,
//! which is how BGE-M3 produces its dense vector.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XlmRobertaConfig, XLMRobertaModel};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{Error, Result};

use super::provider::EmbeddingProvider;
use super::types::ProviderInfo;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

/// Texts per forward pass. Larger requests are split into chunks of this size.
pub const MAX_BATCH: usize = 32;

/// The handful of config fields the provider reads itself.
#[derive(Debug, Deserialize)]
struct ModelShape {
    hidden_size: usize,
    max_position_embeddings: usize,
    #[serde(default = "default_pad_token_id")]
    pad_token_id: u32,
}

const fn default_pad_token_id() -> u32 {
    1
}

impl ModelShape {
    /// Longest token sequence the position table can address.
    ///
    /// XLM-R positions start after the padding index.
    fn max_tokens(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.pad_token_id as usize + 1)
            .max(1)
    }
}

fn load_failed(path: &Path, what: &str, e: impl Display) -> Error {
    Error::Embedding(format!("Failed to load {what} from '{}': {e}", path.display()))
}

fn inference_failed(e: impl Display) -> Error {
    Error::Embedding(format!("Inference failed: {e}"))
}

/// Local XLM-RoBERTa provider.
pub struct XlmRobertaProvider {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    pad_id: u32,
    model_name: String,
    path: PathBuf,
    dimensions: usize,
}

impl XlmRobertaProvider {
    /// Load a snapshot directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any required file is missing,
    /// or the weights do not match the config.
    pub fn from_path(path: &Path, model_name: &str) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Embedding(format!(
                "Model path not found: {}",
                path.display()
            )));
        }

        let config_path = path.join(CONFIG_FILE);
        let raw_config =
            fs::read_to_string(&config_path).map_err(|e| load_failed(&config_path, "config", e))?;
        let shape: ModelShape =
            serde_json::from_str(&raw_config).map_err(|e| load_failed(&config_path, "config", e))?;
        let config: XlmRobertaConfig =
            serde_json::from_str(&raw_config).map_err(|e| load_failed(&config_path, "config", e))?;

        let tokenizer_path = path.join(TOKENIZER_FILE);
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_failed(&tokenizer_path, "tokenizer", e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: shape.max_tokens(),
                ..TruncationParams::default()
            }))
            .map_err(|e| load_failed(&tokenizer_path, "tokenizer", e))?;

        let device = Device::Cpu;
        let vb = load_weights(path, &device)?;
        let model =
            XLMRobertaModel::new(&config, vb).map_err(|e| load_failed(path, "weights", e))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            pad_id: shape.pad_token_id,
            model_name: model_name.to_string(),
            path: path.to_path_buf(),
            dimensions: shape.hidden_size,
        })
    }

    /// Directory the model was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One forward pass over at most [`MAX_BATCH`] texts.
    fn encode_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(inference_failed)?;

        let batch = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        // Right-pad with the padding id so position ids stay correct.
        let mut ids = vec![self.pad_id; batch * seq_len];
        let mut mask = vec![0_u32; batch * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * seq_len;
            for (col, (&id, &m)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                ids[offset + col] = id;
                mask[offset + col] = m;
            }
        }

        let input_ids =
            Tensor::from_vec(ids, (batch, seq_len), &self.device).map_err(inference_failed)?;
        let attention_mask =
            Tensor::from_vec(mask, (batch, seq_len), &self.device).map_err(inference_failed)?;
        let token_type_ids = input_ids.zeros_like().map_err(inference_failed)?;

        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(inference_failed)?;

        // CLS pooling: [batch, seq, hidden] -> [batch, hidden]
        hidden
            .narrow(1, 0, 1)
            .and_then(|cls| cls.squeeze(1))
            .and_then(|cls| cls.to_dtype(DType::F32))
            .and_then(|cls| cls.to_vec2::<f32>())
            .map_err(inference_failed)
    }
}

/// Read the weights into memory. Checkpoints saved from a task model carry
/// a `roberta.` prefix, which is stripped.
fn load_weights(dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = dir.join(SAFETENSORS_FILE);
    let pytorch = dir.join(PYTORCH_FILE);

    let tensors: Vec<(String, Tensor)> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)
            .map_err(|e| load_failed(&safetensors, "weights", e))?
            .into_iter()
            .collect()
    } else if pytorch.exists() {
        candle_core::pickle::read_all(&pytorch).map_err(|e| load_failed(&pytorch, "weights", e))?
    } else {
        return Err(Error::Embedding(format!(
            "No {SAFETENSORS_FILE} or {PYTORCH_FILE} in {}",
            dir.display()
        )));
    };

    let tensors: HashMap<String, Tensor> = tensors
        .into_iter()
        .map(|(name, tensor)| match name.strip_prefix("roberta.") {
            Some(stripped) => (stripped.to_string(), tensor),
            None => (name, tensor),
        })
        .collect();

    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

impl EmbeddingProvider for XlmRobertaProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "xlm-roberta".to_string(),
            model: self.model_name.clone(),
            dimensions: self.dimensions,
        }
    }

    fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            embeddings.extend(self.encode_chunk(chunk)?);
        }
        Ok(embeddings)
    }
}
