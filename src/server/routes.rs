//! Request handlers.
//!
//! Input is validated before the model is consulted, so a bad request is
//! rejected with 400 even while the model is unavailable and never reaches
//! the model.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::embeddings::{SharedProvider, normalize_all};

/// Body of `POST /embeddings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of `POST /embeddings/batch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEmbedRequest {
    #[serde(default)]
    pub texts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Fixed service descriptor returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimensions: usize,
}

/// `GET /health`. Always succeeds, whatever the model state.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.config.model_name.clone(),
        dimensions: state.config.dimensions,
    })
}

/// `POST /embeddings`.
pub async fn embed(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> ApiResult<Json<EmbedResponse>> {
    let Json(request) = payload?;
    let text = request
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing text".to_string()))?;

    let provider = state.model.require()?;
    let embedding = encode(provider, vec![text])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("Model returned no embeddings".to_string()))?;

    Ok(Json(EmbedResponse { embedding }))
}

/// `POST /embeddings/batch`. Output order matches input order.
pub async fn embed_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchEmbedRequest>, JsonRejection>,
) -> ApiResult<Json<BatchEmbedResponse>> {
    let Json(request) = payload?;
    let texts = request
        .texts
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing texts".to_string()))?;

    let provider = state.model.require()?;
    let embeddings = encode(provider, texts).await?;

    Ok(Json(BatchEmbedResponse { embeddings }))
}

/// Run the model on the blocking pool and normalize the output.
async fn encode(provider: SharedProvider, texts: Vec<String>) -> ApiResult<Vec<Vec<f32>>> {
    let expected = texts.len();
    let vectors = tokio::task::spawn_blocking(move || provider.generate_embeddings(&texts))
        .await
        .map_err(|e| ApiError::Internal(format!("Embedding task failed: {e}")))??;

    if vectors.len() != expected {
        return Err(ApiError::Internal(format!(
            "Model returned {} embeddings for {expected} texts",
            vectors.len()
        )));
    }

    Ok(normalize_all(vectors))
}
