//! Embedding HTTP service.
//!
//! | Route                    | Handler                  |
//! |--------------------------|--------------------------|
//! | `GET  /health`           | [`routes::health`]       |
//! | `POST /embeddings`       | [`routes::embed`]        |
//! | `POST /embeddings/batch` | [`routes::embed_batch`]  |
//!
//! Every request first passes through [`ensure_model`], which triggers the
//! lazy model load. The middleware never fails a request; handlers decide
//! whether a missing model means 503.
//!
//! There is no request timeout, body size limit or concurrency limit here.
//! Callers are expected to bound their own waits and batch sizes.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::embeddings::{LoadStatus, ModelHandle};
use crate::error::Result;

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/embeddings", post(routes::embed))
        .route("/embeddings/batch", post(routes::embed_batch))
        .layer(from_fn_with_state(state.clone(), ensure_model))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the model on the first request of any kind.
pub async fn ensure_model(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let LoadStatus::Failed(reason) = state.model.ensure_loaded().await {
        tracing::debug!(path = %request.uri().path(), "Serving without model: {reason}");
    }
    next.run(request).await
}

/// Bind to loopback and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(config: ServerConfig, model: ModelHandle) -> Result<()> {
    let addr = config.bind_addr();
    let app = router(AppState::new(config, model));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting embedding server on {addr}...");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Embedding server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
