//! `embed-server` command.

use anyhow::Context;
use tracing::{error, info};

use crate::cli::ServerCli;
use crate::config::{ServerConfig, load_config_or_default};
use crate::embeddings::{LoadStatus, model_handle};
use crate::server;

/// Resolve settings and run the service until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn execute(cli: &ServerCli) -> anyhow::Result<()> {
    let config = ServerConfig::resolve(
        cli.port,
        cli.model_path.clone(),
        cli.backend,
        &load_config_or_default(),
    );
    info!(
        model = %config.model_name,
        path = %config.model_path.display(),
        backend = ?config.backend,
        "Model will be loaded from disk"
    );

    let model = model_handle(&config);

    if cli.preload {
        match model.ensure_loaded().await {
            LoadStatus::Ready => info!("Model preloaded"),
            // Later requests retry the load.
            status => error!("Model preload did not complete: {status}"),
        }
    }

    let addr = config.bind_addr();
    server::serve(config, model)
        .await
        .with_context(|| format!("Embedding server on {addr} failed"))
}
