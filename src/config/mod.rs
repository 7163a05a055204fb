//! Configuration management.
//!
//! Both binaries resolve every setting with the same precedence:
//!
//! 1. CLI flag (clap also fills these from environment variables)
//! 2. `~/.vecbridge/config.json`
//! 3. Compiled-in default
//!
//! With no flags, no environment and no config file, the tools behave
//! exactly like the fixed deployment they were written for.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Default listening port of the embedding service.
pub const DEFAULT_PORT: u16 = 8001;

/// The service only ever binds to loopback.
pub const BIND_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Local snapshot of the embedding model.
pub const DEFAULT_MODEL_PATH: &str = "/opt/models/bge-m3";

/// Model name reported by the health descriptor.
pub const MODEL_NAME: &str = "BAAI/bge-m3";

/// Embedding dimension reported by the health descriptor.
///
/// A loaded model whose output width differs is rejected.
pub const EMBEDDING_DIM: usize = 1024;

/// Persist directory of the source vector store.
pub const DEFAULT_STORE_PATH: &str = "data/vectordb";

/// Collection exported by default.
pub const DEFAULT_COLLECTION: &str = "phones";

/// Where the export file is written by default.
pub const DEFAULT_OUTPUT_CSV: &str = "/tmp/phones_embeddings.csv";

// ── Config file ───────────────────────────────────────────────

/// Contents of `~/.vecbridge/config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub export: Option<ExportFileConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub backend: Option<Backend>,
}

/// Which engine loads the model directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Full XLM-RoBERTa transformer (BGE-M3 snapshots)
    #[default]
    XlmRoberta,
    /// Distilled static embeddings
    Model2vec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportFileConfig {
    pub store_path: Option<PathBuf>,
    pub collection: Option<String>,
    pub output: Option<PathBuf>,
}

/// Get the config file path.
fn config_path() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".vecbridge").join("config.json"))
        .ok_or(Error::Config("Could not determine home directory".into()))
}

/// Load a config file from an explicit path.
///
/// A missing file yields the default (empty) config.
pub fn load_config_from(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Load `~/.vecbridge/config.json`.
pub fn load_config() -> Result<FileConfig> {
    load_config_from(&config_path()?)
}

/// Load the config file, falling back to defaults on any problem.
///
/// A broken config file should never keep the tools from starting.
#[must_use]
pub fn load_config_or_default() -> FileConfig {
    match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring config file: {e}");
            FileConfig::default()
        }
    }
}

// ── Resolved settings ─────────────────────────────────────────

/// Effective settings of the embedding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub model_path: PathBuf,
    pub backend: Backend,
    pub model_name: String,
    pub dimensions: usize,
}

impl ServerConfig {
    /// Resolve server settings: flag > config file > default.
    #[must_use]
    pub fn resolve(
        port: Option<u16>,
        model_path: Option<PathBuf>,
        backend: Option<Backend>,
        file: &FileConfig,
    ) -> Self {
        let from_file = file.server.clone().unwrap_or_default();

        Self {
            port: port.or(from_file.port).unwrap_or(DEFAULT_PORT),
            model_path: model_path
                .or(from_file.model_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            backend: backend.or(from_file.backend).unwrap_or_default(),
            model_name: MODEL_NAME.to_string(),
            dimensions: EMBEDDING_DIM,
        }
    }

    /// Loopback socket address to bind.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((BIND_HOST, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::resolve(None, None, None, &FileConfig::default())
    }
}

/// Effective settings of the export tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub store_path: PathBuf,
    pub collection: String,
    pub output: PathBuf,
}

impl ExportConfig {
    /// Resolve export settings: flag > config file > default.
    #[must_use]
    pub fn resolve(
        store_path: Option<PathBuf>,
        collection: Option<String>,
        output: Option<PathBuf>,
        file: &FileConfig,
    ) -> Self {
        let from_file = file.export.clone().unwrap_or_default();

        Self {
            store_path: store_path
                .or(from_file.store_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
            collection: collection
                .filter(|c| !c.is_empty())
                .or(from_file.collection)
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            output: output
                .or(from_file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_CSV)),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::resolve(None, None, None, &FileConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8001);
        assert_eq!(config.model_name, "BAAI/bge-m3");
        assert_eq!(config.dimensions, 1024);
        assert_eq!(config.backend, Backend::XlmRoberta);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8001");
    }

    #[test]
    fn test_server_flag_beats_file() {
        let file = FileConfig {
            server: Some(ServerFileConfig {
                port: Some(9000),
                model_path: Some(PathBuf::from("/from/file")),
                backend: Some(Backend::Model2vec),
            }),
            export: None,
        };

        let config = ServerConfig::resolve(Some(9100), None, None, &file);
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/from/file"));
        assert_eq!(config.backend, Backend::Model2vec);
        assert!(config.bind_addr().ip().is_loopback());
    }

    #[test]
    fn test_export_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.collection, "phones");
        assert_eq!(config.output, PathBuf::from("/tmp/phones_embeddings.csv"));
    }

    #[test]
    fn test_export_file_layer() {
        let file = FileConfig {
            server: None,
            export: Some(ExportFileConfig {
                store_path: None,
                collection: Some("tablets".into()),
                output: Some(PathBuf::from("/tmp/out.csv")),
            }),
        };

        let config = ExportConfig::resolve(Some(PathBuf::from("/store")), None, None, &file);
        assert_eq!(config.store_path, PathBuf::from("/store"));
        assert_eq!(config.collection, "tablets");
        assert_eq!(config.output, PathBuf::from("/tmp/out.csv"));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert!(config.server.is_none());
        assert!(config.export.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"server": {"port": 8123, "backend": "model2vec"}}"#).unwrap();

        let server = load_config_from(&path).unwrap().server.unwrap();
        assert_eq!(server.port, Some(8123));
        assert_eq!(server.backend, Some(Backend::Model2vec));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_structured_json()["error"]["code"], "CONFIG_ERROR");
    }
}
