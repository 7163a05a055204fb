//! vecbridge - local embedding service and vector store export
//!
//! This crate backs two binaries: `embed-server`, a loopback HTTP service
//! that turns text into unit-length vectors, and `vector-export`, which
//! dumps a vector store collection to CSV for bulk import elsewhere.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interfaces using clap
//! - [`config`] - Settings resolution (flags, env, config file, defaults)
//! - [`embeddings`] - Model providers and the lazily loaded model handle
//! - [`server`] - HTTP routes and serving
//! - [`store`] - SQLite-backed persistent vector store
//! - [`export`] - Collection to CSV export
//! - [`logging`] - Tracing setup
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod export;
pub mod logging;
pub mod server;
pub mod store;

pub use error::{Error, Result};
