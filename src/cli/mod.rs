//! CLI definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Backend;

pub mod commands;

/// Local embedding service
#[derive(Parser, Debug)]
#[command(name = "embed-server", author, version, about, long_about = None)]
pub struct ServerCli {
    /// Port to listen on (loopback only)
    #[arg(long, short, env = "BGE_M3_PORT")]
    pub port: Option<u16>,

    /// Directory holding the model files
    #[arg(long, env = "BGE_M3_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Engine used to load the model directory
    #[arg(long, value_enum, env = "BGE_M3_BACKEND")]
    pub backend: Option<Backend>,

    /// Load the model before accepting requests instead of on first use
    #[arg(long)]
    pub preload: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no logging)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Export a vector store collection to CSV for bulk import
#[derive(Parser, Debug)]
#[command(name = "vector-export", author, version, about, long_about = None)]
pub struct ExportCli {
    /// Vector store directory
    #[arg(long, env = "VECTOR_STORE_PATH")]
    pub store: Option<PathBuf>,

    /// Collection to export
    #[arg(long, env = "VECTOR_COLLECTION")]
    pub collection: Option<String>,

    /// Output CSV file
    #[arg(long, short, env = "VECTOR_EXPORT_CSV")]
    pub output: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
