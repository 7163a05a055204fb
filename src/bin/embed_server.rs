//! Embedding service entry point.

use clap::Parser;
use std::process::ExitCode;
use vecbridge::cli::{ServerCli, commands};
use vecbridge::logging::{LogProfile, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = ServerCli::parse();
    init_tracing(LogProfile::Server, cli.verbose, cli.quiet);

    match commands::serve::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
