//! Vector export entry point.

use clap::Parser;
use std::process::ExitCode;
use vecbridge::cli::{ExportCli, commands};
use vecbridge::error::Error;
use vecbridge::logging::{LogProfile, init_tracing};

fn main() -> ExitCode {
    let cli = ExportCli::parse();
    init_tracing(LogProfile::Cli, cli.verbose, cli.quiet);

    match commands::export::execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                let structured = e.downcast_ref::<Error>().map_or_else(
                    || serde_json::json!({ "error": { "message": format!("{e:#}") } }),
                    Error::to_structured_json,
                );
                eprintln!("{structured}");
            } else {
                eprintln!("ERROR: {e:?}");
                if let Some(hint) = e.downcast_ref::<Error>().and_then(Error::hint) {
                    eprintln!("  Hint: {hint}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
