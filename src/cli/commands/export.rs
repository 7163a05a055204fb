//! `vector-export` command.
//!
//! Walks through the export the way an operator reads it: numbered steps,
//! periodic progress, then a summary. With `--json` only the final result
//! object is printed.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;

use crate::cli::ExportCli;
use crate::config::{ExportConfig, load_config_or_default};
use crate::error::Error;
use crate::export::{ExportEvent, ExportStats, Exporter};
use crate::store::VectorStore;

/// Errors shown in the summary before collapsing the rest.
const ERROR_PREVIEW_LIMIT: usize = 5;

/// Run the export and report the result.
///
/// Returns success iff at least one row was exported.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the collection is
/// missing, or the output cannot be written.
pub fn execute(cli: &ExportCli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = ExportConfig::resolve(
        cli.store.clone(),
        cli.collection.clone(),
        cli.output.clone(),
        &load_config_or_default(),
    );
    let chatty = !cli.json && !cli.quiet;

    if !config.store_path.exists() {
        if cli.json {
            let err = Error::StoreNotFound {
                path: config.store_path.clone(),
            };
            eprintln!("{}", err.to_structured_json());
        } else {
            eprintln!(
                "{} Vector store path not found: {}",
                "ERROR:".red().bold(),
                config.store_path.display()
            );
        }
        return Ok(ExitCode::FAILURE);
    }

    if chatty {
        print_header(&config);
        println!("1. Connecting to vector store...");
    }
    let store = VectorStore::open_read_only(&config.store_path).with_context(|| {
        format!("Failed to open vector store at {}", config.store_path.display())
    })?;

    if chatty {
        println!("2. Loading collection '{}'...", config.collection);
    }
    let mut exporter = Exporter::new(&store, config.collection.as_str(), config.output.as_path());
    if chatty {
        exporter = exporter.on_event(print_event);
    }
    let stats = exporter
        .export()
        .with_context(|| format!("Export of collection '{}' failed", config.collection))?;

    if cli.json {
        let output = serde_json::json!({
            "success": stats.is_success(),
            "collection": config.collection,
            "output": config.output.display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if !cli.quiet {
        print_summary(&stats, &config.output);
    }

    Ok(ExitCode::from(stats.exit_code()))
}

fn print_header(config: &ExportConfig) {
    println!("{}", "=== Vector Store to CSV Export ===".bold());
    println!("Store:      {}", config.store_path.display());
    println!("Collection: {}", config.collection);
    println!("Output CSV: {}", config.output.display());
    println!();
}

fn print_event(event: &ExportEvent) {
    match event {
        ExportEvent::CollectionLoaded { total, .. } => {
            println!("   Total embeddings: {total}");
            if *total == 0 {
                println!("   {} No embeddings found in collection", "ERROR:".red());
            }
        }
        ExportEvent::Fetched { count } => {
            println!("3. Fetching all embeddings...");
            println!("   Fetched {count} records");
        }
        ExportEvent::Validated { dimensions } => {
            println!("4. Validating data...");
            match dimensions.as_slice() {
                [dim] => println!("   All embeddings have {dim} dimensions"),
                [] => println!("   No readable embeddings"),
                _ => println!(
                    "   {} Inconsistent dimensions: {dimensions:?}",
                    "WARNING:".yellow()
                ),
            }
        }
        ExportEvent::Writing { path } => println!("5. Writing to CSV: {path}"),
        ExportEvent::Progress { processed, total } => {
            println!("   Progress: {processed}/{total}");
        }
    }
}

fn print_summary(stats: &ExportStats, output: &Path) {
    println!("   Exported: {}", stats.exported_count);
    println!("   Skipped: {}", stats.skipped_count);

    if !stats.errors.is_empty() {
        println!("   Errors: {}", stats.errors.len());
        let (shown, more) = stats.error_preview(ERROR_PREVIEW_LIMIT);
        for error in shown {
            println!("     - {error}");
        }
        if more > 0 {
            println!("     ... and {more} more");
        }
    }

    println!();
    println!("{}", "=== Export Complete ===".green().bold());
    println!("Exported: {}", stats.exported_count);
    println!("Skipped: {}", stats.skipped_count);
    println!("Total: {}", stats.total_count);
    println!("Output: {}", output.display());
    if !stats.errors.is_empty() {
        println!("Errors: {}", stats.errors.len());
    }

    println!();
    if stats.is_success() {
        println!("{}", "Next step:".cyan().bold());
        println!(
            "  Bulk-import the file into the relational store, e.g. CSV_FILE={}",
            output.display()
        );
    } else {
        println!("{} No embeddings exported", "ERROR:".red().bold());
    }
}
