//! bulkget CLI

use anyhow::Context;
use bulkget::cli::{normalize_args, Cli};
use clap::Parser;
use log::LevelFilter;

/// Exit status when any worker recorded an error
const EXIT_PARTIAL_FAILURE: i32 = 4;

/// Crates that flood debug output with per-request detail
const NOISY_TARGETS: [&str; 5] = ["aws", "hyper", "h2", "rustls", "reqwest"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let mut logger = env_logger::Builder::new();
    logger.filter_level(cli.log_level());
    if cli.verbose < 2 {
        for target in NOISY_TARGETS {
            logger.filter_module(target, LevelFilter::Warn);
        }
    }
    // RUST_LOG overrides the flags
    logger.parse_default_env().init();

    let summary = bulkget::run::execute(cli.into_config())
        .await
        .context("setup failed")?;

    eprintln!();
    eprintln!("Run completed:");
    eprintln!("  Cycles:          {}", summary.cycles);
    eprintln!("  Keys processed:  {}", summary.processed);
    eprintln!("  Bytes:           {}", format_bytes(summary.bytes));
    if summary.skipped > 0 {
        eprintln!("  Deletes skipped: {}", summary.skipped);
    }
    if summary.cancelled {
        eprintln!("  Interrupted before completion");
    }
    if summary.failed() {
        eprintln!("  Errors:          {}", summary.errors);
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }

    Ok(())
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
