//! Entry point: parse CLI flags, initialize logging, run the comparison,
//! and report a summary. Only a `Config`-kind error (bad flags, a
//! connection string that won't even parse, or a report sink that can't be
//! bootstrapped) turns into a non-zero exit; a run that completes with some
//! failed workers still exits 0 (SPEC_FULL.md §7).

use clap::Parser;
use db_comparer::config::{Cli, RunConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match RunConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match db_comparer::run(&config) {
        Ok(summary) => {
            println!(
                "compared databases: {} rows reported to output database, {} worker(s) failed",
                summary.rows_reported,
                summary.failed_workers.len()
            );
            for failure in &summary.failed_workers {
                eprintln!("  failed: {failure}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "comparison did not start");
            if e.is_fatal() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}
