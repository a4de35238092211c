//! file-cleaner - rule-driven duplicate cleanup
//!
//! Removes files from source directories that already exist, byte for byte,
//! in a target directory. Duplicates are moved into a timestamped trash
//! directory and can be replaced with symlinks to the kept copy.

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod scanner;
pub mod signal;
pub mod strategy;

use anyhow::Context;
use bytesize::ByteSize;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::lock::ProcessLock;
use crate::strategy::{RunReport, StrategyRunner};

/// Run the application for parsed CLI arguments.
///
/// Loads and validates the rule file, takes the process lock, and executes
/// every strategy. Returns [`ExitCode::GeneralError`] when all strategies
/// ran but some duplicates could not be resolved.
///
/// # Errors
///
/// Returns an error if the rule file is invalid, the lock is held
/// elsewhere, or a strategy fails. A [`strategy::RunError`] in the chain
/// marks an interrupted run.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let options = cli.run_options();
    log::info!(
        "file-cleaner {} (dry_run={}, replace_as_symlink={})",
        env!("CARGO_PKG_VERSION"),
        options.dry_run,
        options.replace_with_symlink
    );
    if options.dry_run {
        log::info!("Dry run: nothing will be moved; pass --dry-run=false to apply");
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load rules from {}", cli.config.display()))?;
    if config.strategies.is_empty() {
        log::warn!("No strategies configured in {}", cli.config.display());
    }

    let lock = ProcessLock::acquire(&cli.lock_path()).context("Cannot start run")?;
    let shutdown = signal::install_handler()?;

    let runner =
        StrategyRunner::from_config(&config, options).with_shutdown_flag(shutdown.get_flag());
    let report = match runner.run(&lock.permit()) {
        Ok(report) => report,
        Err(e) => {
            log_summary(&e.completed);
            return Err(e.into());
        }
    };

    log_summary(&report);
    if report.all_succeeded() {
        return Ok(ExitCode::Success);
    }

    log::error!(
        "{} duplicate(s) could not be resolved:",
        report.failure_count()
    );
    for strategy in &report.strategies {
        for (path, reason) in &strategy.resolution.failures {
            log::error!("  [{}] {}: {}", strategy.name, path.display(), reason);
        }
    }
    Ok(ExitCode::GeneralError)
}

fn log_summary(report: &RunReport) {
    log::info!(
        "Summary: {} strateg{} run, {} entries indexed, {} duplicate(s), {} reclaimable, {} failure(s)",
        report.strategies.len(),
        if report.strategies.len() == 1 { "y" } else { "ies" },
        report.files_indexed(),
        report.duplicates_found(),
        ByteSize::b(report.bytes_reclaimed()),
        report.failure_count()
    );
}
