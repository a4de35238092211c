//! Strategy execution.
//!
//! A rule file names one or more strategies. Each is built from its
//! validated [`StrategyConfig`] into a [`Strategy`] and executed by the
//! [`StrategyRunner`] in name order. The runner stops at the first failed
//! strategy; work already done by earlier strategies is not rolled back.
//!
//! # Example
//!
//! ```no_run
//! use file_cleaner::config::Config;
//! use file_cleaner::lock::{default_lock_path, ProcessLock};
//! use file_cleaner::strategy::{RunOptions, StrategyRunner};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("rules.json")).unwrap();
//! let lock = ProcessLock::acquire(&default_lock_path()).unwrap();
//! let runner = StrategyRunner::from_config(&config, RunOptions::dry_run());
//! let report = runner.run(&lock.permit()).unwrap();
//! println!("{} duplicate(s) found", report.duplicates_found());
//! ```

pub mod dedupe;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::actions::ResolutionReport;
use crate::config::{Config, StrategyConfig, StrategyKind};
use crate::lock::RunPermit;
use crate::scanner::{PathResolutionError, ScanError};

pub use crate::actions::RunOptions;
pub use dedupe::{DedupeState, DedupeStrategy};

/// Errors that abort a single strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The target tree does not exist.
    #[error("Target directory does not exist: {0}")]
    TargetMissing(PathBuf),

    /// A configured path could not be resolved for comparison.
    #[error(transparent)]
    PathResolution(#[from] PathResolutionError),

    /// A source tree can enumerate paths of the target tree.
    #[error("Source {source_dir} overlaps target {target}; refusing to run")]
    Overlap {
        /// The offending source root
        source_dir: PathBuf,
        /// The strategy's target root
        target: PathBuf,
    },

    /// Indexing a tree failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A shutdown was requested.
    #[error("Run interrupted by user")]
    Interrupted,
}

/// Outcome of one successfully executed strategy.
#[derive(Debug, Clone, Default)]
pub struct StrategyReport {
    /// Strategy name from the rule file
    pub name: String,
    /// Entries indexed in the target tree
    pub target_files: usize,
    /// Entries indexed across all source trees
    pub source_files: usize,
    /// Source files found to duplicate a target file
    pub duplicates_found: usize,
    /// Per-duplicate results
    pub resolution: ResolutionReport,
    /// Wall time of the strategy
    pub elapsed: Duration,
}

impl StrategyReport {
    /// Create an empty report for `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Whether every duplicate was resolved.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.resolution.all_succeeded()
    }
}

/// Aggregate of all strategy reports of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Reports in execution order
    pub strategies: Vec<StrategyReport>,
}

impl RunReport {
    /// Total entries indexed (target and source trees).
    #[must_use]
    pub fn files_indexed(&self) -> usize {
        self.strategies
            .iter()
            .map(|s| s.target_files + s.source_files)
            .sum()
    }

    /// Total duplicates found.
    #[must_use]
    pub fn duplicates_found(&self) -> usize {
        self.strategies.iter().map(|s| s.duplicates_found).sum()
    }

    /// Bytes moved (or that would be moved) out of source trees.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.strategies
            .iter()
            .map(|s| s.resolution.bytes_reclaimed)
            .sum()
    }

    /// Total failed resolutions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.strategies
            .iter()
            .map(|s| s.resolution.failure_count())
            .sum()
    }

    /// Whether every duplicate of every strategy was resolved.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.strategies.iter().all(StrategyReport::all_succeeded)
    }
}

/// A strategy failed; the run stopped there.
#[derive(Debug, Error)]
#[error("Strategy {name:?} failed")]
pub struct RunError {
    /// Name of the failed strategy
    pub name: String,
    /// Why it failed
    #[source]
    pub source: StrategyError,
    /// Reports of the strategies that completed before it
    pub completed: RunReport,
}

impl RunError {
    /// Whether the run stopped because of a shutdown request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self.source, StrategyError::Interrupted)
    }
}

/// An executable strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Remove source files already present in the target tree.
    SourceToTargetDedupe(DedupeStrategy),
}

impl Strategy {
    /// Build the strategy named `name` from its validated config.
    #[must_use]
    pub fn load(name: &str, config: &StrategyConfig) -> Self {
        match config {
            StrategyConfig::SourceToTargetDedupe(dedupe) => {
                Self::SourceToTargetDedupe(DedupeStrategy::new(name, dedupe.clone()))
            }
        }
    }

    /// Strategy name from the rule file.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SourceToTargetDedupe(s) => s.name(),
        }
    }

    /// Kind tag of this strategy.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SourceToTargetDedupe(_) => StrategyKind::SourceToTargetDedupe,
        }
    }

    /// Run the strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`StrategyError`] if the strategy had to stop.
    pub fn execute(
        &self,
        options: RunOptions,
        permit: &RunPermit<'_>,
        shutdown: Option<&Arc<AtomicBool>>,
    ) -> Result<StrategyReport, StrategyError> {
        match self {
            Self::SourceToTargetDedupe(s) => s.execute(options, permit, shutdown),
        }
    }
}

/// Executes a rule file's strategies in order.
#[derive(Debug)]
pub struct StrategyRunner {
    strategies: Vec<Strategy>,
    options: RunOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl StrategyRunner {
    /// Build every strategy of `config`, in name order.
    #[must_use]
    pub fn from_config(config: &Config, options: RunOptions) -> Self {
        let strategies = config
            .strategies
            .iter()
            .map(|(name, strategy)| Strategy::load(name, strategy))
            .collect();
        Self {
            strategies,
            options,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag checked between files.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Execute every strategy while `permit` is held.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] for the first strategy that fails; later
    /// strategies are not started.
    pub fn run(&self, permit: &RunPermit<'_>) -> Result<RunReport, RunError> {
        let mut report = RunReport::default();

        for strategy in &self.strategies {
            log::info!("Execute: {} ({})", strategy.name(), strategy.kind());
            match strategy.execute(self.options, permit, self.shutdown_flag.as_ref()) {
                Ok(strategy_report) => report.strategies.push(strategy_report),
                Err(source) => {
                    return Err(RunError {
                        name: strategy.name().to_string(),
                        source,
                        completed: report,
                    });
                }
            }
        }

        Ok(report)
    }
}
