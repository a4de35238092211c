//! `source_to_target_dedupe`: remove source files already present in the target.
//!
//! # Pipeline
//!
//! 1. Validate that the target tree exists, then index it.
//! 2. For each source tree, in configured order:
//!    - refuse to continue if it overlaps the target,
//!    - index it,
//!    - for every source file, look up same-size target entries and resolve
//!      the source against the first one with identical content.
//!
//! A source file is resolved at most once. Resolution failures are
//! recorded per file and do not stop the pipeline; everything else does.
//! The shutdown flag is checked between files, never between the move and
//! the symlink of one duplicate.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytesize::ByteSize;

use super::{RunOptions, StrategyError, StrategyReport};
use crate::actions::DuplicateResolver;
use crate::config::{DedupeConfig, DirSpec};
use crate::lock::RunPermit;
use crate::scanner::{overlaps, ScanError, TreeIndex, Walker};

/// Pipeline position, logged at debug level as the strategy advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeState {
    NotStarted,
    TargetValidated,
    TargetIndexed,
    IndependenceChecked,
    SourceIndexed,
    Resolved,
    Done,
    Failed,
}

#[derive(Debug)]
struct StateTracker<'a> {
    name: &'a str,
    state: DedupeState,
}

impl<'a> StateTracker<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            state: DedupeState::NotStarted,
        }
    }

    fn advance(&mut self, next: DedupeState) {
        log::debug!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
    }
}

/// A configured `source_to_target_dedupe` strategy.
#[derive(Debug, Clone)]
pub struct DedupeStrategy {
    name: String,
    config: DedupeConfig,
}

impl DedupeStrategy {
    /// Create the strategy `name`.
    #[must_use]
    pub fn new(name: &str, config: DedupeConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
        }
    }

    /// Strategy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// - [`StrategyError::TargetMissing`] if the target tree does not exist
    /// - [`StrategyError::Overlap`] if a source tree overlaps the target
    /// - [`StrategyError::PathResolution`] if a root cannot be made absolute
    /// - [`StrategyError::Scan`] if indexing fails
    /// - [`StrategyError::Interrupted`] on shutdown request
    pub fn execute(
        &self,
        options: RunOptions,
        permit: &RunPermit<'_>,
        shutdown: Option<&Arc<AtomicBool>>,
    ) -> Result<StrategyReport, StrategyError> {
        let start = Instant::now();
        let mut tracker = StateTracker::new(&self.name);

        log::info!(
            "Strategy {}: target {} (dry_run={}, replace_with_symlink={})",
            self.name,
            self.config.target.path.display(),
            options.dry_run,
            options.replace_with_symlink
        );
        log::debug!("Holding lock {}", permit.lock_path().display());

        match self.run_pipeline(options, shutdown, &mut tracker) {
            Ok(mut report) => {
                report.elapsed = start.elapsed();
                log::info!(
                    "Strategy {} finished in {:.2?}: {} duplicate(s), {} resolved, {} failed, {} reclaimable",
                    self.name,
                    report.elapsed,
                    report.duplicates_found,
                    report.resolution.success_count(),
                    report.resolution.failure_count(),
                    ByteSize::b(report.resolution.bytes_reclaimed)
                );
                Ok(report)
            }
            Err(e) => {
                tracker.advance(DedupeState::Failed);
                log::error!(
                    "Strategy {} failed after {:.2?}: {}",
                    self.name,
                    start.elapsed(),
                    e
                );
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &self,
        options: RunOptions,
        shutdown: Option<&Arc<AtomicBool>>,
        tracker: &mut StateTracker<'_>,
    ) -> Result<StrategyReport, StrategyError> {
        let target = &self.config.target;

        validate_target(&target.path)?;
        tracker.advance(DedupeState::TargetValidated);

        let target_index = index_tree(target, shutdown)?;
        tracker.advance(DedupeState::TargetIndexed);
        log::info!(
            "Indexed {} target entries ({}) under {}",
            target_index.len(),
            ByteSize::b(target_index.total_size()),
            target.path.display()
        );
        for path in target_index.paths() {
            log::trace!("  Target: {}", path.display());
        }

        let resolver = DuplicateResolver::new(&self.config.trash_root, options);
        let mut report = StrategyReport::new(&self.name);
        report.target_files = target_index.len();

        for source in &self.config.sources {
            check_independent(source, target)?;
            tracker.advance(DedupeState::IndependenceChecked);

            log::info!("Source: {}", source.path.display());
            let source_index = index_tree(source, shutdown)?;
            tracker.advance(DedupeState::SourceIndexed);
            report.source_files += source_index.len();

            resolve_source(&source_index, &target_index, &resolver, &mut report, shutdown)?;
            tracker.advance(DedupeState::Resolved);
        }

        tracker.advance(DedupeState::Done);
        Ok(report)
    }
}

fn validate_target(path: &Path) -> Result<(), StrategyError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(path.to_path_buf()).into()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StrategyError::TargetMissing(path.to_path_buf()))
        }
        Err(e) => Err(ScanError::from_io(path, e).into()),
    }
}

fn check_independent(source: &DirSpec, target: &DirSpec) -> Result<(), StrategyError> {
    if overlaps(
        &source.path,
        source.recursive(),
        &target.path,
        target.recursive(),
    )? {
        log::error!(
            "Source {} and target {} are not independent",
            source.path.display(),
            target.path.display()
        );
        return Err(StrategyError::Overlap {
            source_dir: source.path.clone(),
            target: target.path.clone(),
        });
    }
    Ok(())
}

fn index_tree(spec: &DirSpec, shutdown: Option<&Arc<AtomicBool>>) -> Result<TreeIndex, StrategyError> {
    let mut walker = Walker::new(&spec.path, spec.walker.clone());
    if let Some(flag) = shutdown {
        walker = walker.with_shutdown_flag(Arc::clone(flag));
    }
    let index = walker.index()?;
    // A stopped walk returns a partial index.
    check_shutdown(shutdown)?;
    Ok(index)
}

fn resolve_source(
    source_index: &TreeIndex,
    target_index: &TreeIndex,
    resolver: &DuplicateResolver,
    report: &mut StrategyReport,
    shutdown: Option<&Arc<AtomicBool>>,
) -> Result<(), StrategyError> {
    for entry in source_index.iter() {
        check_shutdown(shutdown)?;
        if entry.is_dir {
            continue;
        }

        let matched = target_index
            .candidates(entry.size)
            .find(|candidate| candidate.path != entry.path && entry.content_eq(candidate));
        let Some(keep) = matched else {
            log::trace!("Unique: {}", entry.path.display());
            continue;
        };

        report.duplicates_found += 1;
        report.resolution.record(resolver.resolve(entry, keep));
    }
    Ok(())
}

fn check_shutdown(shutdown: Option<&Arc<AtomicBool>>) -> Result<(), StrategyError> {
    if shutdown.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
        log::info!("Shutdown requested, stopping strategy");
        return Err(StrategyError::Interrupted);
    }
    Ok(())
}
