//! Duplicate resolution: move to a run-scoped trash, optionally leave a symlink.
//!
//! # Overview
//!
//! For each duplicate source file matched against a retained target file:
//! 1. The trash destination mirrors the source's absolute path under the
//!    strategy trash root (`<trash>/<stamp>/home/user/file.txt`).
//! 2. The source is renamed into that destination. Rename never copies, so
//!    a cross-device source fails instead of being half moved.
//! 3. With symlink replacement, a link to the target is created at the
//!    source path once the move has succeeded.
//!
//! In dry-run mode every step is logged and reported but nothing is touched.
//! The target file is never modified.
//!
//! # Example
//!
//! ```no_run
//! use file_cleaner::actions::{DuplicateResolver, RunOptions};
//! use file_cleaner::scanner::FileEntry;
//! use std::path::Path;
//!
//! let resolver = DuplicateResolver::new(Path::new("/tmp/trash/run"), RunOptions::dry_run());
//! let duplicate = FileEntry::load(Path::new("/src/b.txt")).unwrap();
//! let keep = FileEntry::load(Path::new("/target/a.txt")).unwrap();
//! let resolution = resolver.resolve(&duplicate, &keep).unwrap();
//! assert!(resolution.simulated);
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::scanner::path_utils::{absolutize, PathResolutionError};
use crate::scanner::FileEntry;

/// Error type for resolution of a single duplicate.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Source file was not found (may have been deleted or moved).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The source path could not be made absolute.
    #[error(transparent)]
    Path(#[from] PathResolutionError),

    /// Something already occupies the trash destination.
    #[error("Trash destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The trash directory could not be created.
    #[error("Failed to create trash directory {path}")]
    CreateTrashDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rename into the trash failed (e.g. the trash is on another device).
    #[error("Failed to move {from} to {to}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Symlink creation failed after the move; the file remains in the trash.
    #[error("Failed to link {link} -> {target} (original kept at {trashed})")]
    SymlinkFailed {
        link: PathBuf,
        target: PathBuf,
        trashed: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Path the failure is reported under.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::DestinationExists(p)
            | Self::CreateTrashDir { path: p, .. }
            | Self::MoveFailed { from: p, .. }
            | Self::SymlinkFailed { link: p, .. } => p,
            Self::Path(e) => &e.path,
        }
    }
}

/// Switches controlling what resolution actually does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Report actions without performing them.
    pub dry_run: bool,
    /// Leave a symlink to the retained target where the duplicate was.
    pub replace_with_symlink: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::dry_run()
    }
}

impl RunOptions {
    /// Simulate only.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            replace_with_symlink: false,
        }
    }

    /// Perform moves.
    #[must_use]
    pub fn apply() -> Self {
        Self {
            dry_run: false,
            replace_with_symlink: false,
        }
    }

    /// Enable/disable symlink replacement.
    #[must_use]
    pub fn with_symlink(mut self, replace_with_symlink: bool) -> Self {
        self.replace_with_symlink = replace_with_symlink;
        self
    }
}

/// Outcome of resolving one duplicate.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Duplicate that was (or would be) moved.
    pub source: PathBuf,
    /// Retained file it duplicates.
    pub target: PathBuf,
    /// Where the duplicate went (or would go).
    pub trash_path: PathBuf,
    /// Size of the duplicate in bytes.
    pub size: u64,
    /// Whether a symlink was (or would be) left behind.
    pub symlinked: bool,
    /// True in dry-run mode.
    pub simulated: bool,
}

/// Results of resolving every duplicate of one strategy.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Resolved duplicates.
    pub successes: Vec<Resolution>,
    /// Failed resolutions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Bytes moved (or that would be moved) out of source trees.
    pub bytes_reclaimed: u64,
}

impl ResolutionReport {
    /// Record an outcome. Failures keep their full cause chain.
    pub fn record(&mut self, outcome: Result<Resolution, ResolveError>) {
        match outcome {
            Ok(resolution) => {
                self.bytes_reclaimed += resolution.size;
                self.successes.push(resolution);
            }
            Err(e) => {
                let path = e.path().to_path_buf();
                let reason = format!("{:#}", anyhow::Error::new(e));
                log::error!("Failed to resolve {}: {}", path.display(), reason);
                self.failures.push((path, reason));
            }
        }
    }

    /// Number of resolved duplicates.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed resolutions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all resolutions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies the trash-then-optionally-symlink policy for one strategy.
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    trash_root: PathBuf,
    options: RunOptions,
}

impl DuplicateResolver {
    /// Create a resolver that trashes into `trash_root`.
    #[must_use]
    pub fn new(trash_root: &Path, options: RunOptions) -> Self {
        Self {
            trash_root: trash_root.to_path_buf(),
            options,
        }
    }

    /// Mirror `source`'s absolute path under the trash root.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Path`] if `source` cannot be made absolute.
    pub fn trash_destination(&self, source: &Path) -> Result<PathBuf, ResolveError> {
        let absolute = absolutize(source)?;
        let mut destination = self.trash_root.clone();
        for component in absolute.components() {
            if let Component::Normal(part) = component {
                destination.push(part);
            }
        }
        Ok(destination)
    }

    /// Resolve one duplicate: trash `duplicate`, then link it to `keep` if configured.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] for this file only; the caller decides
    /// whether to continue with other duplicates.
    pub fn resolve(&self, duplicate: &FileEntry, keep: &FileEntry) -> Result<Resolution, ResolveError> {
        let source = &duplicate.path;
        let trash_path = self.trash_destination(source)?;
        let link_target = absolutize(&keep.path)?;

        log::info!("Duplicate: {}", source.display());
        log::info!("  Target: {}", keep.path.display());
        log::info!("  Moving to trash: {}", trash_path.display());

        if self.options.dry_run {
            log::info!("  Dry run: not moving to trash");
        } else {
            move_to_trash(source, &trash_path)?;
        }

        if self.options.replace_with_symlink {
            log::info!(
                "  Replacing with symlink: {} -> {}",
                source.display(),
                link_target.display()
            );
            if self.options.dry_run {
                log::info!("  Dry run: not creating symlink");
            } else {
                create_symlink(&link_target, source).map_err(|e| {
                    log::error!(
                        "Symlink failed for {}; original remains at {}",
                        source.display(),
                        trash_path.display()
                    );
                    ResolveError::SymlinkFailed {
                        link: source.clone(),
                        target: link_target.clone(),
                        trashed: trash_path.clone(),
                        source: e,
                    }
                })?;
            }
        }

        Ok(Resolution {
            source: source.clone(),
            target: keep.path.clone(),
            trash_path,
            size: duplicate.size,
            symlinked: self.options.replace_with_symlink,
            simulated: self.options.dry_run,
        })
    }
}

/// Rename `source` to `destination`, creating parent directories first.
fn move_to_trash(source: &Path, destination: &Path) -> Result<(), ResolveError> {
    if fs::symlink_metadata(source).is_err() {
        return Err(ResolveError::NotFound(source.to_path_buf()));
    }
    if fs::symlink_metadata(destination).is_ok() {
        return Err(ResolveError::DestinationExists(destination.to_path_buf()));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ResolveError::CreateTrashDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::rename(source, destination).map_err(|e| {
        log::error!(
            "Move failed for {} -> {}: {}",
            source.display(),
            destination.display(),
            e
        );
        ResolveError::MoveFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
