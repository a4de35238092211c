//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one configured
//! tree and collecting [`FileEntry`] snapshots for duplicate detection.
//!
//! # Features
//!
//! - Sorted, deterministic traversal
//! - Non-recursive walks are pruned at depth one: subdirectories are never opened
//! - Regex match/ignore rules evaluated against the full path
//! - Optional indexing of directory entries
//! - Symbolic links are skipped
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use file_cleaner::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileEntry, ScanError, TreeIndex, WalkerConfig};

/// Directory walker for one configured tree.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding one entry per accepted path.
    ///
    /// The root itself is never yielded. Errors are yielded as
    /// [`ScanError`] values; [`Walker::index`] stops at the first one.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut walk_dir = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        if !self.config.recursive {
            walk_dir = walk_dir.max_depth(1);
        }

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(entry.path(), entry.file_type()),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Walk the whole tree into a [`TreeIndex`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotADirectory`] if the root is not a directory,
    /// otherwise the first [`ScanError`] encountered; individual paths are
    /// never skipped silently.
    pub fn index(&self) -> Result<TreeIndex, ScanError> {
        let root_meta =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !root_meta.is_dir() {
            log::error!("Tree root is not a directory: {}", self.root.display());
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let mut index = TreeIndex::default();
        for entry in self.walk() {
            index.insert(entry?);
        }
        log::debug!(
            "Indexed {} entries ({} size buckets) under {}",
            index.len(),
            index.size_buckets(),
            self.root.display()
        );
        Ok(index)
    }

    /// Apply filters to one walked path and load it if accepted.
    fn process_entry(
        &self,
        path: &Path,
        file_type: std::fs::FileType,
    ) -> Option<Result<FileEntry, ScanError>> {
        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        if file_type.is_dir() && !self.config.include_dirs {
            return None;
        }

        if !self.config.matches(path) {
            log::trace!("Skipping path due to match rules: {}", path.display());
            return None;
        }

        Some(FileEntry::load(path).inspect_err(|e| {
            log::warn!("Failed to load {}: {}", path.display(), e);
        }))
    }

    /// Handle walkdir errors.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);

        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(&path, io_error),
            None => ScanError::Io {
                path: path.clone(),
                source: std::io::Error::other(format!(
                    "filesystem loop detected under {}",
                    path.display()
                )),
            },
        }
    }
}
