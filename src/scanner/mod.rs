//! Scanner module for tree indexing and file identity.
//!
//! This module provides functionality for:
//! - Directory walking with match/ignore rules and a recursion switch
//! - Content fingerprints with BLAKE3, computed lazily per entry
//! - Size-bucketed tree indexes
//! - Path normalization and tree overlap analysis
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming) and byte comparison
//! - [`index`]: Size and path indexes over a walked tree
//! - [`path_utils`]: Path normalization and overlap checks
//!
//! # Example
//!
//! ```no_run
//! use file_cleaner::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_recursive(true);
//! let index = Walker::new(Path::new("/data/archive"), config).index().unwrap();
//! println!("{} entries indexed", index.len());
//! ```

pub mod hasher;
pub mod index;
pub mod path_utils;
pub mod walker;

use std::cell::OnceCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

// Re-export main types
pub use hasher::{files_identical, hash_to_hex, Hash, Hasher};
pub use index::TreeIndex;
pub use path_utils::{overlaps, PathResolutionError};
pub use walker::Walker;

/// Point-in-time metadata for one path, plus a lazily computed fingerprint.
///
/// The size and directory flag are captured once by [`FileEntry::load`];
/// later changes on disk are not reflected. The fingerprint is computed on
/// first request and cached for the lifetime of the entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path as enumerated
    pub path: PathBuf,
    /// Whether the path is a directory
    pub is_dir: bool,
    /// File size in bytes
    pub size: u64,
    fingerprint: OnceCell<Hash>,
}

impl FileEntry {
    /// Create an entry from already-known metadata.
    #[must_use]
    pub fn new(path: PathBuf, is_dir: bool, size: u64) -> Self {
        Self {
            path,
            is_dir,
            size,
            fingerprint: OnceCell::new(),
        }
    }

    /// Stat `path` and capture its metadata. The fingerprint is not computed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`], [`ScanError::PermissionDenied`] or
    /// [`ScanError::Io`] when the stat fails.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let metadata = fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        Ok(Self::new(path.to_path_buf(), metadata.is_dir(), metadata.len()))
    }

    /// Content fingerprint, computed on the first call and cached.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotAFile`] for directories, or an I/O flavoured
    /// [`HashError`] when the file cannot be read (e.g. deleted since load).
    pub fn fingerprint(&self) -> Result<Hash, HashError> {
        if let Some(hash) = self.fingerprint.get() {
            return Ok(*hash);
        }
        if self.is_dir {
            return Err(HashError::NotAFile(self.path.clone()));
        }

        let hash = Hasher::new().full_hash(&self.path)?;
        let _ = self.fingerprint.set(hash);
        Ok(hash)
    }

    /// The fingerprint if it has already been computed.
    #[must_use]
    pub fn cached_fingerprint(&self) -> Option<&Hash> {
        self.fingerprint.get()
    }

    /// Whether two entries have identical content.
    ///
    /// Sizes must match, fingerprints must match, and a full byte-by-byte
    /// re-read must agree to the end of both files. Directories are never
    /// equal to anything. Read failures yield `false`.
    #[must_use]
    pub fn content_eq(&self, other: &FileEntry) -> bool {
        if self.is_dir || other.is_dir {
            return false;
        }
        if self.size != other.size {
            return false;
        }

        match (self.fingerprint(), other.fingerprint()) {
            (Ok(a), Ok(b)) if a == b => {}
            (Ok(_), Ok(_)) => return false,
            (Err(e), _) | (_, Err(e)) => {
                log::debug!("Fingerprint unavailable, treating as distinct: {}", e);
                return false;
            }
        }

        files_identical(&self.path, &other.path)
    }
}

/// Inclusion rules and traversal switches for one configured tree.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories. When false only immediate children of
    /// the root are visited and subdirectories are never opened.
    pub recursive: bool,

    /// Record directory entries themselves, not just files.
    pub include_dirs: bool,

    /// A path must match this pattern to be included.
    pub match_regex: Option<Regex>,

    /// A path matching this pattern is excluded.
    pub ignore_regex: Option<Regex>,
}

impl WalkerConfig {
    /// Set recursive traversal.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set whether directory entries are indexed.
    #[must_use]
    pub fn with_include_dirs(mut self, include_dirs: bool) -> Self {
        self.include_dirs = include_dirs;
        self
    }

    /// Set the inclusion pattern.
    #[must_use]
    pub fn with_match(mut self, re: Option<Regex>) -> Self {
        self.match_regex = re;
        self
    }

    /// Set the exclusion pattern.
    #[must_use]
    pub fn with_ignore(mut self, re: Option<Regex>) -> Self {
        self.ignore_regex = re;
        self
    }

    /// Whether `path` passes the match and ignore rules.
    ///
    /// Patterns are tested against the whole path string, not just the
    /// file name.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if let Some(re) = &self.match_regex {
            if !re.is_match(&path_str) {
                return false;
            }
        }
        if let Some(re) = &self.ignore_regex {
            if re.is_match(&path_str) {
                return false;
            }
        }
        true
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Directories carry no content fingerprint.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
