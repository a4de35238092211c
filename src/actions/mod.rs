//! File actions module.
//!
//! This module provides the remediation applied to confirmed duplicates:
//! - Move into a per-run trash directory that mirrors the original path
//! - Optional replacement of the duplicate with a symlink to the kept file
//! - Dry-run simulation of both
//!
//! ```no_run
//! use file_cleaner::actions::{DuplicateResolver, RunOptions};
//! use std::path::Path;
//!
//! let resolver = DuplicateResolver::new(Path::new("/tmp/trash/run"), RunOptions::apply());
//! let dest = resolver.trash_destination(Path::new("/data/dup.txt")).unwrap();
//! println!("{}", dest.display());
//! ```

pub mod resolve;

// Re-export commonly used types
pub use resolve::{DuplicateResolver, Resolution, ResolutionReport, ResolveError, RunOptions};
