//! Command-line interface definitions for file-cleaner.
//!
//! The CLI takes a single rule file and runs every strategy it names.
//! Runs are dry by default; pass `--dry-run=false` to touch the filesystem.
//!
//! # Example
//!
//! ```bash
//! # Preview what would be cleaned (default)
//! file-cleaner --config ~/.config/file_cleaner/rules.json
//!
//! # Move duplicates into the trash for real
//! file-cleaner --config rules.json --dry-run=false
//!
//! # Leave symlinks to the kept copies behind
//! file-cleaner --config rules.json --dry-run=false --replace-as-symlink
//!
//! # Verbose mode for debugging
//! file-cleaner -v --config rules.json
//! ```

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::actions::RunOptions;
use crate::lock::default_lock_path;

/// Rule-driven file cleaner.
///
/// Removes files from source directories that already exist, byte for byte,
/// in a target directory. Removed files are moved into a timestamped trash
/// directory and can optionally be replaced by symlinks.
#[derive(Debug, Parser)]
#[command(name = "file-cleaner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON rule file
    #[arg(short, long, value_name = "PATH", env = "FILE_CLEANER_CONFIG")]
    pub config: PathBuf,

    /// Only report what would be done (use --dry-run=false to apply)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub dry_run: bool,

    /// Replace each trashed duplicate with a symlink to the kept file
    #[arg(long)]
    pub replace_as_symlink: bool,

    /// Lock file guarding against concurrent runs
    /// [default: <temp dir>/file_cleaner.lock]
    #[arg(long, value_name = "PATH")]
    pub lock_file: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Run switches selected on the command line.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            replace_with_symlink: self.replace_as_symlink,
        }
    }

    /// The lock file to use, falling back to the default location.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.lock_file.clone().unwrap_or_else(default_lock_path)
    }
}
