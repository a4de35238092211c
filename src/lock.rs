//! Cross-process exclusivity.
//!
//! Only one cleaner may mutate the filesystem at a time. [`ProcessLock`]
//! takes a non-blocking advisory lock on a well-known file and releases it
//! when dropped, including during unwinding. Strategy execution requires a
//! [`RunPermit`], which can only be borrowed from a held lock.
//!
//! ```no_run
//! use file_cleaner::lock::{default_lock_path, ProcessLock};
//!
//! let lock = ProcessLock::acquire(&default_lock_path()).unwrap();
//! let permit = lock.permit();
//! println!("running under {}", permit.lock_path().display());
//! ```

use std::env;
use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name of the default lock in the temp directory.
pub const DEFAULT_LOCK_NAME: &str = "file_cleaner.lock";

/// `<temp dir>/file_cleaner.lock`
#[must_use]
pub fn default_lock_path() -> PathBuf {
    env::temp_dir().join(DEFAULT_LOCK_NAME)
}

/// Errors raised while taking the process lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error("Another instance is already running (lock held on {0})")]
    AlreadyHeld(PathBuf),

    /// The lock file could not be opened or created.
    #[error("Failed to open lock file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The lock call itself failed.
    #[error("Failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Held advisory lock. Unlocked on drop.
#[derive(Debug)]
pub struct ProcessLock {
    file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Try once to take the lock at `path`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::AlreadyHeld`] immediately if another holder
    /// exists; never waits.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                log::error!("Lock {} is held by another process", path.display());
                return Err(LockError::AlreadyHeld(path.to_path_buf()));
            }
            Err(TryLockError::Error(source)) => {
                return Err(LockError::Lock {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        log::debug!("Acquired process lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow a permit to run strategies while this lock is held.
    #[must_use]
    pub fn permit(&self) -> RunPermit<'_> {
        RunPermit { lock: self }
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        match self.file.unlock() {
            Ok(()) => log::debug!("Released process lock {}", self.path.display()),
            Err(e) => log::warn!("Failed to release lock {}: {}", self.path.display(), e),
        }
    }
}

/// Proof that the process lock is held for the duration of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunPermit<'a> {
    lock: &'a ProcessLock,
}

impl RunPermit<'_> {
    /// Path of the lock backing this permit.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }
}
