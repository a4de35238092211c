//! Ctrl+C handling for graceful interruption.
//!
//! The handler only sets a shared `AtomicBool`. Strategies check it between
//! files, so a duplicate that is being moved (and linked) is always finished
//! before the run stops with exit code 130.
//!
//! ```rust,no_run
//! use file_cleaner::signal::install_handler;
//!
//! let handler = install_handler().unwrap();
//! let flag = handler.get_flag();
//! // Pass `flag` to StrategyRunner::with_shutdown_flag
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `true` once Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the strategy runner and walkers.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the installed one.
///
/// A reused handler has its flag reset, so each run in the same process
/// starts uninterrupted. If another component already owns the Ctrl+C
/// hook, an unhooked handler is returned that still honours
/// [`ShutdownHandler::request_shutdown`].
///
/// # Errors
///
/// Currently always succeeds; the `Result` keeps the installation
/// failure type in the signature.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Finishing current file..."
        );
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_HANDLER.get() {
                existing.reset();
                return Ok(existing.clone());
            }
            log::debug!("Ctrl+C handler unavailable ({}), using unhooked handler", e);
            let fallback = ShutdownHandler::new();
            let _ = GLOBAL_HANDLER.set(fallback.clone());
            Ok(fallback)
        }
    }
}
