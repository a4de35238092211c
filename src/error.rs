//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the file-cleaner application.
///
/// - 0: Success (every strategy ran and every duplicate was resolved)
/// - 1: General error (config, lock, strategy or per-file resolution failure)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: all strategies completed without failures.
    Success = 0,
    /// General error: something failed.
    GeneralError = 1,
    /// Interrupted: the run was stopped by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FC000",
            Self::GeneralError => "FC001",
            Self::Interrupted => "FC130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Pick the exit code for an error that reached `main`.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let interrupted = err
        .downcast_ref::<crate::strategy::RunError>()
        .is_some_and(crate::strategy::RunError::is_interrupted);
    if interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}

/// Pick the exit code for a command line clap rejected or answered itself.
///
/// `--help` and `--version` exit 0; every usage error (a missing
/// `--config` included) exits 1 like any other configuration failure.
#[must_use]
pub fn exit_code_for_parse_error(err: &clap::Error) -> ExitCode {
    if err.use_stderr() {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}
