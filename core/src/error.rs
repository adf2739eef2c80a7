//! Error types for the portwatch-core library.

use thiserror::Error;

/// Result type alias for portwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during port scanning, persistence and process management.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// The snapshot source could not complete a scan.
    ///
    /// The engine keeps its previous registry when this happens.
    #[error("Port scan failed: {0}")]
    ScanFailure(String),

    /// Failed to kill a process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// The target process does not exist (anymore).
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// Permission denied for an operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Port 0 cannot be a favorite or watched.
    #[error("Invalid port: {0} (expected 1-65535)")]
    InvalidPort(u16),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Errors returned by [`PortWatchEngine::terminate`](crate::PortWatchEngine::terminate).
#[derive(Error, Debug)]
pub enum TerminateError {
    /// The record cannot be killed: it is an inactive placeholder or carries no PID.
    #[error("Cannot terminate port {port} (PID {pid}): {reason}")]
    InvalidTarget {
        port: u16,
        pid: u32,
        reason: &'static str,
    },

    /// The kill executor reported a failure.
    #[error(transparent)]
    Executor(#[from] Error),
}
