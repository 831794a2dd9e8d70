//! Error types for the solver supervisor.

use thiserror::Error;

/// Errors raised while supervising the solver subprocess.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The solver executable could not be launched.
    #[error("Failed to spawn solver process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Waiting on the solver process failed at the OS level.
    #[error("Failed to wait for solver process: {0}")]
    Wait(#[source] std::io::Error),

    /// The process was started twice.
    #[error("Solver process already started")]
    AlreadyStarted,

    /// Operation requires a running process.
    #[error("Solver process is not running")]
    NotRunning,
}

/// Errors raised while reading or parsing the module license file.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// License file could not be read.
    #[error("Failed to read license file '{path}': {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// License file contains a malformed record.
    #[error("Malformed license record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Errors raised while constructing a solver task.
///
/// Construction performs no I/O; the only way it can fail is an unknown
/// model identifier.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The session has no model under the given identifier.
    #[error(transparent)]
    Core(#[from] simrun_core::CoreError),
}
