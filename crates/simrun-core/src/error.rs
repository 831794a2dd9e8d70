//! Core domain errors.

use thiserror::Error;

/// Core domain errors for SimRun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Model not found in the session registry.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Version checkpoint could not be recorded.
    #[error("Failed to store model version: {0}")]
    VersionStore(String),
}
