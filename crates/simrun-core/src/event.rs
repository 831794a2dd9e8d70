//! Observer events emitted while a solver task runs.

/// A discrete notification delivered to task subscribers.
///
/// Stdout and stderr are separate channels: chunks arrive in order within
/// each channel, but no ordering is guaranteed between the two. The
/// `Blocking` signal brackets the model save/update steps so a host UI or
/// automation layer can disable conflicting model edits during those
/// windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverEvent {
    /// A chunk of the solver's standard output.
    Stdout(String),
    /// A chunk of the solver's standard error.
    Stderr(String),
    /// True while a model serialization step is in progress.
    Blocking(bool),
}

impl SolverEvent {
    /// Returns true for output-bearing events.
    pub fn is_output(&self) -> bool {
        matches!(self, SolverEvent::Stdout(_) | SolverEvent::Stderr(_))
    }
}
