//! Run outcomes and task states.

use serde::{Deserialize, Serialize};

/// Terminal result of one `run` invocation.
///
/// Exactly one outcome is produced per run; the variants are mutually
/// exclusive. Run-stage failures never cross the run boundary as errors,
/// only as an outcome value plus a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Solver finished cleanly and the model was reintegrated.
    Succeeded,
    /// The model snapshot could not be written; the solver was never started.
    FailedToSaveModel,
    /// The solver executable could not be launched.
    FailedToStart,
    /// The solver exited with a non-zero code.
    SolverExitedNonZero(i32),
    /// Waiting on the solver process failed at the OS level.
    WaitFailed,
    /// The solver succeeded but the model could not be re-read from the
    /// snapshot. A distinct, later-stage failure class.
    FailedToUpdateModel,
    /// The run was cut short by a caller-initiated kill.
    Cancelled,
}

impl RunOutcome {
    /// Whether the run completed fully.
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    /// Human-readable reason string for log lines.
    pub fn reason(&self) -> String {
        match self {
            RunOutcome::Succeeded => "succeeded".to_string(),
            RunOutcome::FailedToSaveModel => {
                "failed to start the solver because model could not be saved".to_string()
            }
            RunOutcome::FailedToStart => "failed to launch the solver executable".to_string(),
            RunOutcome::SolverExitedNonZero(code) => {
                format!("solver execution failed with exit code = {}", code)
            }
            RunOutcome::WaitFailed => "failed waiting for the solver process".to_string(),
            RunOutcome::FailedToUpdateModel => {
                "failed to finish the solver because model could not be opened".to_string()
            }
            RunOutcome::Cancelled => "cancelled".to_string(),
        }
    }
}

/// State of a solver task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Task constructed but `run` not yet invoked.
    #[default]
    Created,
    /// Task is executing its run sequence.
    Running,
    /// Run finished with `RunOutcome::Succeeded`.
    Succeeded,
    /// Run finished with a failure outcome.
    Failed,
    /// Task was forcefully killed during the run.
    Killed,
}

impl TaskState {
    /// Returns true if the task reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Killed
        )
    }
}
