//! The solver task orchestrator.
//!
//! One `SolverTask` is created per solver invocation request and discarded
//! after its single `run`. The run sequence is strictly ordered: version
//! checkpoint, model snapshot, spawn, wait, model reintegration, change
//! notification. Any stage failure short-circuits the rest and surfaces as
//! exactly one [`RunOutcome`]; no error crosses the run boundary.

use crate::args::{SolverArguments, SolverFiles};
use crate::bridge::ModelBridge;
use crate::error::ConstructionError;
use crate::events::EventHub;
use crate::license::LicenseGate;
use crate::supervisor::{ProcessExit, ProcessSupervisor};
use simrun_core::{Model, ModelId, RunOutcome, Session, SolverEvent, SolverTaskId, TaskState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Label recorded with the pre-run model version checkpoint.
const VERSION_CHECKPOINT_LABEL: &str = "Execute solver task";

/// Global settings captured at task construction.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Path to the solver executable.
    pub solver_path: PathBuf,

    /// Number of solver worker threads.
    pub nthreads: u32,

    /// Path to the module license file.
    pub module_license_file: PathBuf,

    /// Account name checked against license records.
    pub account: String,

    /// Password checked against license records.
    pub password: String,
}

impl SolverSettings {
    /// Create settings for the given solver executable.
    pub fn new(solver_path: impl Into<PathBuf>) -> Self {
        Self {
            solver_path: solver_path.into(),
            nthreads: 1,
            module_license_file: PathBuf::new(),
            account: String::new(),
            password: String::new(),
        }
    }

    /// Builder method to set the worker thread count.
    pub fn with_nthreads(mut self, nthreads: u32) -> Self {
        self.nthreads = nthreads;
        self
    }

    /// Builder method to set the module license file path.
    pub fn with_module_license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_license_file = path.into();
        self
    }

    /// Builder method to set the license account credentials.
    pub fn with_credentials(
        mut self,
        account: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.account = account.into();
        self.password = password.into();
        self
    }
}

/// Drives one end-to-end solver run against a model held by the session.
///
/// `run` is async and intended to be driven on its own task; `stop` and
/// `kill` are non-suspending signals safe to call from anywhere at any
/// time (before the process exists or after it has exited they are
/// no-ops).
pub struct SolverTask {
    task_id: SolverTaskId,
    model_id: ModelId,
    settings: SolverSettings,
    session: Arc<dyn Session>,
    bridge: Arc<dyn ModelBridge>,
    model: Arc<dyn Model>,
    files: SolverFiles,
    arguments: SolverArguments,
    supervisor: ProcessSupervisor,
    events: EventHub,
    state: Mutex<TaskState>,
}

impl SolverTask {
    /// Construct a task bound to a model and settings.
    ///
    /// Generates the task identifier, derives the per-task file paths and
    /// builds the argument list. Performs no I/O; the only failure is an
    /// unknown model identifier.
    pub fn new(
        settings: SolverSettings,
        model_id: ModelId,
        session: Arc<dyn Session>,
        bridge: Arc<dyn ModelBridge>,
    ) -> Result<Self, ConstructionError> {
        let task_id = SolverTaskId::generate();
        let model = session.model(&model_id)?;

        let files = SolverFiles::derive(model.as_ref(), &task_id);
        let arguments =
            SolverArguments::build(&files, &settings.module_license_file, settings.nthreads);

        Ok(Self {
            task_id,
            model_id,
            settings,
            session,
            bridge,
            model,
            files,
            arguments,
            supervisor: ProcessSupervisor::new(),
            events: EventHub::new(),
            state: Mutex::new(TaskState::Created),
        })
    }

    /// Best-effort license validation, invoked explicitly before `run`.
    ///
    /// Resolves the required capabilities from the model's capability mask
    /// and checks each against the module license file. All failures are
    /// absorbed: missing capabilities are warned about by the gate, an
    /// unreadable license file is logged as an error, and the task
    /// proceeds unlicensed either way.
    pub fn prepare(&self) {
        let required = self.model.capability_mask().capabilities();
        if required.is_empty() {
            return;
        }
        match LicenseGate::check(
            &required,
            &self.settings.module_license_file,
            &self.settings.account,
            &self.settings.password,
        ) {
            Ok(missing) if missing.is_empty() => {
                debug!(task_id = %self.task_id, "All required capabilities licensed");
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    license_file = %self.settings.module_license_file.display(),
                    error = %e,
                    "Failed to validate module license file"
                );
            }
        }
    }

    /// Execute the full run sequence and return its terminal outcome.
    pub async fn run(&self) -> RunOutcome {
        let span = info_span!("solver_task", task_id = %self.task_id);
        let outcome = self.run_inner().instrument(span).await;

        let state = match outcome {
            RunOutcome::Succeeded => TaskState::Succeeded,
            RunOutcome::Cancelled => TaskState::Killed,
            _ => TaskState::Failed,
        };
        self.set_state(state);

        if !outcome.is_success() {
            error!(
                task_id = %self.task_id,
                reason = %outcome.reason(),
                "Solver task failed"
            );
        }
        outcome
    }

    async fn run_inner(&self) -> RunOutcome {
        self.set_state(TaskState::Running);

        // Version checkpoint: failure is logged but never blocks the run.
        if let Err(e) = self
            .session
            .store_current_model_version(&self.model_id, VERSION_CHECKPOINT_LABEL)
        {
            warn!(error = %e, "Failed to store model version checkpoint");
        }

        info!(task_id = %self.task_id, "Solver task begin");

        // Save the model before anything touches the subprocess.
        self.events.emit(SolverEvent::Blocking(true));
        let saved = self.bridge.save(self.model.as_ref(), &self.files.snapshot).await;
        self.events.emit(SolverEvent::Blocking(false));
        if let Err(e) = saved {
            error!(
                error = %e,
                file = %self.files.snapshot.display(),
                "Failed to save model"
            );
            return RunOutcome::FailedToSaveModel;
        }

        // Rendered once for logging; the spawn uses the structured list.
        let command_line = self.arguments.command_line(&self.settings.solver_path);
        info!(command = %command_line, "Executing solver");

        if let Err(e) = self.supervisor.start(
            &self.settings.solver_path,
            self.arguments.as_slice(),
            self.events.clone(),
        ) {
            error!(error = %e, "Failed to start solver process");
            return RunOutcome::FailedToStart;
        }

        // No built-in timeout; stop/kill from the caller bound the runtime.
        match self.supervisor.wait_for_completion().await {
            Ok(ProcessExit::Finished(0)) => {
                info!(command = %command_line, "Solver command successfully finished");
            }
            Ok(ProcessExit::Finished(code)) => {
                warn!(
                    command = %command_line,
                    exit_code = code,
                    "Solver command failed"
                );
                return RunOutcome::SolverExitedNonZero(code);
            }
            Ok(ProcessExit::Killed) => {
                return RunOutcome::Cancelled;
            }
            Err(e) => {
                error!(error = %e, "Failed waiting for solver process");
                return RunOutcome::WaitFailed;
            }
        }

        // Reintegrate the model; the snapshot stays on disk either way.
        self.events.emit(SolverEvent::Blocking(true));
        let updated = self.bridge.update(self.model.as_ref(), &self.files.snapshot).await;
        self.events.emit(SolverEvent::Blocking(false));
        if let Err(e) = updated {
            error!(
                error = %e,
                file = %self.files.snapshot.display(),
                "Failed to update model"
            );
            return RunOutcome::FailedToUpdateModel;
        }

        self.session.set_model_changed(&self.model_id);
        info!(task_id = %self.task_id, "Solver task end");
        RunOutcome::Succeeded
    }

    /// Ask the solver to terminate at its own next checkpoint.
    ///
    /// No-op if the process does not exist or has already exited.
    pub fn stop(&self) {
        info!(task_id = %self.task_id, "Stopping solver task");
        if self.supervisor.stop().is_err() {
            debug!(task_id = %self.task_id, "No running solver process to stop");
        }
    }

    /// Terminate the solver process immediately.
    ///
    /// No-op if the process does not exist or has already exited.
    pub fn kill(&self) {
        info!(task_id = %self.task_id, "Killing solver task");
        self.supervisor.kill();
    }

    /// Subscribe to output and blocking-state events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SolverEvent> {
        self.events.subscribe()
    }

    /// The task's unique identifier.
    pub fn task_id(&self) -> &SolverTaskId {
        &self.task_id
    }

    /// Identifier of the model this task runs against.
    pub fn model_id(&self) -> &ModelId {
        &self.model_id
    }

    /// Path of the solver log file for this task.
    pub fn log_file_path(&self) -> &Path {
        &self.files.log
    }

    /// The per-task transient file set.
    pub fn files(&self) -> &SolverFiles {
        &self.files
    }

    /// The argument list built at construction.
    pub fn arguments(&self) -> &SolverArguments {
        &self.arguments
    }

    /// Current task state.
    pub fn state(&self) -> TaskState {
        *self.state.lock().expect("task state lock")
    }

    fn set_state(&self, state: TaskState) {
        *self.state.lock().expect("task state lock") = state;
    }
}
