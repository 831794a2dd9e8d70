//! Solver command-line construction.
//!
//! The argument list is built once at task construction and reused
//! unmodified for the process invocation. Arguments are always handed to
//! the subprocess as a structured list, never concatenated into a shell
//! string, so paths containing spaces or quotes need no escaping. The
//! quoted single-line rendering exists only for log output.

use simrun_core::{Model, SolverTaskId};
use std::path::{Path, PathBuf};

/// The per-task transient files handed to the solver.
///
/// Each path is derived from the model's base name and the task
/// identifier, so two concurrently running tasks never collide on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverFiles {
    /// Model snapshot the solver reads and writes.
    pub snapshot: PathBuf,
    /// Solver log file.
    pub log: PathBuf,
    /// Convergence trace file.
    pub convergence: PathBuf,
    /// Monitoring output file.
    pub monitoring: PathBuf,
}

impl SolverFiles {
    /// Derive the four transient file paths for one task.
    pub fn derive(model: &dyn Model, task_id: &SolverTaskId) -> Self {
        Self {
            snapshot: model.build_temp_file_name("model", task_id),
            log: model.build_temp_file_name("log", task_id),
            convergence: model.build_temp_file_name("cvg", task_id),
            monitoring: model.build_temp_file_name("mon", task_id),
        }
    }
}

/// Ordered argument list for one solver invocation.
///
/// The flag order is fixed for reproducibility and log readability; the
/// solver itself does not depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverArguments(Vec<String>);

impl SolverArguments {
    /// Build the full argument list from the task's file set, the module
    /// license file and the worker thread count.
    pub fn build(files: &SolverFiles, module_license_file: &Path, nthreads: u32) -> Self {
        let args = vec![
            format!("--file={}", files.snapshot.display()),
            format!("--log-file={}", files.log.display()),
            format!("--module-license-file={}", module_license_file.display()),
            format!("--convergence-file={}", files.convergence.display()),
            format!("--monitoring-file={}", files.monitoring.display()),
            format!("--nthreads={}", nthreads),
            "--read-stdin".to_string(),
        ];
        Self(args)
    }

    /// The arguments as a slice, in invocation order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Quoted single-line rendering of the invocation, for logging only.
    pub fn command_line(&self, executable: &Path) -> String {
        let mut line = executable.display().to_string();
        for arg in &self.0 {
            line.push_str(" \"");
            line.push_str(arg);
            line.push('"');
        }
        line
    }
}
