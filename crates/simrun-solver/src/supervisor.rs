//! Subprocess supervision for the solver executable.
//!
//! The supervisor owns the child process exclusively: callers interact
//! through start/stop/kill/wait and the event stream, never with the
//! handle itself. Output capture begins at spawn time and runs on its own
//! tasks, so observers receive solver output as it is produced regardless
//! of when (or whether) anyone waits for completion.

use crate::error::SupervisorError;
use crate::events::EventHub;
use simrun_core::SolverEvent;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, warn};

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SupervisorState {
    /// No process has been spawned yet.
    #[default]
    NotStarted,
    /// The process is live.
    Running,
    /// The process exited on its own with the given code.
    Finished(i32),
    /// The process was terminated forcefully.
    Killed,
}

/// Classified exit of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own with the given code.
    Finished(i32),
    /// The process was terminated by a kill.
    Killed,
}

/// Supervises one solver subprocess: `NotStarted -> Running ->
/// {Finished(code) | Killed}`.
///
/// `stop` and `kill` take `&self` and never suspend; they are safe to
/// issue from any task while `wait_for_completion` is pending, and are
/// no-ops outside the `Running` state.
#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    state: Mutex<SupervisorState>,
    child: Mutex<Option<Child>>,
    stdin_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    kill_requested: AtomicBool,
    kill_signal: Notify,
}

impl ProcessSupervisor {
    /// Create a supervisor with no process attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        *self.state.lock().expect("supervisor state lock")
    }

    /// Whether the process is live.
    pub fn is_running(&self) -> bool {
        matches!(self.state(), SupervisorState::Running)
    }

    /// Exit code, once the process has finished on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self.state() {
            SupervisorState::Finished(code) => Some(code),
            _ => None,
        }
    }

    /// Spawn the solver process and begin asynchronous output capture.
    ///
    /// Arguments are passed as a structured list; no shell is involved.
    /// Each captured stdout/stderr line is delivered through `events` as
    /// it arrives, with per-channel ordering preserved.
    pub fn start(
        &self,
        executable: &Path,
        args: &[String],
        events: EventHub,
    ) -> Result<(), SupervisorError> {
        {
            let state = self.state.lock().expect("supervisor state lock");
            if !matches!(*state, SupervisorState::NotStarted) {
                return Err(SupervisorError::AlreadyStarted);
            }
        }

        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(SupervisorError::Spawn)?;

        let stdout = child.stdout.take().ok_or_else(|| pipe_missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| pipe_missing("stderr"))?;
        let stdin = child.stdin.take().ok_or_else(|| pipe_missing("stdin"))?;

        // Per-stream reader tasks; each forwards lines in arrival order.
        let stdout_events = events.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let chunk = line.trim_end_matches(['\r', '\n']).to_string();
                        stdout_events.emit(SolverEvent::Stdout(chunk));
                    }
                    Err(e) => {
                        error!(error = %e, "Error reading solver stdout");
                        break;
                    }
                }
            }
        });

        let stderr_events = events;
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let chunk = line.trim_end_matches(['\r', '\n']).to_string();
                        stderr_events.emit(SolverEvent::Stderr(chunk));
                    }
                    Err(e) => {
                        error!(error = %e, "Error reading solver stderr");
                        break;
                    }
                }
            }
        });

        // Stdin writer task so control messages never suspend the caller.
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(text) = stdin_rx.recv().await {
                let line = format!("{}\n", text);
                if let Err(e) = stdin.write_all(line.as_bytes()).await {
                    warn!(error = %e, "Failed to write to solver stdin");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    warn!(error = %e, "Failed to flush solver stdin");
                    break;
                }
            }
        });

        *self.child.lock().expect("supervisor child lock") = Some(child);
        *self.stdin_tx.lock().expect("supervisor stdin lock") = Some(stdin_tx);
        *self.state.lock().expect("supervisor state lock") = SupervisorState::Running;
        Ok(())
    }

    /// Queue one line for the solver's standard input.
    ///
    /// A trailing newline is appended. Valid only while `Running`.
    pub fn write_line(&self, text: &str) -> Result<(), SupervisorError> {
        if !self.is_running() {
            return Err(SupervisorError::NotRunning);
        }
        let stdin_tx = self.stdin_tx.lock().expect("supervisor stdin lock");
        stdin_tx
            .as_ref()
            .and_then(|tx| tx.send(text.to_string()).ok())
            .ok_or(SupervisorError::NotRunning)
    }

    /// Request cooperative termination by writing `STOP\n` to the
    /// solver's standard input.
    ///
    /// Advisory only: the solver exits at its own next checkpoint, and the
    /// supervisor state stays `Running` until it does.
    pub fn stop(&self) -> Result<(), SupervisorError> {
        self.write_line("STOP")
    }

    /// Terminate the process immediately and unconditionally.
    ///
    /// Idempotent: calling before start, after exit, or repeatedly is a
    /// no-op.
    pub fn kill(&self) {
        if !self.is_running() {
            debug!("Kill requested but no solver process is running");
            return;
        }
        self.kill_requested.store(true, Ordering::SeqCst);
        self.kill_signal.notify_one();
    }

    /// Wait until the process exits and classify the result.
    ///
    /// Blocks only the calling task. No timeout: caller-driven stop/kill
    /// is the only way to bound runtime.
    pub async fn wait_for_completion(&self) -> Result<ProcessExit, SupervisorError> {
        let mut child = self
            .child
            .lock()
            .expect("supervisor child lock")
            .take()
            .ok_or(SupervisorError::NotRunning)?;

        let exit = if self.kill_requested.load(Ordering::SeqCst) {
            self.kill_and_reap(&mut child).await?
        } else {
            tokio::select! {
                status = child.wait() => {
                    let status = status.map_err(|e| self.wait_failed(e))?;
                    self.classify(status)
                }
                _ = self.kill_signal.notified() => {
                    self.kill_and_reap(&mut child).await?
                }
            }
        };

        let state = match exit {
            ProcessExit::Finished(code) => SupervisorState::Finished(code),
            ProcessExit::Killed => SupervisorState::Killed,
        };
        *self.state.lock().expect("supervisor state lock") = state;
        // Dropping the sender ends the stdin writer task.
        self.stdin_tx.lock().expect("supervisor stdin lock").take();

        Ok(exit)
    }

    async fn kill_and_reap(&self, child: &mut Child) -> Result<ProcessExit, SupervisorError> {
        // start_kill fails when the process has already exited; in that
        // case the real exit status wins.
        let already_exited = child.start_kill().is_err();
        let status = child.wait().await.map_err(|e| self.wait_failed(e))?;
        if already_exited {
            Ok(self.classify(status))
        } else {
            Ok(ProcessExit::Killed)
        }
    }

    fn classify(&self, status: std::process::ExitStatus) -> ProcessExit {
        match status.code() {
            Some(code) => ProcessExit::Finished(code),
            // Terminated by a signal.
            None => ProcessExit::Killed,
        }
    }

    fn wait_failed(&self, e: io::Error) -> SupervisorError {
        // Exit code unknown after a wait failure.
        *self.state.lock().expect("supervisor state lock") = SupervisorState::Finished(-1);
        self.stdin_tx.lock().expect("supervisor stdin lock").take();
        SupervisorError::Wait(e)
    }
}

fn pipe_missing(name: &str) -> SupervisorError {
    SupervisorError::Spawn(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("failed to capture solver {}", name),
    ))
}
