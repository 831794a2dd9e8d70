//! End-to-end solver task runs against a scripted solver executable.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use simrun_core::{Capability, InMemorySession, ModelId, RunOutcome, SimulationModel, SolverEvent};
use simrun_solver::{FileModelBridge, SolverSettings, SolverTask};

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "simrun-e2e-{}-{}",
            name,
            simrun_core::SolverTaskId::generate()
        ));
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn write_solver_script(&self, body: &str) -> PathBuf {
        let path = self.dir.join("solver.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn model(&self) -> SimulationModel {
        SimulationModel::new("part", self.dir.join("part.model"))
            .with_capability(Capability::HeatTransfer)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.dir).ok();
    }
}

fn make_task(
    workspace: &Workspace,
    script_body: &str,
) -> (Arc<SolverTask>, Arc<InMemorySession>, ModelId) {
    let solver = workspace.write_solver_script(script_body);
    let session = Arc::new(InMemorySession::new());
    let model_id = session.insert_model(workspace.model());

    let settings = SolverSettings::new(solver)
        .with_nthreads(2)
        .with_module_license_file(workspace.dir.join("module.lic"));
    let task = SolverTask::new(
        settings,
        model_id.clone(),
        session.clone(),
        Arc::new(FileModelBridge::new()),
    )
    .unwrap();

    (Arc::new(task), session, model_id)
}

#[tokio::test]
async fn full_run_succeeds_and_marks_model_changed() {
    let workspace = Workspace::new("success");
    let (task, session, model_id) = make_task(&workspace, "echo solving; exit 0");

    let mut rx = task.subscribe();
    let outcome = task.run().await;

    assert_eq!(outcome, RunOutcome::Succeeded);
    assert!(session.is_model_changed(&model_id));
    // The snapshot is intentionally left on disk for postmortem use.
    assert!(task.files().snapshot.exists());

    // Dropping the task closes the event stream once the output readers
    // have drained.
    drop(task);
    let mut saw_output = false;
    while let Some(event) = rx.recv().await {
        if event == SolverEvent::Stdout("solving".to_string()) {
            saw_output = true;
        }
    }
    assert!(saw_output);
}

#[tokio::test]
async fn cooperative_stop_lets_solver_finish_cleanly() {
    let workspace = Workspace::new("stop");
    // Loops on stdin until the cooperative STOP command arrives.
    let body = r#"echo waiting
while read line; do
  if [ "$line" = "STOP" ]; then
    echo stopped
    exit 0
  fi
done"#;
    let (task, _session, _model_id) = make_task(&workspace, body);

    let mut rx = task.subscribe();
    let runner = task.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    // Wait until the solver reports it is up, then request the stop.
    loop {
        match rx.recv().await.expect("event stream open") {
            SolverEvent::Stdout(line) if line == "waiting" => break,
            _ => {}
        }
    }
    task.stop();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, RunOutcome::Succeeded);
}

#[tokio::test]
async fn solver_failure_leaves_snapshot_and_model_unchanged() {
    let workspace = Workspace::new("failure");
    let (task, session, model_id) = make_task(&workspace, "echo diverged >&2; exit 3");

    let mut rx = task.subscribe();
    let outcome = task.run().await;

    assert_eq!(outcome, RunOutcome::SolverExitedNonZero(3));
    assert!(!session.is_model_changed(&model_id));
    assert!(task.files().snapshot.exists());

    drop(task);
    let mut saw_stderr = false;
    while let Some(event) = rx.recv().await {
        if event == SolverEvent::Stderr("diverged".to_string()) {
            saw_stderr = true;
        }
    }
    assert!(saw_stderr);
}

#[tokio::test]
async fn kill_during_run_yields_cancelled() {
    let workspace = Workspace::new("kill");
    let (task, session, model_id) = make_task(&workspace, "echo running; sleep 600");

    let mut rx = task.subscribe();
    let runner = task.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    loop {
        match rx.recv().await.expect("event stream open") {
            SolverEvent::Stdout(line) if line == "running" => break,
            _ => {}
        }
    }
    task.kill();
    // A second kill while the first is in flight must be harmless.
    task.kill();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(!session.is_model_changed(&model_id));
}

#[tokio::test]
async fn solver_receives_exact_argument_list() {
    let workspace = Workspace::new("args");
    // The script echoes its arguments back one per line.
    let (task, _session, _model_id) = make_task(&workspace, r#"for a in "$@"; do echo "$a"; done"#);

    let mut rx = task.subscribe();
    let outcome = task.run().await;
    assert_eq!(outcome, RunOutcome::Succeeded);

    let expected = task.arguments().as_slice().to_vec();
    drop(task);
    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        if let SolverEvent::Stdout(line) = event {
            seen.push(line);
        }
    }
    assert_eq!(seen, expected);
}
