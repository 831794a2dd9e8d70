//! SimRun CLI - runs a single solver task against a model file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use simrun_core::{InMemorySession, RunOutcome, SimulationModel, SolverEvent};
use simrun_solver::{FileModelBridge, SolverSettings, SolverTask};

/// Run the external solver against a model file.
#[derive(Parser)]
#[command(name = "simrun")]
#[command(about = "Run a SimRun solver task", long_about = None)]
struct Cli {
    /// Path to the solver executable
    #[arg(short, long)]
    solver: PathBuf,

    /// Path to the model file (JSON model description)
    #[arg(short, long)]
    model: PathBuf,

    /// Number of solver worker threads
    #[arg(short, long, default_value_t = 1)]
    nthreads: u32,

    /// Path to the module license file
    #[arg(long, default_value = "module.lic")]
    license_file: PathBuf,

    /// License account name
    #[arg(long, default_value = "")]
    account: String,

    /// License account password
    #[arg(long, default_value = "")]
    password: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(outcome) => {
            error!(reason = %outcome.reason(), "Solver run failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Unable to run solver task");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let payload = std::fs::read_to_string(&cli.model)?;
    let mut model: SimulationModel = serde_json::from_str(&payload)?;
    model.file_name = cli.model.clone();

    let session = Arc::new(InMemorySession::new());
    let model_id = session.insert_model(model);

    let settings = SolverSettings::new(cli.solver)
        .with_nthreads(cli.nthreads)
        .with_module_license_file(cli.license_file)
        .with_credentials(cli.account, cli.password);

    let task = Arc::new(SolverTask::new(
        settings,
        model_id,
        session,
        Arc::new(FileModelBridge::new()),
    )?);

    info!(
        task_id = %task.task_id(),
        log_file = %task.log_file_path().display(),
        "Solver task created"
    );

    task.prepare();

    // Mirror solver output to the console as it arrives.
    let mut events = task.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SolverEvent::Stdout(line) => println!("{}", line),
                SolverEvent::Stderr(line) => eprintln!("{}", line),
                SolverEvent::Blocking(_) => {}
            }
        }
    });

    // Ctrl-C kills the solver.
    let killer = task.clone();
    let signal_watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            killer.kill();
        }
    });

    let outcome = task.run().await;

    // Release the remaining task handles so the event stream closes and
    // the printer drains the tail of the solver output.
    signal_watcher.abort();
    drop(task);
    printer.await.ok();

    Ok(outcome)
}
