//! Solver Task Supervisor for SimRun
//!
//! This crate drives the full lifecycle of an external, long-running
//! numerical solver process on behalf of an in-memory simulation model:
//! pre-flight snapshot serialization, best-effort license validation,
//! argument construction, subprocess supervision with streamed output,
//! cooperative stop / forceful kill, and post-run model reintegration.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use simrun_core::{InMemorySession, SimulationModel};
//! use simrun_solver::{FileModelBridge, SolverSettings, SolverTask};
//!
//! async fn run_solver() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Arc::new(InMemorySession::new());
//!     let model_id = session.insert_model(SimulationModel::new("part", "part.model"));
//!
//!     let settings = SolverSettings::new("simrun-solver-bin").with_nthreads(4);
//!     let task = SolverTask::new(settings, model_id, session, Arc::new(FileModelBridge::new()))?;
//!
//!     task.prepare();
//!     let outcome = task.run().await;
//!     println!("outcome: {:?}", outcome);
//!     Ok(())
//! }
//! ```

mod args;
mod bridge;
mod error;
mod events;
mod license;
mod supervisor;
mod task;

// Re-export main types
pub use args::{SolverArguments, SolverFiles};
pub use bridge::{FileModelBridge, ModelBridge};
pub use error::{ConstructionError, LicenseError, SupervisorError};
pub use events::EventHub;
pub use license::{LicenseGate, LicenseRecord, ModuleLicense};
pub use supervisor::{ProcessExit, ProcessSupervisor, SupervisorState};
pub use task::{SolverSettings, SolverTask};
