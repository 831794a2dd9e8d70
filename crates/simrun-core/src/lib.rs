//! SimRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - The async runtime
//! - The filesystem
//! - Subprocess handling
//!
//! All types here represent the core business domain of SimRun: models,
//! sessions, solver capabilities and run outcomes.

pub mod error;
pub mod event;
pub mod ids;
pub mod model;
pub mod outcome;
pub mod session;

// Re-export commonly used types
pub use error::CoreError;
pub use event::SolverEvent;
pub use ids::{ModelId, SolverTaskId};
pub use model::{Capability, CapabilityMask, Model, SimulationModel};
pub use outcome::{RunOutcome, TaskState};
pub use session::{InMemorySession, Session};
