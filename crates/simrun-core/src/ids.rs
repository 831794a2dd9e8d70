//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a solver task.
///
/// Generated once at task construction and immutable thereafter. The
/// rendered form is filesystem-safe and is embedded directly into the
/// per-task temporary filenames, so two concurrently live tasks never
/// collide on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolverTaskId(String);

impl SolverTaskId {
    /// Create a new SolverTaskId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random SolverTaskId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SolverTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SolverTaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SolverTaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier for a model held by a session.
///
/// The supervisor refers to models by identifier only; the session
/// registry owns the model's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(String);

impl ModelId {
    /// Create a new ModelId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random ModelId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_task_id_generate() {
        let id1 = SolverTaskId::generate();
        let id2 = SolverTaskId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_task_ids_pairwise_distinct() {
        let ids: HashSet<String> = (0..256)
            .map(|_| SolverTaskId::generate().into_inner())
            .collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn test_task_id_filesystem_safe() {
        let id = SolverTaskId::generate();
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_id_display() {
        let id = SolverTaskId::new("test-123");
        assert_eq!(format!("{}", id), "test-123");
        let id = ModelId::new("model-7");
        assert_eq!(format!("{}", id), "model-7");
    }
}
