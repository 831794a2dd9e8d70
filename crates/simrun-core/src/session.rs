//! Session registry seam.
//!
//! The session owns the models; the supervisor reaches them only through
//! this trait, injected at task construction. No global singletons.

use crate::error::CoreError;
use crate::ids::ModelId;
use crate::model::{Model, SimulationModel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry mapping model identifiers to live models.
///
/// The registry is also responsible for serializing access to a model:
/// only one task may save/update a given model at a time. The supervisor
/// assumes that guarantee, it does not enforce it.
pub trait Session: Send + Sync {
    /// Look up a model by identifier.
    fn model(&self, id: &ModelId) -> Result<Arc<dyn Model>, CoreError>;

    /// Record a checkpoint of the model's current state for undo/versioning.
    fn store_current_model_version(&self, id: &ModelId, label: &str) -> Result<(), CoreError>;

    /// Mark the model as changed after a successful solver run.
    fn set_model_changed(&self, id: &ModelId);
}

#[derive(Debug)]
struct ModelEntry {
    model: Arc<SimulationModel>,
    changed: bool,
    version_labels: Vec<String>,
}

/// A simple in-process session registry.
///
/// Used by the CLI and tests; larger hosts provide their own [`Session`].
#[derive(Debug, Default)]
pub struct InMemorySession {
    entries: Mutex<HashMap<ModelId, ModelEntry>>,
}

impl InMemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model and return its identifier.
    pub fn insert_model(&self, model: SimulationModel) -> ModelId {
        let id = ModelId::generate();
        let entry = ModelEntry {
            model: Arc::new(model),
            changed: false,
            version_labels: Vec::new(),
        };
        self.entries
            .lock()
            .expect("session registry lock")
            .insert(id.clone(), entry);
        id
    }

    /// Whether the model has been marked changed.
    pub fn is_model_changed(&self, id: &ModelId) -> bool {
        self.entries
            .lock()
            .expect("session registry lock")
            .get(id)
            .map(|e| e.changed)
            .unwrap_or(false)
    }

    /// Version checkpoint labels recorded for a model, oldest first.
    pub fn version_labels(&self, id: &ModelId) -> Vec<String> {
        self.entries
            .lock()
            .expect("session registry lock")
            .get(id)
            .map(|e| e.version_labels.clone())
            .unwrap_or_default()
    }
}

impl Session for InMemorySession {
    fn model(&self, id: &ModelId) -> Result<Arc<dyn Model>, CoreError> {
        self.entries
            .lock()
            .expect("session registry lock")
            .get(id)
            .map(|e| e.model.clone() as Arc<dyn Model>)
            .ok_or_else(|| CoreError::ModelNotFound(id.to_string()))
    }

    fn store_current_model_version(&self, id: &ModelId, label: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().expect("session registry lock");
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| CoreError::ModelNotFound(id.to_string()))?;
        entry.version_labels.push(label.to_owned());
        Ok(())
    }

    fn set_model_changed(&self, id: &ModelId) {
        if let Some(entry) = self
            .entries
            .lock()
            .expect("session registry lock")
            .get_mut(id)
        {
            entry.changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let session = InMemorySession::new();
        let id = session.insert_model(SimulationModel::new("part", "/work/part.model"));

        let model = session.model(&id).unwrap();
        assert_eq!(model.name(), "part");
    }

    #[test]
    fn test_unknown_model() {
        let session = InMemorySession::new();
        let missing = ModelId::new("nope");
        assert!(matches!(
            session.model(&missing),
            Err(CoreError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_version_and_changed_tracking() {
        let session = InMemorySession::new();
        let id = session.insert_model(SimulationModel::new("part", "/work/part.model"));

        assert!(!session.is_model_changed(&id));
        session
            .store_current_model_version(&id, "Execute solver task")
            .unwrap();
        session.set_model_changed(&id);

        assert!(session.is_model_changed(&id));
        assert_eq!(session.version_labels(&id), vec!["Execute solver task"]);
    }
}
