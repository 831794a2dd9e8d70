//! Model serialization seam.
//!
//! The supervisor needs exactly two operations from the model I/O
//! subsystem: write the model to its snapshot path before the solver
//! starts, and re-read it once the solver has finished. Hosts with richer
//! model formats implement [`ModelBridge`] themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simrun_core::{CapabilityMask, Model};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The two serialization operations the supervisor needs from the model
/// subsystem.
#[async_trait]
pub trait ModelBridge: Send + Sync {
    /// Serialize the model to the given snapshot path.
    async fn save(&self, model: &dyn Model, path: &Path) -> io::Result<()>;

    /// Reintegrate the model from the snapshot path after a solver run.
    async fn update(&self, model: &dyn Model, path: &Path) -> io::Result<()>;
}

/// On-disk snapshot payload written by [`FileModelBridge`].
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    name: String,
    file_name: PathBuf,
    capability_mask: CapabilityMask,
}

/// A JSON-file model bridge.
///
/// Stores the model description as a JSON document at the snapshot path
/// and verifies on update that the snapshot still belongs to the same
/// model. Used by the CLI and the integration tests.
#[derive(Debug, Clone, Default)]
pub struct FileModelBridge;

impl FileModelBridge {
    /// Create a new file bridge.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModelBridge for FileModelBridge {
    async fn save(&self, model: &dyn Model, path: &Path) -> io::Result<()> {
        let snapshot = SnapshotFile {
            name: model.name().to_owned(),
            file_name: model.file_name().to_owned(),
            capability_mask: model.capability_mask(),
        };
        let payload = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, payload).await?;
        debug!(path = %path.display(), "Model snapshot written");
        Ok(())
    }

    async fn update(&self, model: &dyn Model, path: &Path) -> io::Result<()> {
        let payload = tokio::fs::read_to_string(path).await?;
        let snapshot: SnapshotFile = serde_json::from_str(&payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if snapshot.name != model.name() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "snapshot belongs to model '{}', expected '{}'",
                    snapshot.name,
                    model.name()
                ),
            ));
        }
        debug!(path = %path.display(), "Model reintegrated from snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simrun_core::{SimulationModel, SolverTaskId};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}", name, SolverTaskId::generate()))
    }

    #[tokio::test]
    async fn test_save_then_update() {
        let bridge = FileModelBridge::new();
        let model = SimulationModel::new("part", "/work/part.model");
        let path = temp_path("simrun-bridge.model");

        bridge.save(&model, &path).await.unwrap();
        bridge.update(&model, &path).await.unwrap();

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_update_rejects_foreign_snapshot() {
        let bridge = FileModelBridge::new();
        let saved = SimulationModel::new("part", "/work/part.model");
        let other = SimulationModel::new("wing", "/work/wing.model");
        let path = temp_path("simrun-bridge-foreign.model");

        bridge.save(&saved, &path).await.unwrap();
        let err = bridge.update(&other, &path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_update_missing_snapshot() {
        let bridge = FileModelBridge::new();
        let model = SimulationModel::new("part", "/work/part.model");
        let err = bridge
            .update(&model, Path::new("/nonexistent/part.model"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
