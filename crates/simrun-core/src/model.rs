//! Model abstraction and solver capability types.

use crate::ids::SolverTaskId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A licensed feature area (problem type) the solver may need to exercise
/// for a given model. Each capability is validated independently against
/// the module license file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Acoustic pressure problems.
    Acoustics,
    /// Electric current conduction.
    ElectricCurrent,
    /// Electrostatic field problems.
    Electrostatics,
    /// Incompressible fluid flow.
    FluidFlow,
    /// Coupled fluid/heat transfer.
    FluidHeat,
    /// Conductive heat transfer.
    HeatTransfer,
    /// Magnetostatic field problems.
    Magnetostatics,
    /// Radiative heat transfer.
    RadiativeHeat,
    /// Structural stress analysis.
    Stress,
    /// Modal stress analysis.
    StressModal,
    /// Wave displacement problems.
    WaveDisplacement,
}

impl Capability {
    /// All capabilities in a fixed order, matching the mask bit layout.
    pub const ALL: [Capability; 11] = [
        Capability::Acoustics,
        Capability::ElectricCurrent,
        Capability::Electrostatics,
        Capability::FluidFlow,
        Capability::FluidHeat,
        Capability::HeatTransfer,
        Capability::Magnetostatics,
        Capability::RadiativeHeat,
        Capability::Stress,
        Capability::StressModal,
        Capability::WaveDisplacement,
    ];

    /// Stable product identifier used in license records and log lines.
    pub fn id(&self) -> &'static str {
        match self {
            Capability::Acoustics => "acoustics",
            Capability::ElectricCurrent => "electric-current",
            Capability::Electrostatics => "electrostatics",
            Capability::FluidFlow => "fluid-flow",
            Capability::FluidHeat => "fluid-heat",
            Capability::HeatTransfer => "heat-transfer",
            Capability::Magnetostatics => "magnetostatics",
            Capability::RadiativeHeat => "radiative-heat",
            Capability::Stress => "stress",
            Capability::StressModal => "stress-modal",
            Capability::WaveDisplacement => "wave-displacement",
        }
    }

    /// Human-readable name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Acoustics => "Acoustics",
            Capability::ElectricCurrent => "Electric current",
            Capability::Electrostatics => "Electrostatics",
            Capability::FluidFlow => "Fluid flow",
            Capability::FluidHeat => "Fluid heat",
            Capability::HeatTransfer => "Heat transfer",
            Capability::Magnetostatics => "Magnetostatics",
            Capability::RadiativeHeat => "Radiative heat",
            Capability::Stress => "Stress",
            Capability::StressModal => "Stress modal",
            Capability::WaveDisplacement => "Wave displacement",
        }
    }

    /// Bit assigned to this capability inside a [`CapabilityMask`].
    pub fn bit(&self) -> u32 {
        1 << Capability::ALL
            .iter()
            .position(|c| c == self)
            .expect("capability listed in ALL")
    }
}

/// Bitmask of the problem types a model exercises.
///
/// Models carry the mask; the supervisor decomposes it into individual
/// capabilities for license validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMask(pub u32);

impl CapabilityMask {
    /// The empty mask.
    pub const EMPTY: CapabilityMask = CapabilityMask(0);

    /// Build a mask from individual capabilities.
    pub fn from_capabilities(capabilities: &[Capability]) -> Self {
        Self(capabilities.iter().fold(0, |mask, c| mask | c.bit()))
    }

    /// Whether the mask contains the given capability.
    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Decompose the mask into the capabilities it contains, in the
    /// fixed [`Capability::ALL`] order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.contains(*c))
            .collect()
    }

    /// Add a capability to the mask.
    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }
}

/// The supervisor's view of an in-memory simulation model.
///
/// The model itself is owned by the session registry; the supervisor only
/// needs its file name, its capability mask and a way to derive per-task
/// temporary file names.
pub trait Model: Send + Sync {
    /// Short model name for diagnostics.
    fn name(&self) -> &str;

    /// Path of the model's own file on disk.
    fn file_name(&self) -> &Path;

    /// Problem types this model exercises.
    fn capability_mask(&self) -> CapabilityMask;

    /// Derive a temporary file name of the given kind, unique to one task.
    ///
    /// Deterministic given the same inputs: `<dir>/<stem>-<task_id>.<kind>`.
    /// Distinct kinds yield distinct paths, and distinct task ids never
    /// collide even for the same kind.
    fn build_temp_file_name(&self, kind: &str, task_id: &SolverTaskId) -> PathBuf {
        let file_name = self.file_name();
        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name().to_owned());
        let name = format!("{}-{}.{}", stem, task_id, kind);
        match file_name.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
            _ => PathBuf::from(name),
        }
    }
}

/// A concrete simulation model description.
///
/// This is the serialized form exchanged with the solver through snapshot
/// files, and the model type used by the CLI and tests. Richer model
/// representations implement [`Model`] themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationModel {
    /// Short model name.
    pub name: String,

    /// Path of the model file on disk.
    pub file_name: PathBuf,

    /// Problem types this model exercises.
    pub capability_mask: CapabilityMask,
}

impl SimulationModel {
    /// Create a new model description.
    pub fn new(name: impl Into<String>, file_name: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            capability_mask: CapabilityMask::EMPTY,
        }
    }

    /// Builder method to add a capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability_mask.insert(capability);
        self
    }
}

impl Model for SimulationModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_name(&self) -> &Path {
        &self.file_name
    }

    fn capability_mask(&self) -> CapabilityMask {
        self.capability_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_capability_bits_distinct() {
        let bits: HashSet<u32> = Capability::ALL.iter().map(|c| c.bit()).collect();
        assert_eq!(bits.len(), Capability::ALL.len());
    }

    #[test]
    fn test_mask_round_trip() {
        let mask =
            CapabilityMask::from_capabilities(&[Capability::HeatTransfer, Capability::Stress]);
        assert!(mask.contains(Capability::HeatTransfer));
        assert!(mask.contains(Capability::Stress));
        assert!(!mask.contains(Capability::Acoustics));
        assert_eq!(
            mask.capabilities(),
            vec![Capability::HeatTransfer, Capability::Stress]
        );
    }

    #[test]
    fn test_temp_file_names_distinct_and_deterministic() {
        let model = SimulationModel::new("part", "/work/part.model");
        let task_id = SolverTaskId::new("abc123");

        let kinds = ["model", "log", "cvg", "mon"];
        let paths: Vec<PathBuf> = kinds
            .iter()
            .map(|kind| model.build_temp_file_name(kind, &task_id))
            .collect();

        let unique: HashSet<&PathBuf> = paths.iter().collect();
        assert_eq!(unique.len(), kinds.len());

        assert_eq!(paths[1], PathBuf::from("/work/part-abc123.log"));
        assert_eq!(
            model.build_temp_file_name("log", &task_id),
            model.build_temp_file_name("log", &task_id)
        );
    }

    #[test]
    fn test_temp_file_names_differ_per_task() {
        let model = SimulationModel::new("part", "/work/part.model");
        let a = model.build_temp_file_name("log", &SolverTaskId::new("a"));
        let b = model.build_temp_file_name("log", &SolverTaskId::new("b"));
        assert_ne!(a, b);
    }
}
