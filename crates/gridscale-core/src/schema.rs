//! Processing-unit schema and recovery state.

use serde::{Deserialize, Serialize};

/// Deployment schema of a processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingUnitSchema {
    /// Number of partitions (0 for a non-partitioned unit).
    pub partitions: u32,
    /// Backups per partition.
    pub backups_per_partition: u32,
    /// Maximum instances of the same partition allowed on one machine
    /// (0 means no per-machine cap).
    pub max_instances_per_machine: u32,
}

impl ProcessingUnitSchema {
    /// Minimum number of machines needed so that a partition and all of
    /// its backups can be placed without breaking the per-machine cap:
    /// `ceil((1 + backups) / max_instances_per_machine)`, or 1 when no
    /// cap is set.
    pub fn minimum_machines(&self) -> u32 {
        if self.max_instances_per_machine == 0 {
            return 1;
        }
        (1 + self.backups_per_partition).div_ceil(self.max_instances_per_machine)
    }
}

/// Whether a processing unit's allocation bookkeeping has been
/// reconstructed after a coordinator restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryState {
    NotRecovered,
    Succeeded,
    Failed,
}
