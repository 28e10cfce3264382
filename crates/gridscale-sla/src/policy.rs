//! Enforcement policies — the declared state endpoints converge toward.

use serde::{Deserialize, Serialize};

use gridscale_core::{
    AutoScalingRule, CapacityRequirements, CapacityRequirementsPerZones, ProcessingUnitSchema,
    ZonesConfig,
};

/// What the machines endpoint should converge toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MachinesSlaTarget {
    /// Allocate as many machines as the bounds allow (eager mode).
    Eager,
    /// Allocate exactly this capacity (capacity-driven mode).
    Capacity { capacity: CapacityRequirements },
}

/// Machine-pool bounds shared by both strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachinePoolSettings {
    pub min_machines: u32,
    pub max_machines: u32,
    /// Memory capacity of one container, in mebibytes.
    pub container_memory_mb: u64,
    /// Maximum containers hosted on one machine.
    pub max_containers_per_machine: u32,
    /// Machines are dedicated to this processing unit (isolation policy).
    pub dedicated_machines: bool,
}

/// Policy for the machine-provisioning SLA endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachinesSlaPolicy {
    pub target: MachinesSlaTarget,
    pub pool: MachinePoolSettings,
    pub zones: ZonesConfig,
}

impl MachinesSlaPolicy {
    /// Eager policy: as many machines as the pool bounds allow.
    pub fn eager(pool: MachinePoolSettings, zones: ZonesConfig) -> Self {
        Self {
            target: MachinesSlaTarget::Eager,
            pool,
            zones,
        }
    }

    /// Capacity-driven policy for one zone-set.
    pub fn capacity(
        pool: MachinePoolSettings,
        capacity: CapacityRequirements,
        zones: ZonesConfig,
    ) -> Self {
        Self {
            target: MachinesSlaTarget::Capacity { capacity },
            pool,
            zones,
        }
    }
}

/// Policy for the containers SLA endpoint: place containers on the
/// machines the machines endpoint has allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainersSlaPolicy {
    /// Capacity currently allocated by the machines endpoint; valid even
    /// while machine deallocation is still pending.
    pub allocated: CapacityRequirementsPerZones,
    pub container_memory_mb: u64,
}

/// Policy for the instance-rebalancing SLA endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingSlaPolicy {
    pub schema: ProcessingUnitSchema,
}

/// Policy for the auto-scaling decision endpoint of one zone-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScalingSlaPolicy {
    /// The capacity last known to be fully enforced.
    pub enforced_capacity: CapacityRequirements,
    pub min_capacity: CapacityRequirements,
    pub max_capacity: CapacityRequirements,
    pub rules: Vec<AutoScalingRule>,
    pub zones: ZonesConfig,
}
