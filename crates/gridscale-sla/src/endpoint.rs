//! SLA-enforcement endpoint traits.
//!
//! Endpoints attempt one non-blocking step of convergence per call and
//! report partial progress through [`PendingReason`]. Implementations
//! live in the hosting layer; tests use mock impls.

use gridscale_core::{CapacityRequirements, CapacityRequirementsPerZones};

use crate::pending::PendingReason;
use crate::policy::{
    AutoScalingSlaPolicy, ContainersSlaPolicy, MachinesSlaPolicy, RebalancingSlaPolicy,
};

/// Converges the set of allocated machines toward the policy.
pub trait MachinesEndpoint: Send {
    fn enforce(&mut self, policy: &MachinesSlaPolicy) -> Result<(), PendingReason>;

    /// The capacity currently allocated to the processing unit.
    ///
    /// Valid even when the last `enforce` call reported a pending
    /// condition: downstream stages reconcile against whatever is
    /// actually allocated right now.
    fn allocated_capacity(&self) -> CapacityRequirementsPerZones;
}

/// Converges containers on the allocated machines toward the policy.
pub trait ContainersEndpoint: Send {
    fn enforce(&mut self, policy: &ContainersSlaPolicy) -> Result<(), PendingReason>;
}

/// Relocates processing-unit instances across containers until the
/// deployment is balanced.
pub trait RebalancingEndpoint: Send {
    fn enforce(&mut self, policy: &RebalancingSlaPolicy) -> Result<(), PendingReason>;
}

/// Direction of an automatic capacity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Up,
    Down,
}

/// Result of one auto-scaling evaluation for a zone-set.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoScalingOutcome {
    /// No rule fired; keep the current plan.
    NoChange,
    /// A threshold was breached and a new target capacity computed.
    /// This is a decision, not an error.
    ThresholdBreached {
        direction: ScaleDirection,
        new_capacity: CapacityRequirements,
        /// Human-meaningful description of the choice made.
        reason: String,
    },
}

/// Evaluates autoscaling rules against collected statistics and decides
/// whether the planned capacity of a zone-set should change.
pub trait AutoScalingEndpoint: Send {
    fn enforce(&mut self, policy: &AutoScalingSlaPolicy)
    -> Result<AutoScalingOutcome, PendingReason>;
}
