//! Typed pending conditions.
//!
//! Every recoverable enforcement condition is a `PendingReason`: the
//! cycle could not fully converge this tick and should be retried on the
//! next one. Recovery-blocking conditions (no lookup service, wrong
//! manager count, unrecovered peers) live here too since they follow the
//! same retry-next-tick path. Fatal conditions are *not* represented;
//! those propagate as `anyhow::Error` and stop the strategy.

use std::time::Duration;

use thiserror::Error;

use gridscale_core::ZonesConfig;
use gridscale_events::{ProgressChannel, ProgressCondition};

/// A condition that leaves the current enforcement cycle incomplete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PendingReason {
    #[error("machine provisioning still in progress")]
    MachinesInProgress,

    /// Machines cannot be deallocated until containers move off them.
    #[error("machine deallocation pending container deallocation")]
    PendingContainerDeallocation,

    /// The machine allocation changed underneath the current plan.
    #[error("machines allocation changed, plan is stale")]
    MachinesPlanChanged,

    /// Machine provisioning hit a recognized infrastructure failure.
    #[error("machine provisioning failed: {reason}")]
    MachinesProvisioningFailure { reason: String },

    #[error("container provisioning still in progress")]
    ContainersInProgress,

    /// Containers cannot be deallocated until processing-unit instances
    /// are removed from them.
    #[error("container deallocation pending processing unit instance removal")]
    PendingProcessingUnitRemoval,

    #[error("instance rebalancing still in progress")]
    RebalancingInProgress,

    /// Auto-scaling decisions are still converging for one or more
    /// zone-sets. Each entry carries the zone-set and a description.
    #[error("auto-scaling in progress for {} zone set(s)", per_zone.len())]
    AutoScalingInProgress {
        per_zone: Vec<(ZonesConfig, String)>,
    },

    /// A capacity change happened too recently for another automatic one.
    #[error("cooldown active, {remaining:?} remaining")]
    CooldownActive { remaining: Duration },

    #[error("disconnected from lookup service")]
    DisconnectedFromLookupService,

    /// There must be exactly one active elastic scaling manager.
    #[error("wrong number of elastic scaling managers: found {found}")]
    WrongNumberOfManagers { found: usize },

    /// One or more processing units have not completed state recovery.
    #[error("processing units have not completed state recovery: {units:?}")]
    StateRecoveryIncomplete { units: Vec<String> },
}

impl PendingReason {
    /// The progress channel this condition is reported on.
    pub fn channel(&self) -> ProgressChannel {
        match self {
            Self::MachinesInProgress
            | Self::PendingContainerDeallocation
            | Self::MachinesPlanChanged
            | Self::MachinesProvisioningFailure { .. }
            | Self::DisconnectedFromLookupService
            | Self::WrongNumberOfManagers { .. }
            | Self::StateRecoveryIncomplete { .. } => ProgressChannel::Machines,

            Self::ContainersInProgress | Self::PendingProcessingUnitRemoval => {
                ProgressChannel::Containers
            }

            Self::RebalancingInProgress => ProgressChannel::Instances,

            Self::AutoScalingInProgress { .. } | Self::CooldownActive { .. } => {
                ProgressChannel::AutoScaling
            }
        }
    }

    /// True for conditions that must pass before any enforcement runs.
    pub fn is_recovery_blocking(&self) -> bool {
        matches!(
            self,
            Self::DisconnectedFromLookupService
                | Self::WrongNumberOfManagers { .. }
                | Self::StateRecoveryIncomplete { .. }
        )
    }

    /// The progress condition this reason reports.
    pub fn condition(&self) -> ProgressCondition {
        match self {
            Self::MachinesProvisioningFailure { .. } => {
                ProgressCondition::failure(self.to_string())
            }
            _ => ProgressCondition::in_progress(self.to_string()),
        }
    }
}
