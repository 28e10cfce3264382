//! Eager scale strategy — grab every machine the bounds allow.

use tracing::debug;

use gridscale_core::{ProcessingUnitSchema, RecoveryState, ZonesConfig};
use gridscale_events::ProgressChannel;
use gridscale_sla::{
    ContainersEndpoint, ContainersSlaPolicy, MachinePoolSettings, MachinesEndpoint,
    MachinesSlaPolicy, PendingReason, RebalancingEndpoint, RebalancingSlaPolicy,
};

use crate::controller::ScaleStrategy;
use crate::progress::ProgressEvents;

/// Scales the processing unit onto as many machines as the pool bounds
/// allow, in any zone.
///
/// The pipeline always runs machines, then containers, then rebalancing.
/// Deallocations overlap: a machine that cannot be released yet because
/// containers still live on it does not stop container or instance
/// enforcement from making progress in the same tick. The pending
/// condition of the furthest-upstream stage is what the cycle reports.
pub struct EagerScaleStrategy {
    schema: ProcessingUnitSchema,
    pool: MachinePoolSettings,
    undeploying: bool,
    recovery: RecoveryState,
    machines: Box<dyn MachinesEndpoint>,
    containers: Box<dyn ContainersEndpoint>,
    rebalancing: Box<dyn RebalancingEndpoint>,
}

impl EagerScaleStrategy {
    pub fn new(
        schema: ProcessingUnitSchema,
        pool: MachinePoolSettings,
        machines: Box<dyn MachinesEndpoint>,
        containers: Box<dyn ContainersEndpoint>,
        rebalancing: Box<dyn RebalancingEndpoint>,
    ) -> Self {
        Self {
            schema,
            pool,
            undeploying: false,
            recovery: RecoveryState::NotRecovered,
            machines,
            containers,
            rebalancing,
        }
    }

    /// Undeploy variant: the same pipeline run once to completion, with
    /// the pool bounds set to release everything.
    pub fn undeploying(mut self) -> Self {
        self.undeploying = true;
        self
    }

    fn machines_policy(&self) -> MachinesSlaPolicy {
        let mut pool = self.pool;
        // Deployment topology may need more machines than the pool floor.
        pool.min_machines = pool.min_machines.max(self.schema.minimum_machines());
        MachinesSlaPolicy::eager(pool, ZonesConfig::AnyZones)
    }
}

impl ScaleStrategy for EagerScaleStrategy {
    fn enforce_sla(&mut self, events: &mut ProgressEvents) -> Result<(), PendingReason> {
        let machines_pending = match self.machines.enforce(&self.machines_policy()) {
            Ok(()) => {
                events.report_completed(ProgressChannel::Machines);
                None
            }
            // Machine release blocked on container release: downstream
            // stages are exactly what unblocks it, so keep going.
            Err(reason @ PendingReason::PendingContainerDeallocation) => {
                debug!(reason = %reason, "continuing past machines stage");
                Some(reason)
            }
            Err(reason) => return Err(reason),
        };

        let containers_policy = ContainersSlaPolicy {
            allocated: self.machines.allocated_capacity(),
            container_memory_mb: self.pool.container_memory_mb,
        };
        let containers_pending = match self.containers.enforce(&containers_policy) {
            Ok(()) => {
                events.report_completed(ProgressChannel::Containers);
                None
            }
            // Same overlap for container release blocked on instance
            // removal.
            Err(reason @ PendingReason::PendingProcessingUnitRemoval) => {
                debug!(reason = %reason, "continuing past containers stage");
                Some(reason)
            }
            Err(reason) => return Err(reason),
        };

        self.rebalancing.enforce(&RebalancingSlaPolicy {
            schema: self.schema,
        })?;
        events.report_completed(ProgressChannel::Instances);

        // Furthest-upstream pending wins.
        match machines_pending.or(containers_pending) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn recovered_state(&self) -> RecoveryState {
        self.recovery
    }

    fn recover_state(&mut self) -> anyhow::Result<()> {
        // The endpoints own the allocation bookkeeping; once they have
        // been constructed over the running machines and containers the
        // eager strategy itself carries no plan to rebuild.
        let allocated = self.machines.allocated_capacity();
        debug!(allocated = %allocated, "recovered eager allocation state");
        self.recovery = RecoveryState::Succeeded;
        Ok(())
    }

    fn is_undeploying(&self) -> bool {
        self.undeploying
    }
}
