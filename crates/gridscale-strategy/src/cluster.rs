//! Cluster view seam — read-only admin state the recovery gate checks.

use std::sync::Arc;

use gridscale_core::RecoveryState;
use gridscale_discovery::{AgentsView, MachineAgent};

/// Recovery status of one elastic processing unit visible to the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticUnitStatus {
    pub name: String,
    pub recovery: RecoveryState,
}

/// Read-only view of shared cluster state.
///
/// The controller only ever reads through this trait; cross-unit
/// correctness relies on every unit's controller running the same
/// recovery gate before making allocation decisions.
pub trait ClusterView: Send + Sync {
    /// Number of reachable directory/lookup services.
    fn lookup_services_online(&self) -> usize;

    /// Number of active elastic scaling managers cluster-wide.
    fn active_managers(&self) -> usize;

    /// All elastic processing units and their recovery status.
    fn elastic_units(&self) -> Vec<ElasticUnitStatus>;

    /// Last known full agent set from the admin's own view.
    fn known_agents(&self) -> Vec<MachineAgent>;
}

/// Adapts a [`ClusterView`] to the discovery cache's quiet-mode
/// fallback seam.
pub struct ClusterAgentsView(pub Arc<dyn ClusterView>);

impl AgentsView for ClusterAgentsView {
    fn known_agents(&self) -> Vec<MachineAgent> {
        self.0.known_agents()
    }
}
