//! Machine-provisioning plugin seam.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridscale_core::CapacityRequirements;

/// A machine agent discovered through the provisioning plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineAgent {
    pub id: String,
    pub address: String,
    /// Zone labels carried by the machine.
    pub zones: BTreeSet<String>,
    pub capacity: CapacityRequirements,
}

/// A recognized provisioning-domain discovery failure.
///
/// Anything that is *not* a `DiscoveryFault` (a dropped or panicked
/// discovery task) is treated as a programming error and propagates as a
/// fatal condition instead of being retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DiscoveryFault {
    pub message: String,
}

impl DiscoveryFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Future type returned by the provisioning plugin.
pub type DiscoverFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Vec<MachineAgent>, DiscoveryFault>> + Send>,
>;

/// Pluggable machine-provisioning endpoint.
pub trait MachineProvisioning: Send + Sync {
    /// Start one asynchronous discovery of the current machine set.
    ///
    /// `timeout` is advisory; the cache additionally enforces it and
    /// converts an elapsed timeout into a [`DiscoveryFault`].
    fn discover_machines(&self, timeout: Duration) -> DiscoverFuture;

    /// Filter and order discovered agents per the plugin's own
    /// configuration before they are handed to enforcement.
    fn filter_and_sort(&self, agents: Vec<MachineAgent>) -> Vec<MachineAgent> {
        agents
    }
}

/// Last-known agent set from the admin's own view; the quiet-mode
/// fallback when discovery fails.
pub trait AgentsView: Send + Sync {
    fn known_agents(&self) -> Vec<MachineAgent>;
}
