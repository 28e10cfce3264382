//! Debounced machine-discovery cache.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::plugin::{AgentsView, DiscoveryFault, MachineAgent, MachineProvisioning};

/// Errors returned by [`MachineDiscoveryCache::discovered_agents`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// A discovery call is in flight (or none was started yet); retry on
    /// the next tick.
    #[error("waiting for discovered machines")]
    WaitingForDiscoveredMachines,

    /// The last discovery completed with a provisioning-domain failure.
    #[error("failed to discover machines: {0}")]
    FailedToDiscoverMachines(DiscoveryFault),

    /// The discovery task was dropped or panicked. Fatal: this is a
    /// programming error, not a retryable condition.
    #[error("machine discovery task failed")]
    DiscoveryTaskFailed,
}

impl DiscoveryError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DiscoveryTaskFailed)
    }
}

/// The result handle of the most recent discovery call.
enum DiscoveryHandle {
    Pending(oneshot::Receiver<Result<Vec<MachineAgent>, DiscoveryFault>>),
    Done(Result<Vec<MachineAgent>, DiscoveryFault>),
    TaskFailed,
}

/// Debounces provisioning-plugin polling for one processing unit.
///
/// Machine-added/removed notifications set a dirty flag; the controller
/// tick drains it into at most one asynchronous discovery call. A failed
/// discovery re-arms the flag after a fixed delay instead of retrying
/// immediately. Only the coordination task touches this state.
pub struct MachineDiscoveryCache {
    plugin: Arc<dyn MachineProvisioning>,
    fallback: Arc<dyn AgentsView>,
    discovery_timeout: Duration,
    retry_delay: Duration,
    /// When true, a completed provisioning failure falls back to the
    /// admin view's last known agent set instead of surfacing an error.
    quiet_mode: bool,
    dirty: bool,
    rearm_at: Option<Instant>,
    handle: Option<DiscoveryHandle>,
}

impl MachineDiscoveryCache {
    pub fn new(
        plugin: Arc<dyn MachineProvisioning>,
        fallback: Arc<dyn AgentsView>,
        discovery_timeout: Duration,
        retry_delay: Duration,
        quiet_mode: bool,
    ) -> Self {
        Self {
            plugin,
            fallback,
            discovery_timeout,
            retry_delay,
            quiet_mode,
            // Start dirty so the first tick kicks off a discovery.
            dirty: true,
            rearm_at: None,
            handle: None,
        }
    }

    /// Note a machine-added/removed notification. Many notifications
    /// between two ticks collapse into a single refresh.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// One cache step, called from every controller tick.
    pub fn poll(&mut self) {
        if let Some(rearm_at) = self.rearm_at
            && Instant::now() >= rearm_at
        {
            self.rearm_at = None;
            self.dirty = true;
        }

        self.resolve_pending();

        if self.dirty {
            self.dirty = false;
            self.start_discovery();
        }
    }

    /// The latest discovered agent set.
    pub fn discovered_agents(&mut self) -> Result<Vec<MachineAgent>, DiscoveryError> {
        self.resolve_pending();

        match &self.handle {
            None | Some(DiscoveryHandle::Pending(_)) => {
                Err(DiscoveryError::WaitingForDiscoveredMachines)
            }
            Some(DiscoveryHandle::TaskFailed) => Err(DiscoveryError::DiscoveryTaskFailed),
            Some(DiscoveryHandle::Done(Err(fault))) => {
                if self.quiet_mode {
                    warn!(
                        error = %fault,
                        "machine discovery failed, falling back to last known agents"
                    );
                    Ok(self.fallback.known_agents())
                } else {
                    Err(DiscoveryError::FailedToDiscoverMachines(fault.clone()))
                }
            }
            Some(DiscoveryHandle::Done(Ok(agents))) => {
                Ok(self.plugin.filter_and_sort(agents.clone()))
            }
        }
    }

    /// A fatal discovery failure, if one has occurred. Fatal failures
    /// are never retried; the controller stops the strategy.
    pub fn fatal_failure(&mut self) -> Option<DiscoveryError> {
        self.resolve_pending();
        match self.handle {
            Some(DiscoveryHandle::TaskFailed) => Some(DiscoveryError::DiscoveryTaskFailed),
            _ => None,
        }
    }

    /// Move a completed pending handle into its terminal state, and
    /// schedule the delayed re-arm when it completed with a fault.
    fn resolve_pending(&mut self) {
        let Some(DiscoveryHandle::Pending(rx)) = &mut self.handle else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                if result.is_err() && self.rearm_at.is_none() {
                    self.rearm_at = Some(Instant::now() + self.retry_delay);
                }
                self.handle = Some(DiscoveryHandle::Done(result));
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.handle = Some(DiscoveryHandle::TaskFailed);
            }
        }
    }

    /// Issue one asynchronous discovery call, replacing any previous
    /// handle. A replaced in-flight call completes and is discarded.
    fn start_discovery(&mut self) {
        let (tx, rx) = oneshot::channel();
        let plugin = self.plugin.clone();
        let timeout = self.discovery_timeout;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, plugin.discover_machines(timeout))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(DiscoveryFault::new(format!(
                    "machine discovery timed out after {timeout:?}"
                ))),
            };
            // Receiver may have been replaced by a newer refresh.
            let _ = tx.send(result);
        });

        debug!("machine discovery refresh started");
        self.handle = Some(DiscoveryHandle::Pending(rx));
    }
}
