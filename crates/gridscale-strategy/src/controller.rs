//! Strategy controller — the periodic reconciliation cycle.
//!
//! One controller per processing unit. The tick is re-armed after each
//! run (fixed delay, not fixed rate): a slow cycle simply delays the
//! next one. All state lives on the controller task, which stands in
//! for the single designated coordination thread; nothing else mutates
//! planned capacity, recovery flags, or event dedup state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use gridscale_core::RecoveryState;
use gridscale_discovery::MachineDiscoveryCache;
use gridscale_events::{ProgressChannel, ProgressEventSink};
use gridscale_sla::PendingReason;

use crate::cluster::ClusterView;
use crate::progress::ProgressEvents;

/// A pluggable scaling policy driven by the controller.
pub trait ScaleStrategy: Send {
    /// Attempt one non-blocking enforcement cycle.
    fn enforce_sla(&mut self, events: &mut ProgressEvents) -> Result<(), PendingReason>;

    /// Whether this unit's allocation bookkeeping has been reconstructed
    /// after a coordinator restart.
    fn recovered_state(&self) -> RecoveryState;

    /// Reconstruct allocation bookkeeping from already-running machines
    /// and containers. Called once when `recovered_state` reports
    /// [`RecoveryState::NotRecovered`].
    fn recover_state(&mut self) -> anyhow::Result<()>;

    /// Undeploy strategies run exactly once to completion and are then
    /// skipped.
    fn is_undeploying(&self) -> bool {
        false
    }
}

/// Owns the enforcement cycle of one processing unit.
pub struct ScaleStrategyController {
    processing_unit: String,
    strategy: Box<dyn ScaleStrategy>,
    events: ProgressEvents,
    /// Shared with the machines endpoint, which reads the discovered
    /// agent set during enforcement; the controller drives `poll`.
    discovery: Arc<Mutex<MachineDiscoveryCache>>,
    cluster: Arc<dyn ClusterView>,
    /// The recovery gate runs every tick until it passes once.
    recovered: bool,
    /// Starts true so undeploy strategies get their first tick.
    in_progress: bool,
}

impl ScaleStrategyController {
    pub fn new(
        processing_unit: impl Into<String>,
        strategy: Box<dyn ScaleStrategy>,
        discovery: Arc<Mutex<MachineDiscoveryCache>>,
        cluster: Arc<dyn ClusterView>,
        sink: Arc<dyn ProgressEventSink>,
    ) -> Self {
        let processing_unit = processing_unit.into();
        let events = ProgressEvents::new(&processing_unit, strategy.is_undeploying(), sink);
        Self {
            processing_unit,
            strategy,
            events,
            discovery,
            cluster,
            recovered: false,
            in_progress: true,
        }
    }

    /// Shared handle to the discovery cache, for wiring
    /// machine-added/removed notifications to
    /// [`MachineDiscoveryCache::mark_dirty`] and for endpoints that read
    /// the discovered agent set.
    pub fn discovery(&self) -> Arc<Mutex<MachineDiscoveryCache>> {
        self.discovery.clone()
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Run the enforcement loop until shutdown.
    ///
    /// Enforcement outcomes never terminate the loop; only fatal
    /// invariant violations (category-d errors) propagate out.
    pub async fn run(
        mut self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!(
            processing_unit = %self.processing_unit,
            interval_secs = interval.as_secs(),
            "scale strategy controller started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.tick() {
                        error!(
                            processing_unit = %self.processing_unit,
                            error = %e,
                            "fatal enforcement error, stopping strategy"
                        );
                        return Err(e);
                    }
                }
                _ = shutdown.changed() => {
                    info!(
                        processing_unit = %self.processing_unit,
                        "scale strategy controller shutting down"
                    );
                    return Ok(());
                }
            }
        }
    }

    /// One enforcement tick.
    pub fn tick(&mut self) -> anyhow::Result<()> {
        if !self.in_progress && self.strategy.is_undeploying() {
            debug!(
                processing_unit = %self.processing_unit,
                "undeploy strategy completed, skipping tick"
            );
            return Ok(());
        }

        if !self.recovered {
            if let Some(reason) = self.recovery_gate()? {
                warn!(
                    processing_unit = %self.processing_unit,
                    reason = %reason,
                    "recovery gate not passed, skipping enforcement"
                );
                self.in_progress = true;
                self.events.report_pending(&reason);
                self.events
                    .report_in_progress(ProgressChannel::Scale, &reason.condition());
                return Ok(());
            }
            self.recovered = true;
        }

        {
            let mut discovery = self
                .discovery
                .lock()
                .map_err(|_| anyhow::anyhow!("discovery cache lock poisoned"))?;
            discovery.poll();
            if let Some(fatal) = discovery.fatal_failure() {
                return Err(fatal.into());
            }
        }

        match self.strategy.enforce_sla(&mut self.events) {
            Ok(()) => {
                self.in_progress = false;
                self.events.report_completed(ProgressChannel::Scale);
                debug!(processing_unit = %self.processing_unit, "sla fully enforced");
            }
            Err(reason) => {
                self.in_progress = true;
                debug!(
                    processing_unit = %self.processing_unit,
                    reason = %reason,
                    "sla enforcement in progress"
                );
                self.events.report_pending(&reason);
                self.events
                    .report_in_progress(ProgressChannel::Scale, &reason.condition());
            }
        }

        Ok(())
    }

    /// The startup recovery gate.
    ///
    /// Returns the blocking condition, or `None` once everything has
    /// recovered. A strategy whose `recover_state` reports success but
    /// whose state still is not recovered violates an invariant and
    /// surfaces as a fatal error.
    fn recovery_gate(&mut self) -> anyhow::Result<Option<PendingReason>> {
        if self.cluster.lookup_services_online() == 0 {
            return Ok(Some(PendingReason::DisconnectedFromLookupService));
        }

        let managers = self.cluster.active_managers();
        if managers != 1 {
            return Ok(Some(PendingReason::WrongNumberOfManagers { found: managers }));
        }

        match self.strategy.recovered_state() {
            RecoveryState::Failed => {
                return Ok(Some(PendingReason::StateRecoveryIncomplete {
                    units: vec![self.processing_unit.clone()],
                }));
            }
            RecoveryState::NotRecovered => {
                info!(
                    processing_unit = %self.processing_unit,
                    "recovering allocation state from running infrastructure"
                );
                self.strategy.recover_state()?;
                if self.strategy.recovered_state() != RecoveryState::Succeeded {
                    anyhow::bail!(
                        "state recovery of {} completed without reaching the recovered state",
                        self.processing_unit
                    );
                }
            }
            RecoveryState::Succeeded => {}
        }

        // Other units share the agent pool; racing an unrecovered peer
        // could double-allocate its machines.
        let offenders: Vec<String> = self
            .cluster
            .elastic_units()
            .into_iter()
            .filter(|unit| {
                unit.name != self.processing_unit && unit.recovery != RecoveryState::Succeeded
            })
            .map(|unit| unit.name)
            .collect();
        if !offenders.is_empty() {
            return Ok(Some(PendingReason::StateRecoveryIncomplete { units: offenders }));
        }

        Ok(None)
    }
}
