//! Per-unit progress reporting — one dedup state machine per channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use gridscale_events::{
    ProgressChannel, ProgressCondition, ProgressEventSink, ProgressEventState,
};
use gridscale_sla::PendingReason;

/// All progress channels of one processing unit.
///
/// Owned by the controller and handed to the strategy during
/// `enforce_sla` so stage completions and autoscaling decisions are
/// reported through the same dedup state as the controller's own triage.
pub struct ProgressEvents {
    states: BTreeMap<ProgressChannel, ProgressEventState>,
}

impl ProgressEvents {
    pub fn new(
        processing_unit: &str,
        undeploying: bool,
        sink: Arc<dyn ProgressEventSink>,
    ) -> Self {
        let states = ProgressChannel::ALL
            .into_iter()
            .map(|channel| {
                (
                    channel,
                    ProgressEventState::new(channel, processing_unit, undeploying, sink.clone()),
                )
            })
            .collect();
        Self { states }
    }

    pub fn report_in_progress(&mut self, channel: ProgressChannel, condition: &ProgressCondition) {
        self.state(channel).report_in_progress(condition);
    }

    pub fn report_completed(&mut self, channel: ProgressChannel) {
        self.state(channel).report_completed();
    }

    /// Route a pending reason to the channel it maps to.
    pub fn report_pending(&mut self, reason: &PendingReason) {
        let condition = reason.condition();
        self.report_in_progress(reason.channel(), &condition);
    }

    fn state(&mut self, channel: ProgressChannel) -> &mut ProgressEventState {
        // All channels are created in `new`.
        self.states
            .get_mut(&channel)
            .unwrap_or_else(|| unreachable!("missing progress channel {channel}"))
    }
}
