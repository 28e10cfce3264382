//! Per-channel progress-event state machine.
//!
//! Converts enforcement outcomes into idempotent in-progress/completed
//! events. Many identical in-progress reports between two completions
//! collapse into one event; decisions and failures dedup by condition
//! equality instead, so every new decision is visible downstream.

use std::sync::Arc;

use tracing::debug;

use crate::event::{EventKind, ProgressChannel, ProgressCondition, ProgressEvent};
use crate::sink::ProgressEventSink;

/// Dedup state machine for a single progress channel of one processing
/// unit. Only the coordination task touches it, so no locking is needed.
pub struct ProgressEventState {
    channel: ProgressChannel,
    processing_unit: String,
    undeploying: bool,
    sink: Arc<dyn ProgressEventSink>,
    in_progress_raised: bool,
    completed_raised: bool,
    last_decision: Option<ProgressCondition>,
    last_failure: Option<ProgressCondition>,
}

impl ProgressEventState {
    pub fn new(
        channel: ProgressChannel,
        processing_unit: impl Into<String>,
        undeploying: bool,
        sink: Arc<dyn ProgressEventSink>,
    ) -> Self {
        Self {
            channel,
            processing_unit: processing_unit.into(),
            undeploying,
            sink,
            in_progress_raised: false,
            completed_raised: false,
            last_decision: None,
            last_failure: None,
        }
    }

    /// Report an in-progress condition on this channel.
    ///
    /// Decisions always emit when they differ from the last remembered
    /// condition; otherwise a single generic in-progress event is emitted
    /// until the next completion. A failure condition additionally emits a
    /// failure event whenever it differs from the last reported failure.
    pub fn report_in_progress(&mut self, condition: &ProgressCondition) {
        self.completed_raised = false;

        if condition.decision && self.last_decision.as_ref() != Some(condition) {
            self.emit(condition, EventKind::Decision);
            self.last_decision = Some(condition.clone());
        } else if !self.in_progress_raised {
            self.emit(condition, EventKind::InProgress);
            self.in_progress_raised = true;
        } else {
            debug!(
                channel = %self.channel,
                processing_unit = %self.processing_unit,
                "in-progress event already raised, dropping"
            );
        }

        if condition.failure && self.last_failure.as_ref() != Some(condition) {
            self.emit(condition, EventKind::Failure);
            self.last_failure = Some(condition.clone());
        }
    }

    /// Report that this channel's enforcement has completed.
    ///
    /// Idempotent: a second call without an intervening in-progress report
    /// emits nothing.
    pub fn report_completed(&mut self) {
        if self.completed_raised {
            return;
        }
        self.sink.publish(ProgressEvent {
            channel: self.channel,
            kind: EventKind::Completed,
            complete: true,
            undeploying: self.undeploying,
            processing_unit: self.processing_unit.clone(),
            zones: None,
            message: None,
        });
        self.completed_raised = true;
        self.in_progress_raised = false;
        self.last_decision = None;
        self.last_failure = None;
    }

    fn emit(&self, condition: &ProgressCondition, kind: EventKind) {
        self.sink.publish(ProgressEvent {
            channel: self.channel,
            kind,
            complete: false,
            undeploying: self.undeploying,
            processing_unit: self.processing_unit.clone(),
            zones: condition.zones.clone(),
            message: Some(condition.message.clone()),
        });
    }
}
