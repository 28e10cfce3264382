//! gridscale-events — progress events for the enforcement loop.
//!
//! Enforcement outcomes (success, typed in-progress conditions, decisions,
//! failures) are turned into deduplicated external events, one small state
//! machine per progress channel. Event emission is fire-and-forget: the
//! state machine never fails, it only shapes what is forwarded to the sink.

pub mod event;
pub mod sink;
pub mod state;

pub use event::{EventKind, ProgressChannel, ProgressCondition, ProgressEvent};
pub use sink::{ChannelSink, ProgressEventSink, RecordingSink};
pub use state::ProgressEventState;
