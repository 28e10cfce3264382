//! Event sinks — where progress events go.
//!
//! Sinks are fire-and-forget: a full or closed sink drops the event with
//! a warning rather than back-pressuring the enforcement loop.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::event::ProgressEvent;

/// Destination for progress events.
pub trait ProgressEventSink: Send + Sync {
    fn publish(&self, event: ProgressEvent);
}

/// Forwards events to an unbounded tokio channel, e.g. toward the admin
/// event store or the alert layer.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressEventSink for ChannelSink {
    fn publish(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            warn!("progress event dropped, sink receiver closed");
        }
    }
}

/// Records events in memory; used by tests and diagnostics.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressEventSink for RecordingSink {
    fn publish(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
