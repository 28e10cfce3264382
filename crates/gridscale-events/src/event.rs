//! Progress-event model.

use std::fmt;

use serde::{Deserialize, Serialize};

use gridscale_core::ZonesConfig;

/// The progress channels tracked per processing unit.
///
/// Each channel gets its own dedup state machine; an in-progress event on
/// one channel never suppresses events on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressChannel {
    Machines,
    Agents,
    Containers,
    Instances,
    Scale,
    AutoScaling,
    CapacityPlanning,
}

impl ProgressChannel {
    pub const ALL: [ProgressChannel; 7] = [
        ProgressChannel::Machines,
        ProgressChannel::Agents,
        ProgressChannel::Containers,
        ProgressChannel::Instances,
        ProgressChannel::Scale,
        ProgressChannel::AutoScaling,
        ProgressChannel::CapacityPlanning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machines => "machines",
            Self::Agents => "agents",
            Self::Containers => "containers",
            Self::Instances => "instances",
            Self::Scale => "scale",
            Self::AutoScaling => "auto-scaling",
            Self::CapacityPlanning => "capacity-planning",
        }
    }
}

impl fmt::Display for ProgressChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    InProgress,
    Completed,
    /// A human-meaningful autoscaling choice (not an error).
    Decision,
    /// A typed failure description attached to an in-progress condition.
    Failure,
}

/// The externally observable unit emitted by a progress-event state
/// machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub channel: ProgressChannel,
    pub kind: EventKind,
    /// True for completed events.
    pub complete: bool,
    /// True while the processing unit is being undeployed.
    pub undeploying: bool,
    pub processing_unit: String,
    pub zones: Option<ZonesConfig>,
    /// Decision or failure description, absent for plain events.
    pub message: Option<String>,
}

/// An enforcement condition reported into a channel.
///
/// A condition may be a decision (describes a choice made), a failure
/// (carries a failure description), both, or neither (a plain in-progress
/// condition). Equality is by payload: two conditions with the same
/// message and flags are the same condition for dedup purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressCondition {
    pub message: String,
    pub decision: bool,
    pub failure: bool,
    /// Zone-set the condition applies to, if any.
    pub zones: Option<ZonesConfig>,
}

impl ProgressCondition {
    pub fn in_progress(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            decision: false,
            failure: false,
            zones: None,
        }
    }

    pub fn decision(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            decision: true,
            failure: false,
            zones: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            decision: false,
            failure: true,
            zones: None,
        }
    }

    pub fn with_zones(mut self, zones: ZonesConfig) -> Self {
        self.zones = Some(zones);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_for_the_admin_api() {
        let event = ProgressEvent {
            channel: ProgressChannel::AutoScaling,
            kind: EventKind::Decision,
            complete: false,
            undeploying: false,
            processing_unit: "pu-1".to_string(),
            zones: None,
            message: Some("scale out to 3 machines".to_string()),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["channel"], "auto_scaling");
        assert_eq!(json["kind"], "decision");
        assert_eq!(json["message"], "scale out to 3 machines");

        let back: ProgressEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
