//! gridscale-strategy — the elastic SLA-enforcement control loop.
//!
//! A [`ScaleStrategyController`] owns the periodic reconciliation cycle
//! for one processing unit: startup recovery, scheduling, dispatch to a
//! pluggable scale strategy, and triage of enforcement outcomes into
//! progress events. Two strategies ship with the crate:
//!
//! - [`EagerScaleStrategy`] always requests the maximum capacity the
//!   configured bounds allow.
//! - [`AutomaticScaleStrategy`] keeps planned capacity near actual load
//!   by evaluating threshold rules, honoring cooldowns, and never
//!   fighting an in-flight capacity change.
//!
//! All mutable state (planned capacity, recovery flags, event dedup) is
//! owned by the controller task; nothing here needs locking.

pub mod automatic;
pub mod cluster;
pub mod controller;
pub mod cooldown;
pub mod eager;
pub mod progress;

pub use automatic::{AutomaticScaleStrategy, PlanListener};
pub use cluster::{ClusterAgentsView, ClusterView, ElasticUnitStatus};
pub use controller::{ScaleStrategy, ScaleStrategyController};
pub use cooldown::CooldownValidator;
pub use eager::EagerScaleStrategy;
pub use progress::ProgressEvents;
