//! gridscale-sla — the seams between strategies and infrastructure.
//!
//! SLA-enforcement endpoints are collaborators that try to converge real
//! infrastructure (machines, containers, instance placement) toward a
//! declared policy. Each call either succeeds or reports a typed pending
//! condition; partial progress is modeled as explicit `Result` values,
//! never as panics or opaque errors.

pub mod endpoint;
pub mod pending;
pub mod policy;

pub use endpoint::{
    AutoScalingEndpoint, AutoScalingOutcome, ContainersEndpoint, MachinesEndpoint,
    RebalancingEndpoint, ScaleDirection,
};
pub use pending::PendingReason;
pub use policy::{
    AutoScalingSlaPolicy, ContainersSlaPolicy, MachinePoolSettings, MachinesSlaPolicy,
    MachinesSlaTarget, RebalancingSlaPolicy,
};
