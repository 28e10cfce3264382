//! gridscale-core — capacity model for the elastic scaling loop.
//!
//! Domain types shared by every other crate: capacity requirements
//! (aggregated and per zone-set), zone configuration, processing-unit
//! schemas, recovery state, and the scale-strategy configuration with
//! its TOML loader.
//!
//! All types are serializable so that plans and configs can be logged,
//! persisted, or shipped over the admin surface as JSON/TOML.

pub mod capacity;
pub mod config;
pub mod schema;
pub mod zones;

pub use capacity::{CapacityRequirements, CapacityRequirementsPerZones};
pub use config::{AutoScalingRule, ScaleStrategyConfig, StrategyFileConfig};
pub use schema::{ProcessingUnitSchema, RecoveryState};
pub use zones::ZonesConfig;
