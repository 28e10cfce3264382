//! gridscale-discovery — machine discovery for the enforcement loop.
//!
//! Polls a machine-provisioning plugin asynchronously, debounces
//! concurrent refreshes through a dirty flag, and exposes the latest
//! known agent set with explicit "waiting" vs "failed" semantics. The
//! cache runs on the same coordination task as the strategy controller
//! and never blocks on an in-flight discovery call.

pub mod cache;
pub mod plugin;

pub use cache::{DiscoveryError, MachineDiscoveryCache};
pub use plugin::{AgentsView, DiscoverFuture, DiscoveryFault, MachineAgent, MachineProvisioning};
