//! Zone configuration — the partitioning dimension for planned capacity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which zones a capacity requirement applies to.
///
/// Either "any zones" (the machine pool is not partitioned) or an explicit
/// named set. Immutable once constructed; usable as a map key so planned
/// and enforced capacity can be partitioned per zone-set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZonesConfig {
    /// No zone restriction: machines from any zone may be allocated.
    AnyZones,
    /// Machines must carry exactly this zone label set.
    Exact { zones: BTreeSet<String> },
}

impl ZonesConfig {
    /// Build an exact zone-set from zone labels.
    pub fn exact<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact {
            zones: zones.into_iter().map(Into::into).collect(),
        }
    }

    /// True when no zone restriction applies.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::AnyZones)
    }

    /// Iterate zone labels (empty for `AnyZones`).
    pub fn iter_labels(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::AnyZones => None,
            Self::Exact { zones } => Some(zones),
        }
        .into_iter()
        .flat_map(|z| z.iter().map(String::as_str))
    }

    /// True when a machine carrying `machine_zones` satisfies this config.
    pub fn accepts(&self, machine_zones: &BTreeSet<String>) -> bool {
        match self {
            Self::AnyZones => true,
            Self::Exact { zones } => zones.iter().all(|z| machine_zones.contains(z)),
        }
    }
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self::AnyZones
    }
}

impl fmt::Display for ZonesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyZones => write!(f, "any-zones"),
            Self::Exact { zones } => {
                let labels: Vec<&str> = zones.iter().map(String::as_str).collect();
                write!(f, "zones[{}]", labels.join(","))
            }
        }
    }
}
