//! Capacity requirements — the unit of account for all scaling decisions.
//!
//! `CapacityRequirements` is an aggregated bundle of memory, CPU, and
//! machine count. `CapacityRequirementsPerZones` partitions such bundles
//! by zone-set so that zone-aware strategies can plan each partition
//! independently.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::zones::ZonesConfig;

/// An aggregated capacity requirement.
///
/// Comparison is component-wise dominance: `a.greater_or_equals(&b)` means
/// every component of `a` is at least the matching component of `b`. CPU is
/// tracked in milli-cores so the type stays `Eq`-comparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapacityRequirements {
    /// Memory in mebibytes.
    pub memory_mb: u64,
    /// CPU in milli-cores (1000 = one core).
    pub cpu_millis: u64,
    /// Number of machines.
    pub machines: u32,
}

impl CapacityRequirements {
    pub const ZERO: Self = Self {
        memory_mb: 0,
        cpu_millis: 0,
        machines: 0,
    };

    pub fn new(memory_mb: u64, cpu_millis: u64, machines: u32) -> Self {
        Self {
            memory_mb,
            cpu_millis,
            machines,
        }
    }

    /// Capacity expressed as a machine count only.
    pub fn machines(machines: u32) -> Self {
        Self {
            machines,
            ..Self::ZERO
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            memory_mb: self.memory_mb + other.memory_mb,
            cpu_millis: self.cpu_millis + other.cpu_millis,
            machines: self.machines + other.machines,
        }
    }

    /// Component-wise difference, floored at zero.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            memory_mb: self.memory_mb.saturating_sub(other.memory_mb),
            cpu_millis: self.cpu_millis.saturating_sub(other.cpu_millis),
            machines: self.machines.saturating_sub(other.machines),
        }
    }

    /// Every component of `self` is at least the matching one of `other`.
    pub fn greater_or_equals(&self, other: &Self) -> bool {
        self.memory_mb >= other.memory_mb
            && self.cpu_millis >= other.cpu_millis
            && self.machines >= other.machines
    }

    /// Strict dominance: `greater_or_equals` and not equal.
    pub fn greater_than(&self, other: &Self) -> bool {
        self.greater_or_equals(other) && self != other
    }

    /// Component-wise maximum.
    pub fn max(&self, other: &Self) -> Self {
        Self {
            memory_mb: self.memory_mb.max(other.memory_mb),
            cpu_millis: self.cpu_millis.max(other.cpu_millis),
            machines: self.machines.max(other.machines),
        }
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Self) -> Self {
        Self {
            memory_mb: self.memory_mb.min(other.memory_mb),
            cpu_millis: self.cpu_millis.min(other.cpu_millis),
            machines: self.machines.min(other.machines),
        }
    }

    /// Clamp into `[min, max]` component-wise.
    pub fn clamp(&self, min: &Self, max: &Self) -> Self {
        self.max(min).min(max)
    }
}

impl fmt::Display for CapacityRequirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}MB/{}m-cpu/{}mach",
            self.memory_mb, self.cpu_millis, self.machines
        )
    }
}

/// Capacity requirements partitioned by zone-set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRequirementsPerZones {
    capacity: BTreeMap<ZonesConfig, CapacityRequirements>,
}

impl CapacityRequirementsPerZones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capacity for a zone-set. Zero is a real value: a
    /// zone-set scaled down to zero stays in the map so planning keeps
    /// enumerating it.
    pub fn set(&mut self, zones: ZonesConfig, capacity: CapacityRequirements) {
        self.capacity.insert(zones, capacity);
    }

    /// The capacity planned for a zone-set, zero when absent.
    pub fn zones_capacity_or_zero(&self, zones: &ZonesConfig) -> CapacityRequirements {
        self.capacity.get(zones).copied().unwrap_or_default()
    }

    /// True when no zone-set has non-zero capacity.
    pub fn is_zero(&self) -> bool {
        self.capacity.values().all(CapacityRequirements::is_zero)
    }

    /// Sum across all zone-sets.
    pub fn total(&self) -> CapacityRequirements {
        self.capacity
            .values()
            .fold(CapacityRequirements::ZERO, |acc, c| acc.add(c))
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZonesConfig> {
        self.capacity.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZonesConfig, &CapacityRequirements)> {
        self.capacity.iter()
    }

    pub fn len(&self) -> usize {
        self.capacity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacity.is_empty()
    }
}

impl fmt::Display for CapacityRequirementsPerZones {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.capacity.is_empty() {
            return write!(f, "empty");
        }
        let mut first = true;
        for (zones, cap) in &self.capacity {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{zones}={cap}")?;
            first = false;
        }
        Ok(())
    }
}
