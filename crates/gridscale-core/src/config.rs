//! Scale-strategy configuration and its TOML loader.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capacity::CapacityRequirements;
use crate::zones::ZonesConfig;

/// A single autoscaling rule.
///
/// When the named statistic breaches the high threshold the decision
/// endpoint adds `increase` to the planned capacity; when it drops below
/// the low threshold it subtracts `decrease`. Each breach applies the
/// delta once per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScalingRule {
    /// Statistic identifier (e.g. "cpu-percent", "requests-per-second").
    pub statistic: String,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub increase: CapacityRequirements,
    pub decrease: CapacityRequirements,
}

/// Policy parameters for a scale strategy, handed to the strategy as an
/// immutable value by the configuration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleStrategyConfig {
    /// Global lower bound on planned capacity.
    pub min_capacity: CapacityRequirements,
    /// Global upper bound on planned capacity.
    pub max_capacity: CapacityRequirements,
    /// Optional per-zone lower bounds, overriding the global minimum.
    #[serde(default)]
    pub min_capacity_per_zones: BTreeMap<ZonesConfig, CapacityRequirements>,
    /// Optional per-zone upper bounds, overriding the global maximum.
    #[serde(default)]
    pub max_capacity_per_zones: BTreeMap<ZonesConfig, CapacityRequirements>,
    /// Capacity requested before any rule has fired.
    pub initial_capacity: CapacityRequirements,
    #[serde(default)]
    pub rules: Vec<AutoScalingRule>,
    /// Seconds to wait after a scale-out before another automatic change.
    pub cooldown_after_scale_out_secs: u64,
    /// Seconds to wait after a scale-in before another automatic change.
    pub cooldown_after_scale_in_secs: u64,
    /// Seconds between enforcement ticks.
    pub polling_interval_secs: u64,
    /// Seconds between statistics samples fed to the rules.
    pub statistics_polling_interval_secs: u64,
}

impl ScaleStrategyConfig {
    pub fn cooldown_after_scale_out(&self) -> Duration {
        Duration::from_secs(self.cooldown_after_scale_out_secs)
    }

    pub fn cooldown_after_scale_in(&self) -> Duration {
        Duration::from_secs(self.cooldown_after_scale_in_secs)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// The minimum applicable to a zone-set.
    pub fn min_for(&self, zones: &ZonesConfig) -> CapacityRequirements {
        self.min_capacity_per_zones
            .get(zones)
            .copied()
            .unwrap_or(self.min_capacity)
    }

    /// The maximum applicable to a zone-set.
    pub fn max_for(&self, zones: &ZonesConfig) -> CapacityRequirements {
        self.max_capacity_per_zones
            .get(zones)
            .copied()
            .unwrap_or(self.max_capacity)
    }

    /// Clamp a planned capacity into the `[min, max]` window applicable
    /// to the zone-set. Planned capacity must never leave this window.
    pub fn clamp(&self, capacity: CapacityRequirements, zones: &ZonesConfig) -> CapacityRequirements {
        capacity.clamp(&self.min_for(zones), &self.max_for(zones))
    }
}

impl Default for ScaleStrategyConfig {
    fn default() -> Self {
        Self {
            min_capacity: CapacityRequirements::ZERO,
            max_capacity: CapacityRequirements::new(u64::MAX, u64::MAX, u32::MAX),
            min_capacity_per_zones: BTreeMap::new(),
            max_capacity_per_zones: BTreeMap::new(),
            initial_capacity: CapacityRequirements::ZERO,
            rules: Vec::new(),
            cooldown_after_scale_out_secs: 0,
            cooldown_after_scale_in_secs: 0,
            polling_interval_secs: 5,
            statistics_polling_interval_secs: 60,
        }
    }
}

// ── TOML strategy file ─────────────────────────────────────────────

/// Raw on-disk strategy file. All fields optional; missing values fall
/// back to [`ScaleStrategyConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyFileConfig {
    pub capacity: Option<CapacityFileSection>,
    pub cooldown: Option<CooldownFileSection>,
    pub polling: Option<PollingFileSection>,
    #[serde(default)]
    pub rule: Vec<AutoScalingRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityFileSection {
    pub min: Option<CapacityRequirements>,
    pub max: Option<CapacityRequirements>,
    pub initial: Option<CapacityRequirements>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownFileSection {
    pub after_scale_out_secs: Option<u64>,
    pub after_scale_in_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingFileSection {
    pub interval_secs: Option<u64>,
    pub statistics_interval_secs: Option<u64>,
}

impl StrategyFileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StrategyFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the raw file into a full strategy config.
    pub fn resolve(self) -> ScaleStrategyConfig {
        let defaults = ScaleStrategyConfig::default();
        let capacity = self.capacity.unwrap_or(CapacityFileSection {
            min: None,
            max: None,
            initial: None,
        });
        let cooldown = self.cooldown.unwrap_or(CooldownFileSection {
            after_scale_out_secs: None,
            after_scale_in_secs: None,
        });
        let polling = self.polling.unwrap_or(PollingFileSection {
            interval_secs: None,
            statistics_interval_secs: None,
        });

        ScaleStrategyConfig {
            min_capacity: capacity.min.unwrap_or(defaults.min_capacity),
            max_capacity: capacity.max.unwrap_or(defaults.max_capacity),
            initial_capacity: capacity
                .initial
                .or(capacity.min)
                .unwrap_or(defaults.initial_capacity),
            rules: self.rule,
            cooldown_after_scale_out_secs: cooldown
                .after_scale_out_secs
                .unwrap_or(defaults.cooldown_after_scale_out_secs),
            cooldown_after_scale_in_secs: cooldown
                .after_scale_in_secs
                .unwrap_or(defaults.cooldown_after_scale_in_secs),
            polling_interval_secs: polling
                .interval_secs
                .unwrap_or(defaults.polling_interval_secs),
            statistics_polling_interval_secs: polling
                .statistics_interval_secs
                .unwrap_or(defaults.statistics_polling_interval_secs),
            ..defaults
        }
    }
}
