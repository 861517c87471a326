//! Per-tier thresholds for aborting an in-flight build.

use serde::{Deserialize, Serialize};

use super::{DeviceTier, ThermalState};

/// Thresholds that, once crossed, should cause a build to abort early.
///
/// One fixed value set per device tier, attached read-only to every
/// [`BuildPlan`](super::BuildPlan).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopRules {
    /// Abort when the thermal ordinal reaches this level or above.
    pub thermal_threshold: ThermalState,

    /// Abort when the battery reading drops to this fraction or below.
    pub battery_threshold: f64,

    /// Abort when the memory-pressure estimate reaches this many MB.
    pub memory_threshold_mb: u64,

    /// Hard wall-clock ceiling for the build stage, in milliseconds.
    pub max_duration_ms: u64,
}

impl StopRules {
    /// Default stop rules for a device tier.
    ///
    /// Weaker devices abort earlier on every axis.
    #[must_use]
    pub const fn default_for(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Low => Self {
                thermal_threshold: ThermalState::Fair,
                battery_threshold: 0.15,
                memory_threshold_mb: 1024,
                max_duration_ms: 5000,
            },
            DeviceTier::Medium => Self {
                thermal_threshold: ThermalState::Serious,
                battery_threshold: 0.10,
                memory_threshold_mb: 2048,
                max_duration_ms: 10_000,
            },
            DeviceTier::High => Self {
                thermal_threshold: ThermalState::Critical,
                battery_threshold: 0.05,
                memory_threshold_mb: 4096,
                max_duration_ms: 30_000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_tier_rules() {
        let rules = StopRules::default_for(DeviceTier::Low);
        assert_eq!(rules.thermal_threshold, ThermalState::Fair);
        assert!((rules.battery_threshold - 0.15).abs() < f64::EPSILON);
        assert_eq!(rules.memory_threshold_mb, 1024);
        assert_eq!(rules.max_duration_ms, 5000);
    }

    #[test]
    fn test_tiers_relax_monotonically() {
        let low = StopRules::default_for(DeviceTier::Low);
        let medium = StopRules::default_for(DeviceTier::Medium);
        let high = StopRules::default_for(DeviceTier::High);

        assert!(low.thermal_threshold < medium.thermal_threshold);
        assert!(medium.thermal_threshold < high.thermal_threshold);
        assert!(low.battery_threshold > medium.battery_threshold);
        assert!(low.memory_threshold_mb < medium.memory_threshold_mb);
        assert!(medium.max_duration_ms < high.max_duration_ms);
    }
}
