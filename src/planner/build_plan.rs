//! Build modes, content statistics, and the resolved resource budget.

use serde::{Deserialize, Serialize};

use super::{DeviceTier, StopRules, ThermalState};

/// Requested quality/latency trade-off for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Fast low-latency pass — a roamable result within a couple of seconds.
    Enter,
    /// Higher-quality slower pass, 10–30 s depending on tier.
    Publish,
    /// Degraded fallback output.
    FailSoft,
}

impl BuildMode {
    /// Display name used in plan summaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Publish => "Publish",
            Self::FailSoft => "Fail-soft",
        }
    }
}

/// Content statistics for the captured material.
///
/// Accepted by the planner but not yet consulted — kept as the planner's
/// extension point for coverage-aware budgets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureStats {
    /// Number of captured frames.
    pub frame_count: u32,

    /// Scene coverage estimate in `[0.0, 1.0]`.
    pub coverage_estimate: f64,
}

impl CaptureStats {
    /// Neutral placeholder used when no capture analysis has run.
    #[must_use]
    pub const fn placeholder() -> Self {
        Self {
            frame_count: 0,
            coverage_estimate: 0.0,
        }
    }
}

/// The resolved resource budget for one run.
///
/// A budget description only — it names no algorithm and selects no
/// plugin. Produced once per run by
/// [`make_plan`](super::make_plan), immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Tier the plan was computed for (diagnostics).
    pub device_tier: DeviceTier,

    /// Requested mode.
    pub mode: BuildMode,

    /// Wall-clock budget for the build stage, milliseconds.
    pub time_budget_ms: u64,

    /// Maximum frames to decode from the source video.
    pub frame_budget: u32,

    /// Maximum splat count for the artifact.
    pub max_splats: u64,

    /// Level-of-detail selector (0–N).
    pub lod_level: u8,

    /// Spherical-harmonics order (0–3).
    pub sh_order: u8,

    /// Whether progressive output is enabled.
    pub progressive: bool,

    /// Early-abort thresholds for this run.
    pub stop_rules: StopRules,
}

impl BuildPlan {
    /// Human-readable budget summary for diagnostics and logs.
    ///
    /// Carries the tier letter, mode name, every budget field, and the
    /// stop-rule categories that are active. Never used for control flow.
    #[must_use]
    pub fn summary(&self) -> String {
        let splats = if self.max_splats >= 1000 {
            format!("{}K", self.max_splats / 1000)
        } else {
            self.max_splats.to_string()
        };

        format!(
            "[Tier {}] {} mode: {}ms, {} frames, {} splats, LOD={}, SH={}, progressive={}, stops=[{}]",
            self.device_tier.letter(),
            self.mode.name(),
            self.time_budget_ms,
            self.frame_budget,
            splats,
            self.lod_level,
            self.sh_order,
            self.progressive,
            self.active_stop_categories().join(", "),
        )
    }

    fn active_stop_categories(&self) -> Vec<&'static str> {
        let mut parts = Vec::new();
        if self.stop_rules.thermal_threshold != ThermalState::Critical {
            parts.push("thermal");
        }
        if self.stop_rules.battery_threshold > 0.0 {
            parts.push("battery");
        }
        if self.stop_rules.memory_threshold_mb > 0 {
            parts.push("memory");
        }
        parts
    }
}
