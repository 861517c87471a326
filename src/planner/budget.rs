//! Budget derivation: (tier, content stats, runtime snapshot, mode) → plan.
//!
//! Pure and deterministic. A fixed tier×mode table provides the base
//! budget; live runtime conditions then derate the time and splat budgets
//! through a sequence of multiplicative factors.
//!
//! Each derating step truncates toward zero before the next factor is
//! applied; combining the factors first and truncating once produces
//! different numbers. Do not reorder or merge the steps.

use tracing::debug;

use super::{BuildMode, BuildPlan, CaptureStats, DeviceTier, RuntimeGuards, StopRules, ThermalState};

/// Derive the resource budget for one run.
///
/// `capture_stats` is part of the input contract but does not yet alter
/// the output.
#[must_use]
pub fn make_plan(
    tier: DeviceTier,
    capture_stats: CaptureStats,
    guards: &RuntimeGuards,
    requested_mode: BuildMode,
) -> BuildPlan {
    let _ = capture_stats;

    let base = base_budget(tier, requested_mode);

    let time_budget_ms = derate_time_budget(base.time_budget_ms, guards);
    let max_splats = derate_max_splats(base.max_splats, guards);

    debug!(
        tier = %tier,
        mode = base.mode.name(),
        time_budget_ms,
        max_splats,
        "budget derived"
    );

    BuildPlan {
        device_tier: tier,
        mode: requested_mode,
        time_budget_ms,
        frame_budget: base.frame_budget,
        max_splats,
        lod_level: base.lod_level,
        sh_order: base.sh_order,
        progressive: base.progressive,
        stop_rules: StopRules::default_for(tier),
    }
}

struct BaseBudget {
    mode: BuildMode,
    time_budget_ms: u64,
    frame_budget: u32,
    max_splats: u64,
    lod_level: u8,
    sh_order: u8,
    progressive: bool,
}

/// Fixed tier×mode base budgets.
fn base_budget(tier: DeviceTier, mode: BuildMode) -> BaseBudget {
    let (time_budget_ms, frame_budget, max_splats, lod_level, sh_order, progressive) =
        match (tier, mode) {
            (DeviceTier::Low, BuildMode::Enter) => (2000, 30, 100_000, 1, 1, true),
            (DeviceTier::Low, BuildMode::Publish) => (10_000, 60, 200_000, 1, 1, true),
            (DeviceTier::Low, BuildMode::FailSoft) => (1000, 10, 50_000, 0, 0, false),

            (DeviceTier::Medium, BuildMode::Enter) => (2000, 60, 300_000, 2, 2, true),
            (DeviceTier::Medium, BuildMode::Publish) => (20_000, 120, 500_000, 2, 2, true),
            (DeviceTier::Medium, BuildMode::FailSoft) => (1000, 20, 100_000, 1, 1, false),

            (DeviceTier::High, BuildMode::Enter) => (2000, 120, 500_000, 2, 2, true),
            (DeviceTier::High, BuildMode::Publish) => (30_000, 200, 1_000_000, 3, 3, true),
            (DeviceTier::High, BuildMode::FailSoft) => (1000, 30, 200_000, 1, 1, false),
        };

    BaseBudget {
        mode,
        time_budget_ms,
        frame_budget,
        max_splats,
        lod_level,
        sh_order,
        progressive,
    }
}

/// Sequentially derate the time budget. Order: low-power, thermal, battery.
fn derate_time_budget(base: u64, guards: &RuntimeGuards) -> u64 {
    let mut adjusted = base;

    if guards.is_low_power_mode_enabled {
        adjusted = truncate_scale(adjusted, 0.7);
    }

    if let Some(factor) = thermal_factor(guards.thermal_state) {
        adjusted = truncate_scale(adjusted, factor);
    }

    if let Some(battery_level) = guards.battery_level {
        if battery_level < 0.2 {
            adjusted = truncate_scale(adjusted, 0.8);
        }
    }

    adjusted
}

/// Sequentially derate the splat budget. Order: low-power, thermal.
/// Battery level does not affect splat count.
fn derate_max_splats(base: u64, guards: &RuntimeGuards) -> u64 {
    let mut adjusted = base;

    if guards.is_low_power_mode_enabled {
        adjusted = truncate_scale(adjusted, 0.8);
    }

    if let Some(factor) = thermal_factor(guards.thermal_state) {
        adjusted = truncate_scale(adjusted, factor);
    }

    adjusted
}

fn thermal_factor(state: ThermalState) -> Option<f64> {
    match state {
        ThermalState::Nominal => None,
        ThermalState::Fair => Some(0.9),
        ThermalState::Serious => Some(0.7),
        ThermalState::Critical => Some(0.5),
    }
}

/// Multiply and truncate toward zero, matching integer conversion of the
/// scaled value at every step.
fn truncate_scale(value: u64, factor: f64) -> u64 {
    (value as f64 * factor) as u64
}
