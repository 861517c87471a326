//! Runtime operating-condition snapshots and stop-rule evaluation.
//!
//! [`RuntimeGuards`] is a one-shot read of live conditions taken at planning
//! time — no listeners, no recomputation mid-run. A guard snapshot taken for
//! a run stays frozen for that run's lifetime; long-running stages re-check
//! it against the plan's [`StopRules`](super::StopRules) on demand via
//! [`RuntimeGuards::should_stop_building`].

use serde::{Deserialize, Serialize};

use super::StopRules;

// ============================================================================
// System Probe
// ============================================================================

/// Swappable source of raw device signals.
///
/// One host implementation reads from the OS; tests script their own values.
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait SystemProbe: Send + Sync {
    /// Total physical memory in bytes.
    fn physical_memory_bytes(&self) -> u64;

    /// Current thermal pressure reported by the platform.
    fn thermal_state(&self) -> ThermalState;

    /// Whether the OS power-saving mode is active.
    fn is_low_power_mode_enabled(&self) -> bool;

    /// Battery charge in `[0.0, 1.0]`, or `None` when monitoring is
    /// unavailable (desktops, unsupported platforms).
    fn battery_level(&self) -> Option<f64>;
}

/// Probe backed by the host operating system.
///
/// Physical memory comes from sysconf. Thermal and battery signals have no
/// portable source, so they report nominal / unavailable — the planner then
/// applies no derating, which is the correct neutral behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn physical_memory_bytes(&self) -> u64 {
        host_physical_memory_bytes()
    }

    fn thermal_state(&self) -> ThermalState {
        ThermalState::Nominal
    }

    fn is_low_power_mode_enabled(&self) -> bool {
        false
    }

    fn battery_level(&self) -> Option<f64> {
        None
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn host_physical_memory_bytes() -> u64 {
    let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
    if pages <= 0 || page_size <= 0 {
        // sysconf failed — classify as a mid-range device rather than abort
        return 8 * 1024 * 1024 * 1024;
    }
    pages as u64 * page_size as u64
}

#[cfg(not(unix))]
fn host_physical_memory_bytes() -> u64 {
    8 * 1024 * 1024 * 1024
}

// ============================================================================
// Thermal State
// ============================================================================

/// Platform thermal pressure, ordered from coolest to hottest.
///
/// The ordinal ordering is load-bearing: stop rules compare with `>=` and
/// the planner derates budgets per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl std::fmt::Display for ThermalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Nominal => "Nominal",
            Self::Fair => "Fair",
            Self::Serious => "Serious",
            Self::Critical => "Critical",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Runtime Guards
// ============================================================================

/// One-shot snapshot of live operating conditions.
///
/// Never mutated after creation. Create a fresh snapshot per planning call
/// with [`RuntimeGuards::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeGuards {
    /// Thermal pressure at snapshot time.
    pub thermal_state: ThermalState,

    /// OS power-saving mode flag at snapshot time.
    pub is_low_power_mode_enabled: bool,

    /// Battery charge in `[0.0, 1.0]`, absent if unmeasurable.
    pub battery_level: Option<f64>,

    /// Conservative memory-pressure estimate in MB: 80% of physical
    /// memory, a static proxy rather than live pressure.
    pub memory_pressure_estimate_mb: u64,
}

impl RuntimeGuards {
    /// Take a snapshot of the current conditions from `probe`.
    #[must_use]
    pub fn snapshot(probe: &dyn SystemProbe) -> Self {
        let physical_mb = probe.physical_memory_bytes() / (1024 * 1024);
        Self {
            thermal_state: probe.thermal_state(),
            is_low_power_mode_enabled: probe.is_low_power_mode_enabled(),
            battery_level: probe.battery_level(),
            memory_pressure_estimate_mb: (physical_mb as f64 * 0.8) as u64,
        }
    }

    /// Check this snapshot against a plan's stop rules.
    ///
    /// Checks thermal, then battery (only when a reading exists), then
    /// memory; the first threshold crossed wins.
    #[must_use]
    pub fn should_stop_building(&self, stop_rules: &StopRules) -> Option<StopReason> {
        if self.thermal_state >= stop_rules.thermal_threshold {
            return Some(StopReason::Thermal(self.thermal_state));
        }

        if let Some(battery_level) = self.battery_level {
            if battery_level <= stop_rules.battery_threshold {
                return Some(StopReason::Battery(battery_level));
            }
        }

        if self.memory_pressure_estimate_mb >= stop_rules.memory_threshold_mb {
            return Some(StopReason::Memory(self.memory_pressure_estimate_mb));
        }

        None
    }
}

/// Why an in-flight build should abort early.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    Thermal(ThermalState),
    Battery(f64),
    Memory(u64),
    Timeout,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thermal(state) => write!(f, "thermal({state})"),
            Self::Battery(level) => write!(f, "battery({:.1}%)", level * 100.0),
            Self::Memory(mb) => write!(f, "memory({mb}MB)"),
            Self::Timeout => f.write_str("timeout"),
        }
    }
}
