//! Adaptive budget planning.
//!
//! Converts static device capability, content statistics, a one-shot
//! runtime snapshot, and the requested quality mode into a concrete
//! [`BuildPlan`]:
//!
//! ```text
//! DeviceTier ──┐
//! CaptureStats ─┤
//! RuntimeGuards ┼──▶ make_plan ──▶ BuildPlan (+ StopRules)
//! BuildMode ───┘
//! ```
//!
//! Planning is pure: all live signals are read once into
//! [`RuntimeGuards`] before the call, and the resulting plan is immutable
//! for the lifetime of its run.

mod budget;
mod build_plan;
mod device_tier;
mod runtime_guards;
mod stop_rules;

pub use budget::make_plan;
pub use build_plan::{BuildMode, BuildPlan, CaptureStats};
pub use device_tier::DeviceTier;
pub use runtime_guards::{HostProbe, RuntimeGuards, StopReason, SystemProbe, ThermalState};
pub use stop_rules::StopRules;
