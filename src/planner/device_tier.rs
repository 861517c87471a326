//! Device capability tier classification.
//!
//! Buckets devices by capability, not by model name. The tier is computed
//! once per process from physical memory and threaded through
//! [`BuildRequest`](crate::pipeline::BuildRequest) — there is no hidden
//! process-wide "current tier" state.

use serde::{Deserialize, Serialize};

use super::SystemProbe;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Coarse device capability bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTier {
    Low,
    Medium,
    High,
}

impl DeviceTier {
    /// Classify a device from its physical memory.
    ///
    /// Thresholds: `< 4 GB` → Low, `4–8 GB` inclusive → Medium,
    /// `> 8 GB` → High.
    #[must_use]
    pub fn from_memory_bytes(physical_memory_bytes: u64) -> Self {
        let memory_gb = physical_memory_bytes as f64 / BYTES_PER_GB;
        if memory_gb < 4.0 {
            Self::Low
        } else if memory_gb <= 8.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Classify the device a probe reports on.
    #[must_use]
    pub fn detect(probe: &dyn SystemProbe) -> Self {
        Self::from_memory_bytes(probe.physical_memory_bytes())
    }

    /// Single-letter label used in plan summaries.
    #[must_use]
    pub const fn letter(self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::Medium => "M",
            Self::High => "H",
        }
    }
}

impl std::fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.letter())
    }
}
