//! Artifact builder abstraction for the build stage.
//!
//! The reconstruction algorithm proper is outside the core. The pipeline
//! consumes it through [`ArtifactBuilder`]: given a plan and frames,
//! produce an artifact, possibly slowly. [`PhotoSpaceBuilder`] is the
//! bundled stand-in: it enforces the frame budget and simulates
//! proportional work against the plan's time budget.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::types::{Frame, PhotoSpaceArtifact, PipelineError};
use crate::planner::BuildPlan;

/// Trait abstracting the reconstruction stage.
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Build an artifact from `frames` under `plan`'s budget.
    ///
    /// Implementations truncate the input to `plan.frame_budget` and fail
    /// with a cancelled error if `cancel` is already signalled at entry.
    async fn build(
        &self,
        plan: &BuildPlan,
        frames: Vec<Frame>,
        cancel: &CancellationToken,
    ) -> Result<PhotoSpaceArtifact>;
}

/// Simulated photo-space builder.
///
/// Work is simulated for `clamp(time_budget_ms / 20, 100, 300)` ms so a
/// bigger budget reads as proportionally more work without making tests
/// slow.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoSpaceBuilder;

impl PhotoSpaceBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactBuilder for PhotoSpaceBuilder {
    async fn build(
        &self,
        plan: &BuildPlan,
        mut frames: Vec<Frame>,
        cancel: &CancellationToken,
    ) -> Result<PhotoSpaceArtifact> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled.into());
        }

        frames.truncate(plan.frame_budget as usize);

        let simulated_work_ms = (plan.time_budget_ms / 20).clamp(100, 300);
        tokio::time::sleep(std::time::Duration::from_millis(simulated_work_ms)).await;

        Ok(PhotoSpaceArtifact {
            frames,
            generated_at: Utc::now(),
        })
    }
}
