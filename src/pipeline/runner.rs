//! Pipeline runner — drives one build request through its stages.
//!
//! State machine per run:
//!
//! ```text
//! idle → planning → extracting_frames → building_artifact → finished
//!                                  └──────── failed(message) ────────┘
//! ```
//!
//! Transitions are emitted through a caller-supplied observer in strict
//! stage order; a terminal state is emitted exactly once per run.
//! Each call to [`run`](PipelineRunner::run) cancels any run already in
//! flight on the same instance (single-flight, last-writer-wins) — the
//! superseded run's observer goes silent and its awaiting caller gets
//! `Cancelled`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::ArtifactBuilder;
use super::frame_source::FrameSource;
use super::types::{
    BuildArtifact, BuildRequest, BuildResult, PipelineError, PipelineState, Timings,
};
use crate::planner::{make_plan, BuildPlan, CaptureStats, RuntimeGuards, SystemProbe};

/// Orchestrates build runs against injected collaborators.
///
/// One instance may serve many sequential requests; at most one run is
/// ever active per instance.
pub struct PipelineRunner {
    frame_source: Arc<dyn FrameSource>,
    builder: Arc<dyn ArtifactBuilder>,
    probe: Arc<dyn SystemProbe>,

    /// Most recent plan, published atomically for external readers.
    /// Survives run completion for diagnostics.
    last_plan: ArcSwapOption<BuildPlan>,

    /// Cancellation token of the active run. Swapped (and the old one
    /// cancelled) whenever a new run starts.
    active: Mutex<CancellationToken>,

    /// Run counter; emissions from runs that are no longer current are
    /// suppressed.
    generation: AtomicU64,
}

impl PipelineRunner {
    pub fn new(
        frame_source: Arc<dyn FrameSource>,
        builder: Arc<dyn ArtifactBuilder>,
        probe: Arc<dyn SystemProbe>,
    ) -> Self {
        Self {
            frame_source,
            builder,
            probe,
            last_plan: ArcSwapOption::empty(),
            active: Mutex::new(CancellationToken::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Runner wired to the bundled simulation collaborators and the host
    /// system probe.
    #[must_use]
    pub fn simulated() -> Self {
        Self::new(
            Arc::new(super::frame_source::SimulatedFrameSource::new()),
            Arc::new(super::builder::PhotoSpaceBuilder::new()),
            Arc::new(crate::planner::HostProbe),
        )
    }

    /// The plan most recently computed by any run on this instance.
    #[must_use]
    pub fn last_plan(&self) -> Option<Arc<BuildPlan>> {
        self.last_plan.load_full()
    }

    /// Cooperatively cancel the active run.
    ///
    /// Returns immediately; the run observes the signal at its next
    /// checkpoint and unwinds with [`PipelineError::Cancelled`].
    pub fn cancel(&self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Execute one build request, reporting progress through `on_state`.
    ///
    /// Cancels and supersedes any run currently in flight on this
    /// instance, then becomes the active run.
    pub async fn run<F>(
        &self,
        request: BuildRequest,
        on_state: F,
    ) -> Result<BuildResult, PipelineError>
    where
        F: Fn(PipelineState) + Send + Sync,
    {
        let started = Instant::now();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let cancel = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            // Supersede: the previous run unwinds at its next checkpoint.
            active.cancel();
            let fresh = CancellationToken::new();
            *active = fresh.clone();
            fresh
        };

        // Emissions from a superseded run are discarded, not reported.
        let emit = |state: PipelineState| {
            if self.generation.load(Ordering::SeqCst) == generation {
                on_state(state);
            }
        };

        match self.run_stages(&request, &cancel, &emit, started).await {
            Ok(result) => {
                emit(PipelineState::Finished);
                Ok(result)
            }
            Err(error) => {
                warn!(%error, "pipeline run failed");
                emit(PipelineState::Failed {
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
        emit: &(impl Fn(PipelineState) + Send + Sync),
        started: Instant,
    ) -> Result<BuildResult, PipelineError> {
        // Stage 1: planning.
        emit(PipelineState::Planning);
        let plan_start = Instant::now();
        let guards = RuntimeGuards::snapshot(self.probe.as_ref());
        let plan = make_plan(
            request.device_tier,
            CaptureStats::placeholder(),
            &guards,
            request.requested_mode,
        );
        self.last_plan.store(Some(Arc::new(plan.clone())));
        let plan_ms = elapsed_ms(plan_start);
        info!("PLAN: {}", plan.summary());

        // Stage 2: frame extraction.
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        emit(PipelineState::ExtractingFrames { progress: 0.0 });
        let video = request
            .source
            .video_handle()
            .ok_or(PipelineError::InvalidInput)?;
        let extract_start = Instant::now();
        let frames = self
            .frame_source
            .extract(video, plan.frame_budget, cancel)
            .await
            .map_err(classify)?;
        let extract_ms = elapsed_ms(extract_start);
        debug!(
            source = self.frame_source.source_name(),
            frames = frames.len(),
            ms = extract_ms,
            "frames extracted"
        );

        // Stage 3: artifact build.
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        emit(PipelineState::BuildingArtifact { progress: 0.0 });
        let build_start = Instant::now();
        let artifact = self
            .builder
            .build(&plan, frames, cancel)
            .await
            .map_err(classify)?;
        let build_ms = elapsed_ms(build_start);
        debug!(frames_used = artifact.frames.len(), ms = build_ms, "artifact built");

        let total_ms = elapsed_ms(started);
        info!(plan_ms, extract_ms, build_ms, total_ms, "pipeline run complete");

        Ok(BuildResult {
            plan_summary: plan.summary(),
            artifact: BuildArtifact::PhotoSpace(artifact),
            timings: Timings {
                plan_ms,
                extract_ms,
                build_ms,
                total_ms,
            },
        })
    }
}

/// Classify a collaborator error at the stage boundary. Defined pipeline
/// errors pass through unchanged; anything else is an internal
/// inconsistency.
fn classify(error: anyhow::Error) -> PipelineError {
    match error.downcast::<PipelineError>() {
        Ok(pipeline_error) => pipeline_error,
        Err(other) => {
            warn!(error = %other, "unclassified collaborator error");
            PipelineError::InternalInconsistency
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
