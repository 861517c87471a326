//! Pipeline data model: requests, frames, states, results, errors.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::planner::{BuildMode, DeviceTier};
use crate::storage::ArtifactRef;

// ============================================================================
// Request
// ============================================================================

/// Handle to a captured video clip.
///
/// Carries the clip's location and duration; decoding is entirely the
/// frame source's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoHandle {
    /// Location of the clip on local disk.
    pub path: PathBuf,

    /// Clip duration in seconds.
    pub duration_seconds: f64,
}

impl VideoHandle {
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
        }
    }
}

/// Capture material backing a build request.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildSource {
    /// A captured video clip. Photo sets are a planned addition.
    Video(VideoHandle),
}

impl BuildSource {
    /// The video handle, if this source is a video.
    #[must_use]
    pub fn video_handle(&self) -> Option<&VideoHandle> {
        match self {
            Self::Video(handle) => Some(handle),
        }
    }
}

/// One build request, constructed by the caller and passed once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// Capture material to reconstruct from.
    pub source: BuildSource,

    /// Requested quality mode.
    pub requested_mode: BuildMode,

    /// Capability tier, classified once and threaded through explicitly.
    pub device_tier: DeviceTier,
}

// ============================================================================
// Frames & Artifacts
// ============================================================================

/// Opaque decoded bitmap. The pipeline never looks inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One decoded frame with its position in the clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Extraction order, starting at 0.
    pub index: u32,

    /// Timestamp of the frame within the clip, seconds.
    pub timestamp_seconds: f64,

    /// Decoded image.
    pub image: Bitmap,
}

/// Artifact produced by the local build stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSpaceArtifact {
    /// Frames retained by the builder (at most the plan's frame budget).
    pub frames: Vec<Frame>,

    /// When the artifact was produced.
    pub generated_at: DateTime<Utc>,
}

/// Artifact handle inside a [`BuildResult`] — either the in-memory
/// photo-space output of the local path or a stored splat from the
/// remote path.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildArtifact {
    PhotoSpace(PhotoSpaceArtifact),
    Splat(ArtifactRef),
}

// ============================================================================
// Progress & Results
// ============================================================================

/// Orchestrator progress, observed via the run's state callback.
///
/// Transitions are monotonic per run; `Finished` or `Failed` is emitted
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Planning,
    ExtractingFrames { progress: f64 },
    BuildingArtifact { progress: f64 },
    Finished,
    Failed { message: String },
}

impl PipelineState {
    /// Whether this state ends a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. })
    }
}

/// Per-stage and total wall-clock timings for one run, milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timings {
    pub plan_ms: u64,
    pub extract_ms: u64,
    pub build_ms: u64,
    pub total_ms: u64,
}

/// Terminal success value of one local-path run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    /// Human-readable summary of the plan the run executed under.
    pub plan_summary: String,

    /// The produced artifact.
    pub artifact: BuildArtifact,

    /// Stage timings.
    pub timings: Timings,
}

// ============================================================================
// Errors
// ============================================================================

/// Closed error taxonomy of the local pipeline path.
///
/// Collaborator errors are classified into this set at each stage
/// boundary; cancellation is an ordinary member, not a separate channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input")]
    InvalidInput,
    #[error("frame extraction failed")]
    ExtractFramesFailed,
    #[error("plugin failed")]
    PluginFailed,
    #[error("cancelled")]
    Cancelled,
    #[error("internal inconsistency")]
    InternalInconsistency,
}
