//! Local build pipeline.
//!
//! ## Stage sequence
//!
//! ```text
//! STAGE 1: Planning        (fresh RuntimeGuards snapshot → BuildPlan)
//! STAGE 2: Frame extraction (FrameSource, per-frame cancel checkpoint)
//! STAGE 3: Artifact build   (ArtifactBuilder, budget-proportional work)
//! ```
//!
//! GUARANTEE: state transitions are emitted in stage order with exactly
//! one terminal state per run, and at most one run is active per
//! [`PipelineRunner`] instance — a new run cancels and supersedes the
//! previous one.

mod builder;
mod frame_source;
mod runner;
mod types;

pub use builder::{ArtifactBuilder, PhotoSpaceBuilder};
pub use frame_source::{FrameSource, SimulatedFrameSource};
pub use runner::PipelineRunner;
pub use types::{
    Bitmap, BuildArtifact, BuildRequest, BuildResult, BuildSource, Frame, PhotoSpaceArtifact,
    PipelineError, PipelineState, Timings, VideoHandle,
};
