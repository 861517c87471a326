//! PhotoSpace: On-Device 3D Reconstruction Pipeline
//!
//! Plans and executes the multi-stage job of turning a captured video
//! into a viewable 3D splat representation, adapting its resource budget
//! to the device and its live operating conditions.
//!
//! ## Architecture
//!
//! - **Planner**: deterministic budget derivation from device tier,
//!   runtime snapshot, and requested mode
//! - **Pipeline**: staged local execution with cooperative cancellation
//!   and single-flight supersede
//! - **Remote**: job delegation to a splat service (upload → submit →
//!   poll → download) under a hard deadline
//! - **Storage**: namespaced local persistence of artifacts and imports

pub mod config;
pub mod pipeline;
pub mod planner;
pub mod remote;
pub mod storage;
pub mod timeout;

// Re-export the planner surface
pub use planner::{
    make_plan, BuildMode, BuildPlan, CaptureStats, DeviceTier, HostProbe, RuntimeGuards,
    StopReason, StopRules, SystemProbe, ThermalState,
};

// Re-export the pipeline surface
pub use pipeline::{
    ArtifactBuilder, BuildArtifact, BuildRequest, BuildResult, BuildSource, Frame, FrameSource,
    PhotoSpaceArtifact, PhotoSpaceBuilder, PipelineError, PipelineRunner, PipelineState,
    SimulatedFrameSource, Timings, VideoHandle,
};

// Re-export the remote surface
pub use remote::{
    FailReason, GenerateResult, HttpRemoteJobClient, JobStatus, NotConfiguredRemoteJobClient,
    RemoteGenerator, RemoteJobClient, RemoteJobClientError,
};

// Re-export storage and timeout primitives
pub use config::RemoteConfig;
pub use storage::{ArtifactFormat, ArtifactRef, ArtifactStore};
pub use timeout::{with_timeout, TimeoutError};
