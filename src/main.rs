//! PhotoSpace demo CLI
//!
//! Exercises the reconstruction pipeline end to end with the bundled
//! simulation collaborators, or delegates to a remote splat service.
//!
//! # Usage
//!
//! ```bash
//! # Local simulated run, fast enter-mode pass
//! cargo run --release
//!
//! # Publish-quality pass over a real clip (duration still supplied —
//! # the simulated decoder has no real probe)
//! cargo run --release -- --video capture.mov --duration 42 --mode publish
//!
//! # Remote generation against a configured splat service
//! cargo run --release -- --remote --base-url https://splat.example.com
//! ```
//!
//! # Environment Variables
//!
//! - `PHOTOSPACE_CONFIG`: Path to a TOML config file for the remote path
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use photospace::{
    ArtifactStore, BuildArtifact, BuildMode, BuildRequest, BuildSource, DeviceTier, HostProbe,
    HttpRemoteJobClient, NotConfiguredRemoteJobClient, PipelineRunner, RemoteConfig,
    RemoteGenerator, RemoteJobClient, SystemProbe, VideoHandle,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Enter,
    Publish,
    FailSoft,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Enter => Self::Enter,
            ModeArg::Publish => Self::Publish,
            ModeArg::FailSoft => Self::FailSoft,
        }
    }
}

#[derive(Parser)]
#[command(name = "photospace", about = "3D photo-space reconstruction demo")]
struct CliArgs {
    /// Path to the source video. A synthetic clip handle is used when
    /// omitted.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Clip duration in seconds (the simulated decoder has no probe)
    #[arg(long, default_value = "12.0")]
    duration: f64,

    /// Quality mode for the run
    #[arg(long, value_enum, default_value = "enter")]
    mode: ModeArg,

    /// Delegate the build to the remote splat service
    #[arg(long)]
    remote: bool,

    /// Override the remote service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Explicit config file (otherwise PHOTOSPACE_CONFIG / photospace.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Copy the source video into the local namespace before running
    #[arg(long)]
    import: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => RemoteConfig::load_from(path)?,
        None => RemoteConfig::load(),
    };
    if let Some(base_url) = args.base_url.clone() {
        config.base_url = Some(base_url);
    }

    let probe = HostProbe;
    let device_tier = DeviceTier::detect(&probe);
    info!(
        tier = %device_tier,
        memory_gb = probe.physical_memory_bytes() / (1024 * 1024 * 1024),
        "device classified"
    );

    let store = ArtifactStore::new(config.artifact_dir.clone());
    let mut video_path = args
        .video
        .clone()
        .unwrap_or_else(|| PathBuf::from("demo-clip.mov"));
    if args.import {
        video_path = store.import_video(&video_path)?;
    }

    let request = BuildRequest {
        source: BuildSource::Video(VideoHandle::new(video_path, args.duration)),
        requested_mode: args.mode.into(),
        device_tier,
    };

    if args.remote {
        run_remote(&config, &request).await
    } else {
        run_local(request).await
    }
}

async fn run_local(request: BuildRequest) -> Result<()> {
    let runner = PipelineRunner::simulated();

    let result = runner
        .run(request, |state| info!(state = ?state, "pipeline"))
        .await;

    match result {
        Ok(build) => {
            info!("plan: {}", build.plan_summary);
            if let BuildArtifact::PhotoSpace(artifact) = &build.artifact {
                info!(
                    frames = artifact.frames.len(),
                    generated_at = %artifact.generated_at,
                    "artifact ready"
                );
            }
            info!(
                plan_ms = build.timings.plan_ms,
                extract_ms = build.timings.extract_ms,
                build_ms = build.timings.build_ms,
                total_ms = build.timings.total_ms,
                "timings"
            );
            Ok(())
        }
        Err(error) => {
            warn!(%error, "pipeline failed");
            Err(error.into())
        }
    }
}

async fn run_remote(config: &RemoteConfig, request: &BuildRequest) -> Result<()> {
    let client: Arc<dyn RemoteJobClient> = match HttpRemoteJobClient::from_config(config) {
        Some(client) => Arc::new(client),
        None => {
            warn!("no base_url configured — remote calls will fail fast");
            Arc::new(NotConfiguredRemoteJobClient)
        }
    };

    let generator = RemoteGenerator::from_config(client, config);
    match generator.run_generate(request).await {
        photospace::GenerateResult::Success {
            artifact,
            elapsed_ms,
        } => {
            info!(
                path = %artifact.local_path.display(),
                elapsed_ms,
                "remote artifact ready"
            );
            Ok(())
        }
        photospace::GenerateResult::Fail { reason, elapsed_ms } => {
            warn!(reason = %reason, elapsed_ms, "remote generation failed");
            anyhow::bail!("remote generation failed: {reason}")
        }
    }
}
