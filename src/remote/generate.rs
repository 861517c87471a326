//! Remote generate orchestration.
//!
//! Drives the whole remote job lifecycle — upload → start job → poll →
//! download → persist — under a single hard deadline, and maps every
//! failure onto the closed, string-coded [`FailReason`] set. The codes
//! are a boundary contract consumed by telemetry; they never change.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{JobStatus, RemoteJobClient, RemoteJobClientError};
use crate::config::RemoteConfig;
use crate::pipeline::{BuildArtifact, BuildRequest, BuildResult, PipelineError, Timings, VideoHandle};
use crate::storage::{ArtifactFormat, ArtifactRef, ArtifactStore};
use crate::timeout::with_timeout;

// ============================================================================
// Public result model
// ============================================================================

/// Stable failure codes of the generate path.
///
/// The serialized form (`snake_case`) is the public contract; consumers
/// and telemetry key on these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    Timeout,
    NetworkTimeout,
    UploadFailed,
    ApiError,
    JobTimeout,
    DownloadFailed,
    InvalidResponse,
    ApiNotConfigured,
    InputInvalid,
    OutOfMemory,
    UnknownError,
}

impl FailReason {
    /// The stable string code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NetworkTimeout => "network_timeout",
            Self::UploadFailed => "upload_failed",
            Self::ApiError => "api_error",
            Self::JobTimeout => "job_timeout",
            Self::DownloadFailed => "download_failed",
            Self::InvalidResponse => "invalid_response",
            Self::ApiNotConfigured => "api_not_configured",
            Self::InputInvalid => "input_invalid",
            Self::OutOfMemory => "out_of_memory",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Terminal result of one generate run. Elapsed time covers request
/// acceptance to terminal outcome on both paths.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateResult {
    Success {
        artifact: ArtifactRef,
        elapsed_ms: u64,
    },
    Fail {
        reason: FailReason,
        elapsed_ms: u64,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs build requests against the remote splat service.
pub struct RemoteGenerator {
    client: Arc<dyn RemoteJobClient>,
    store: ArtifactStore,
    poll_interval: std::time::Duration,
    deadline: std::time::Duration,
}

impl RemoteGenerator {
    /// Generator with the default 2 s poll interval and 180 s deadline.
    pub fn new(client: Arc<dyn RemoteJobClient>, store: ArtifactStore) -> Self {
        Self {
            client,
            store,
            poll_interval: std::time::Duration::from_secs(2),
            deadline: std::time::Duration::from_secs(180),
        }
    }

    /// Generator configured from [`RemoteConfig`] (client selection is
    /// the caller's concern — pass the not-configured client when
    /// `base_url` is absent).
    pub fn from_config(client: Arc<dyn RemoteJobClient>, config: &RemoteConfig) -> Self {
        Self {
            client,
            store: ArtifactStore::new(config.artifact_dir.clone()),
            poll_interval: config.poll_interval(),
            deadline: config.deadline(),
        }
    }

    /// Override the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the end-to-end deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: std::time::Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Execute the remote path end to end under the deadline.
    pub async fn run_generate(&self, request: &BuildRequest) -> GenerateResult {
        let started = Instant::now();

        let Some(video) = request.source.video_handle() else {
            return GenerateResult::Fail {
                reason: FailReason::InputInvalid,
                elapsed_ms: elapsed_ms(started),
            };
        };

        let cancel = CancellationToken::new();
        let outcome = with_timeout(self.deadline, &cancel, self.generate_inner(video, &cancel)).await;
        let elapsed = elapsed_ms(started);

        match outcome {
            Ok(Ok(artifact)) => {
                info!(path = %artifact.local_path.display(), elapsed_ms = elapsed, "remote generate succeeded");
                GenerateResult::Success {
                    artifact,
                    elapsed_ms: elapsed,
                }
            }
            Ok(Err(reason)) => {
                warn!(reason = %reason, elapsed_ms = elapsed, "remote generate failed");
                GenerateResult::Fail {
                    reason,
                    elapsed_ms: elapsed,
                }
            }
            Err(_) => {
                warn!(elapsed_ms = elapsed, "remote generate hit the deadline");
                GenerateResult::Fail {
                    reason: FailReason::Timeout,
                    elapsed_ms: elapsed,
                }
            }
        }
    }

    async fn generate_inner(
        &self,
        video: &VideoHandle,
        cancel: &CancellationToken,
    ) -> Result<ArtifactRef, FailReason> {
        let asset_id = self
            .client
            .upload(video)
            .await
            .map_err(map_client_error)?;
        debug!(asset_id = %asset_id, "upload complete");

        let job_id = self
            .client
            .start_job(&asset_id)
            .await
            .map_err(map_client_error)?;
        info!(job_id = %job_id, "splat job started");

        loop {
            if cancel.is_cancelled() {
                return Err(FailReason::Timeout);
            }

            match self
                .client
                .poll_status(&job_id)
                .await
                .map_err(map_client_error)?
            {
                JobStatus::Pending { progress } | JobStatus::Processing { progress } => {
                    debug!(job_id = %job_id, ?progress, "job in flight");
                    tokio::time::sleep(self.poll_interval).await;
                }
                JobStatus::Completed => break,
                JobStatus::Failed { reason } => {
                    warn!(job_id = %job_id, reason = %reason, "job failed remotely");
                    return Err(map_client_error(RemoteJobClientError::JobFailed(reason)));
                }
            }
        }

        let bytes = self
            .client
            .download(&job_id)
            .await
            .map_err(map_client_error)?;

        let local_path = self
            .store
            .write_artifact(&job_id, ArtifactFormat::Splat, &bytes)
            .map_err(|error| {
                warn!(%error, "artifact persistence failed");
                // A local write failure after a clean download has no
                // dedicated code in the taxonomy.
                FailReason::UnknownError
            })?;

        Ok(ArtifactRef {
            local_path,
            format: ArtifactFormat::Splat,
        })
    }

    /// Compatibility shim: expose the remote path through the local-path
    /// result shape.
    ///
    /// Per-stage timings are zeroed (the remote service does not report
    /// them) and the plan summary is fixed. Failure codes collapse onto
    /// the narrower [`PipelineError`] taxonomy.
    pub async fn run_as_build(&self, request: &BuildRequest) -> Result<BuildResult, PipelineError> {
        match self.run_generate(request).await {
            GenerateResult::Success {
                artifact,
                elapsed_ms,
            } => Ok(BuildResult {
                plan_summary: "[Remote] splat service generation".to_string(),
                artifact: BuildArtifact::Splat(artifact),
                timings: Timings {
                    plan_ms: 0,
                    extract_ms: 0,
                    build_ms: 0,
                    total_ms: elapsed_ms,
                },
            }),
            GenerateResult::Fail { reason, .. } => Err(match reason {
                FailReason::Timeout => PipelineError::Cancelled,
                FailReason::InputInvalid => PipelineError::InvalidInput,
                _ => PipelineError::PluginFailed,
            }),
        }
    }
}

/// Deterministic client-error → public-code mapping.
fn map_client_error(error: RemoteJobClientError) -> FailReason {
    match error {
        RemoteJobClientError::NotConfigured => FailReason::ApiNotConfigured,
        RemoteJobClientError::NetworkTimeout => FailReason::NetworkTimeout,
        RemoteJobClientError::UploadFailed(_) => FailReason::UploadFailed,
        RemoteJobClientError::DownloadFailed(_) => FailReason::DownloadFailed,
        RemoteJobClientError::Network(_)
        | RemoteJobClientError::InvalidResponse
        | RemoteJobClientError::JobFailed(_) => FailReason::ApiError,
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BuildSource;
    use crate::planner::{BuildMode, DeviceTier};
    use crate::remote::client::NotConfiguredRemoteJobClient;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    struct ScriptedClient {
        statuses: Mutex<VecDeque<JobStatus>>,
        poll_calls: AtomicUsize,
        download_calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(statuses: Vec<JobStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                poll_calls: AtomicUsize::new(0),
                download_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteJobClient for ScriptedClient {
        async fn upload(&self, _video: &VideoHandle) -> Result<String, RemoteJobClientError> {
            Ok("asset-1".to_string())
        }

        async fn start_job(&self, _asset_id: &str) -> Result<String, RemoteJobClientError> {
            Ok("job-1".to_string())
        }

        async fn poll_status(&self, _job_id: &str) -> Result<JobStatus, RemoteJobClientError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .statuses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            // Once the script runs out, stay pending forever.
            Ok(next.unwrap_or(JobStatus::Pending { progress: None }))
        }

        async fn download(&self, _job_id: &str) -> Result<Vec<u8>, RemoteJobClientError> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"splat-bytes".to_vec())
        }
    }

    fn request() -> BuildRequest {
        BuildRequest {
            source: BuildSource::Video(VideoHandle::new("/tmp/clip.mov", 10.0)),
            requested_mode: BuildMode::Publish,
            device_tier: DeviceTier::Medium,
        }
    }

    fn store(tmp: &tempfile::TempDir) -> ArtifactStore {
        ArtifactStore::new(tmp.path().join("photospace"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_sleeps_twice_then_downloads_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(ScriptedClient::new(vec![
            JobStatus::Pending { progress: Some(0.0) },
            JobStatus::Processing { progress: Some(0.6) },
            JobStatus::Completed,
        ]));
        let generator = RemoteGenerator::new(client.clone(), store(&tmp));

        let virtual_start = tokio::time::Instant::now();
        let result = generator.run_generate(&request()).await;

        // pending → sleep, processing → sleep, completed → download:
        // exactly two 2 s interval sleeps on the virtual clock.
        assert_eq!(virtual_start.elapsed(), std::time::Duration::from_secs(4));
        assert_eq!(client.poll_calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.download_calls.load(Ordering::SeqCst), 1);

        match result {
            GenerateResult::Success { artifact, .. } => {
                assert_eq!(artifact.format, ArtifactFormat::Splat);
                assert!(artifact.local_path.ends_with("artifacts/job-1.splat"));
            }
            GenerateResult::Fail { reason, .. } => panic!("unexpected failure: {reason}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_configured_fails_fast() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let generator =
            RemoteGenerator::new(Arc::new(NotConfiguredRemoteJobClient), store(&tmp));

        let virtual_start = tokio::time::Instant::now();
        let result = generator.run_generate(&request()).await;

        // No polling, no deadline wait — the first call fails.
        assert_eq!(virtual_start.elapsed(), std::time::Duration::ZERO);
        match result {
            GenerateResult::Fail { reason, elapsed_ms } => {
                assert_eq!(reason, FailReason::ApiNotConfigured);
                assert_eq!(reason.code(), "api_not_configured");
                assert!(elapsed_ms < 180_000);
            }
            GenerateResult::Success { .. } => panic!("must fail without a backend"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_job_failure_aborts_without_download() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(ScriptedClient::new(vec![
            JobStatus::Processing { progress: None },
            JobStatus::Failed {
                reason: "gpu oom".to_string(),
            },
        ]));
        let generator = RemoteGenerator::new(client.clone(), store(&tmp));

        let result = generator.run_generate(&request()).await;
        assert!(matches!(
            result,
            GenerateResult::Fail {
                reason: FailReason::ApiError,
                ..
            }
        ));
        assert_eq!(client.download_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_endless_pending_hits_the_deadline() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(ScriptedClient::new(vec![]));
        let generator = RemoteGenerator::new(client, store(&tmp))
            .with_deadline(std::time::Duration::from_secs(10));

        let virtual_start = tokio::time::Instant::now();
        let result = generator.run_generate(&request()).await;

        assert_eq!(virtual_start.elapsed(), std::time::Duration::from_secs(10));
        assert!(matches!(
            result,
            GenerateResult::Fail {
                reason: FailReason::Timeout,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_failure_maps_to_upload_failed() {
        struct FailingUpload;

        #[async_trait]
        impl RemoteJobClient for FailingUpload {
            async fn upload(&self, _v: &VideoHandle) -> Result<String, RemoteJobClientError> {
                Err(RemoteJobClientError::UploadFailed("disk error".to_string()))
            }
            async fn start_job(&self, _a: &str) -> Result<String, RemoteJobClientError> {
                unreachable!("upload already failed")
            }
            async fn poll_status(&self, _j: &str) -> Result<JobStatus, RemoteJobClientError> {
                unreachable!("upload already failed")
            }
            async fn download(&self, _j: &str) -> Result<Vec<u8>, RemoteJobClientError> {
                unreachable!("upload already failed")
            }
        }

        let tmp = tempfile::tempdir().expect("tempdir");
        let generator = RemoteGenerator::new(Arc::new(FailingUpload), store(&tmp));
        let result = generator.run_generate(&request()).await;
        assert!(matches!(
            result,
            GenerateResult::Fail {
                reason: FailReason::UploadFailed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shim_maps_success_onto_build_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(ScriptedClient::new(vec![JobStatus::Completed]));
        let generator = RemoteGenerator::new(client, store(&tmp));

        let result = generator.run_as_build(&request()).await.expect("build result");
        assert!(matches!(result.artifact, BuildArtifact::Splat(_)));
        assert_eq!(result.timings.plan_ms, 0);
        assert_eq!(result.timings.extract_ms, 0);
        assert_eq!(result.timings.build_ms, 0);
        assert_eq!(result.plan_summary, "[Remote] splat service generation");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shim_narrows_fail_reasons() {
        let tmp = tempfile::tempdir().expect("tempdir");

        // Deadline expiry → Cancelled.
        let endless = RemoteGenerator::new(Arc::new(ScriptedClient::new(vec![])), store(&tmp))
            .with_deadline(std::time::Duration::from_secs(4));
        assert_eq!(
            endless.run_as_build(&request()).await,
            Err(PipelineError::Cancelled)
        );

        // Everything else → PluginFailed.
        let unconfigured =
            RemoteGenerator::new(Arc::new(NotConfiguredRemoteJobClient), store(&tmp));
        assert_eq!(
            unconfigured.run_as_build(&request()).await,
            Err(PipelineError::PluginFailed)
        );
    }

    #[test]
    fn test_fail_reason_codes_are_stable() {
        let expectations = [
            (FailReason::Timeout, "timeout"),
            (FailReason::NetworkTimeout, "network_timeout"),
            (FailReason::UploadFailed, "upload_failed"),
            (FailReason::ApiError, "api_error"),
            (FailReason::JobTimeout, "job_timeout"),
            (FailReason::DownloadFailed, "download_failed"),
            (FailReason::InvalidResponse, "invalid_response"),
            (FailReason::ApiNotConfigured, "api_not_configured"),
            (FailReason::InputInvalid, "input_invalid"),
            (FailReason::OutOfMemory, "out_of_memory"),
            (FailReason::UnknownError, "unknown_error"),
        ];
        for (reason, code) in expectations {
            assert_eq!(reason.code(), code);
            assert_eq!(
                serde_json::to_value(reason).expect("serialize"),
                serde_json::Value::String(code.to_string())
            );
        }
    }

    #[test]
    fn test_client_error_mapping_is_deterministic() {
        assert_eq!(
            map_client_error(RemoteJobClientError::NotConfigured),
            FailReason::ApiNotConfigured
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::NetworkTimeout),
            FailReason::NetworkTimeout
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::UploadFailed(String::new())),
            FailReason::UploadFailed
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::DownloadFailed(String::new())),
            FailReason::DownloadFailed
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::Network(String::new())),
            FailReason::ApiError
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::InvalidResponse),
            FailReason::ApiError
        );
        assert_eq!(
            map_client_error(RemoteJobClientError::JobFailed(String::new())),
            FailReason::ApiError
        );
    }
}
