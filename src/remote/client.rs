//! Remote job client capability.
//!
//! The remote half of a build is four independently failable async
//! operations: upload the source, start a job, poll its status, download
//! the artifact. The orchestrator is generic over [`RemoteJobClient`] so
//! it can be exercised end to end — error mapping and deadline included —
//! without a live backend.

use async_trait::async_trait;

use crate::pipeline::VideoHandle;

/// Client-boundary error taxonomy.
///
/// Deterministically mapped into the public
/// [`FailReason`](super::FailReason) codes by the generate orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteJobClientError {
    #[error("remote splat service is not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("network timeout")]
    NetworkTimeout,
    #[error("invalid response from splat service")]
    InvalidResponse,
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("job failed: {0}")]
    JobFailed(String),
}

/// Status of a remote splat job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending { progress: Option<f64> },
    Processing { progress: Option<f64> },
    Completed,
    Failed { reason: String },
}

/// Capability interface for the remote splat service.
///
/// All operations are asynchronous and independently failable. Id
/// strings are opaque to the core; transport and encoding are the
/// implementation's concern.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Upload the source video, returning an asset id.
    async fn upload(&self, video: &VideoHandle) -> Result<String, RemoteJobClientError>;

    /// Start a reconstruction job for an uploaded asset, returning a
    /// job id.
    async fn start_job(&self, asset_id: &str) -> Result<String, RemoteJobClientError>;

    /// Fetch the current status of a job.
    async fn poll_status(&self, job_id: &str) -> Result<JobStatus, RemoteJobClientError>;

    /// Download the finished artifact bytes (`.splat` encoding).
    async fn download(&self, job_id: &str) -> Result<Vec<u8>, RemoteJobClientError>;
}

/// Client used when no splat service is configured.
///
/// Fails every call immediately, which lets the orchestrator and its
/// error mapping run deterministically in tests and in builds without
/// a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfiguredRemoteJobClient;

#[async_trait]
impl RemoteJobClient for NotConfiguredRemoteJobClient {
    async fn upload(&self, _video: &VideoHandle) -> Result<String, RemoteJobClientError> {
        Err(RemoteJobClientError::NotConfigured)
    }

    async fn start_job(&self, _asset_id: &str) -> Result<String, RemoteJobClientError> {
        Err(RemoteJobClientError::NotConfigured)
    }

    async fn poll_status(&self, _job_id: &str) -> Result<JobStatus, RemoteJobClientError> {
        Err(RemoteJobClientError::NotConfigured)
    }

    async fn download(&self, _job_id: &str) -> Result<Vec<u8>, RemoteJobClientError> {
        Err(RemoteJobClientError::NotConfigured)
    }
}
