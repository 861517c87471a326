//! HTTP client for the remote splat service.
//!
//! Wire shape: upload raw video bytes, receive opaque asset/job ids,
//! poll a status document, download raw `.splat` bytes. Per-request
//! timeouts here are the client's own; the end-to-end deadline is
//! enforced by the generate orchestrator.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::{JobStatus, RemoteJobClient, RemoteJobClientError};
use crate::config::RemoteConfig;
use crate::pipeline::VideoHandle;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    asset_id: String,
}

#[derive(Debug, Deserialize)]
struct StartJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    progress: Option<f64>,
    reason: Option<String>,
}

/// Production client for the splat service.
#[derive(Clone)]
pub struct HttpRemoteJobClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteJobClient {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create a client from config, or `None` when no base URL is set.
    #[must_use]
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        config
            .base_url
            .as_deref()
            .map(|base_url| Self::new(base_url, &config.api_key))
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

#[async_trait]
impl RemoteJobClient for HttpRemoteJobClient {
    async fn upload(&self, video: &VideoHandle) -> Result<String, RemoteJobClientError> {
        let bytes = tokio::fs::read(&video.path)
            .await
            .map_err(|e| RemoteJobClientError::UploadFailed(e.to_string()))?;

        let resp = self
            .http
            .post(format!("{}/api/splat/assets", self.base_url))
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(RemoteJobClientError::UploadFailed(format!(
                "server returned {}",
                resp.status()
            )));
        }

        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|_| RemoteJobClientError::InvalidResponse)?;
        debug!(asset_id = %body.asset_id, "video uploaded");
        Ok(body.asset_id)
    }

    async fn start_job(&self, asset_id: &str) -> Result<String, RemoteJobClientError> {
        let resp = self
            .http
            .post(format!("{}/api/splat/jobs", self.base_url))
            .header("Authorization", self.bearer())
            .json(&serde_json::json!({ "asset_id": asset_id }))
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(RemoteJobClientError::Network(format!(
                "start job returned {}",
                resp.status()
            )));
        }

        let body: StartJobResponse = resp
            .json()
            .await
            .map_err(|_| RemoteJobClientError::InvalidResponse)?;
        debug!(job_id = %body.job_id, "job started");
        Ok(body.job_id)
    }

    async fn poll_status(&self, job_id: &str) -> Result<JobStatus, RemoteJobClientError> {
        let resp = self
            .http
            .get(format!("{}/api/splat/jobs/{job_id}", self.base_url))
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(RemoteJobClientError::Network(format!(
                "poll returned {}",
                resp.status()
            )));
        }

        let body: JobStatusResponse = resp
            .json()
            .await
            .map_err(|_| RemoteJobClientError::InvalidResponse)?;
        parse_status(&body)
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>, RemoteJobClientError> {
        let resp = self
            .http
            .get(format!("{}/api/splat/jobs/{job_id}/artifact", self.base_url))
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(RemoteJobClientError::DownloadFailed(format!(
                "server returned {}",
                resp.status()
            )));
        }

        let bytes = resp.bytes().await.map_err(map_transport_error)?;
        debug!(job_id, bytes = bytes.len(), "artifact downloaded");
        Ok(bytes.to_vec())
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteJobClientError {
    if error.is_timeout() {
        RemoteJobClientError::NetworkTimeout
    } else {
        RemoteJobClientError::Network(error.to_string())
    }
}

fn parse_status(body: &JobStatusResponse) -> Result<JobStatus, RemoteJobClientError> {
    match body.status.as_str() {
        "pending" => Ok(JobStatus::Pending {
            progress: body.progress,
        }),
        "processing" => Ok(JobStatus::Processing {
            progress: body.progress,
        }),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed {
            reason: body
                .reason
                .clone()
                .unwrap_or_else(|| "unspecified".to_string()),
        }),
        _ => Err(RemoteJobClientError::InvalidResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_body(status: &str, progress: Option<f64>, reason: Option<&str>) -> JobStatusResponse {
        JobStatusResponse {
            status: status.to_string(),
            progress,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            parse_status(&status_body("pending", Some(0.1), None)),
            Ok(JobStatus::Pending {
                progress: Some(0.1)
            })
        );
        assert_eq!(
            parse_status(&status_body("processing", None, None)),
            Ok(JobStatus::Processing { progress: None })
        );
        assert_eq!(
            parse_status(&status_body("completed", None, None)),
            Ok(JobStatus::Completed)
        );
        assert_eq!(
            parse_status(&status_body("failed", None, Some("gpu oom"))),
            Ok(JobStatus::Failed {
                reason: "gpu oom".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_status_is_invalid_response() {
        assert_eq!(
            parse_status(&status_body("exploded", None, None)),
            Err(RemoteJobClientError::InvalidResponse)
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpRemoteJobClient::new("https://splat.example.com/", "key");
        assert_eq!(client.base_url, "https://splat.example.com");
    }

    #[test]
    fn test_from_config_requires_base_url() {
        assert!(HttpRemoteJobClient::from_config(&RemoteConfig::default()).is_none());

        let config = RemoteConfig {
            base_url: Some("https://splat.example.com".to_string()),
            ..RemoteConfig::default()
        };
        assert!(HttpRemoteJobClient::from_config(&config).is_some());
    }
}
