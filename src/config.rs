//! Remote service configuration.
//!
//! ## Loading Order
//!
//! 1. Explicit path handed to [`RemoteConfig::load_from`]
//! 2. `PHOTOSPACE_CONFIG` environment variable (path to TOML file)
//! 3. `photospace.toml` in the current working directory
//! 4. Built-in defaults
//!
//! The loaded config is a plain value threaded through constructors —
//! there is deliberately no global config state in this crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable naming a config file path.
const CONFIG_ENV_VAR: &str = "PHOTOSPACE_CONFIG";

/// Config file looked up in the working directory.
const CONFIG_FILE_NAME: &str = "photospace.toml";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for the remote splat service and local artifact namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the splat service. `None` means not configured — the
    /// remote path then fails fast with `api_not_configured`.
    pub base_url: Option<String>,

    /// Bearer token for the service.
    pub api_key: String,

    /// Interval between job status polls.
    pub poll_interval_ms: u64,

    /// Hard wall-clock deadline for one end-to-end generate call.
    pub deadline_ms: u64,

    /// Root of the namespaced local artifact store.
    pub artifact_dir: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: String::new(),
            poll_interval_ms: 2000,
            deadline_ms: 180_000,
            artifact_dir: PathBuf::from("data/photospace"),
        }
    }
}

impl RemoteConfig {
    /// Load configuration using the documented lookup order, falling back
    /// to defaults when no file is found. A file that exists but fails to
    /// parse is a warning, not an error — the previous link in the chain
    /// is tried instead.
    #[must_use]
    pub fn load() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::load_from(Path::new(&env_path)) {
                Ok(config) => return config,
                Err(error) => warn!(%error, "ignoring {CONFIG_ENV_VAR} config"),
            }
        }

        let cwd_path = Path::new(CONFIG_FILE_NAME);
        if cwd_path.exists() {
            match Self::load_from(cwd_path) {
                Ok(config) => return config,
                Err(error) => warn!(%error, "ignoring {CONFIG_FILE_NAME}"),
            }
        }

        Self::default()
    }

    /// Load configuration from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "remote config loaded");
        Ok(config)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Generate deadline as a [`Duration`].
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RemoteConfig::default();
        assert_eq!(config.base_url, None);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.deadline(), Duration::from_secs(180));
        assert_eq!(config.artifact_dir, PathBuf::from("data/photospace"));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "base_url = \"https://splat.example.com\"\npoll_interval_ms = 500"
        )
        .expect("write");

        let config = RemoteConfig::load_from(file.path()).expect("load");
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://splat.example.com")
        );
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.deadline_ms, 180_000);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "no_such_key = 1").expect("write");

        let err = RemoteConfig::load_from(file.path()).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err =
            RemoteConfig::load_from(Path::new("/nonexistent/photospace.toml"))
                .expect_err("should fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
