//! Local artifact storage.
//!
//! Writes artifact bytes and imported source videos under a namespaced
//! root directory, creating intermediate directories as needed. Callers
//! receive absolute paths; everything else about the filesystem stays in
//! here.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

/// Encoding of a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Gaussian-splat artifact (`.splat`).
    Splat,
}

impl ArtifactFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Splat => "splat",
        }
    }
}

/// Handle to a stored artifact. Ownership passes to the caller once
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Absolute path of the artifact on local disk.
    pub local_path: PathBuf,

    /// Artifact encoding.
    pub format: ArtifactFormat,
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Namespaced local store for artifacts and imported videos.
///
/// Layout under the root:
/// - `artifacts/<job_id>.splat` — downloaded or built artifacts
/// - `imports/<uuid>.<ext>` — source videos copied into the namespace
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist artifact bytes keyed by job id, returning the absolute
    /// path of the written file.
    pub fn write_artifact(
        &self,
        job_id: &str,
        format: ArtifactFormat,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.root.join("artifacts");
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{job_id}.{}", format.extension()));
        fs::write(&path, bytes).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        let absolute = path.canonicalize().map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %absolute.display(), bytes = bytes.len(), "artifact written");
        Ok(absolute)
    }

    /// Copy a source video into the namespace under a unique name,
    /// returning the absolute path of the copy.
    pub fn import_video(&self, source: &Path) -> Result<PathBuf, StorageError> {
        let dir = self.root.join("imports");
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mov");
        let path = dir.join(format!("{}.{extension}", Uuid::new_v4()));

        fs::copy(source, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        let absolute = path.canonicalize().map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %absolute.display(), "video imported");
        Ok(absolute)
    }
}
