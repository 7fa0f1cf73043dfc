//! Byte persistence for delivery output.

use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Writes named blobs and reports where they went.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `bytes` under `name` and return its location.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// Storage rooted at a local directory.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(PodsmithError::Delivery(format!("Invalid file name: {:?}", name)));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            PodsmithError::Delivery(format!("Failed to create {}: {}", self.root.display(), e))
        })?;

        let path = self.root.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PodsmithError::Delivery(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(bytes = bytes.len(), "Wrote {}", path.display());
        Ok(path.display().to_string())
    }
}
