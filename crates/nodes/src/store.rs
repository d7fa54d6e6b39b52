//! File-system artifact store.

use std::path::PathBuf;

use async_trait::async_trait;
use pipeline::{ArtifactPath, ArtifactStore, PersistError};

/// Writes artifacts under a root directory, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn persist(&self, path: &ArtifactPath, contents: &str) -> Result<PathBuf, PersistError> {
        let target = self.root.join(path.as_str());
        let fail = |source| PersistError {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(fail)?;
        }
        tokio::fs::write(&target, contents.as_bytes())
            .await
            .map_err(fail)?;
        Ok(target)
    }
}
