use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::model::FollowedStreamer;
use crate::error::{AppError, AppResult};

/// Durable storage for the follow list. The whole list is written at once.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn load(&self) -> AppResult<Vec<FollowedStreamer>>;

    async fn save(&self, items: &[FollowedStreamer]) -> AppResult<()>;
}

/// Stores the list as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileFollowRepository {
    path: PathBuf,
}

impl JsonFileFollowRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, action: &str, error: impl Into<anyhow::Error>) -> AppError {
        let error = error.into();
        AppError::Persistence {
            message: format!("failed to {} {}: {}", action, self.path.display(), error),
            source: Some(error),
        }
    }
}

#[async_trait]
impl FollowRepository for JsonFileFollowRepository {
    /// A missing file is an empty list.
    async fn load(&self) -> AppResult<Vec<FollowedStreamer>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.persistence_error("read", e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| self.persistence_error("parse", e))
    }

    async fn save(&self, items: &[FollowedStreamer]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.persistence_error("create directory for", e))?;
        }

        let json = serde_json::to_vec_pretty(items).map_err(|e| self.persistence_error("encode", e))?;

        // write-then-rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.persistence_error("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.persistence_error("replace", e))?;

        tracing::debug!(path = %self.path.display(), count = items.len(), "Follow list saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::live::LivePlatform;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileFollowRepository::new(dir.path().join("follows.json"));
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileFollowRepository::new(dir.path().join("nested/follows.json"));
        let items = vec![
            FollowedStreamer::new(LivePlatform::Douyu, "9999", "a"),
            FollowedStreamer::new(LivePlatform::Huya, "660000", "b"),
        ];

        repo.save(&items).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), items);
        assert!(!dir.path().join("nested/follows.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("follows.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileFollowRepository::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::Persistence { .. }));
    }
}
