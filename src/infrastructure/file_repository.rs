// Directory dataset repository
use crate::application::dataset_repository::DatasetRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileDatasetRepository {
    root: PathBuf,
}

impl FileDatasetRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Datasets are published without an extension; accept a `.json` copy too
    async fn locate(&self, name: &str) -> Result<PathBuf> {
        let bare = self.root.join(name);
        if tokio::fs::try_exists(&bare).await.unwrap_or(false) {
            return Ok(bare);
        }
        let json = self.root.join(format!("{}.json", name));
        if tokio::fs::try_exists(&json).await.unwrap_or(false) {
            return Ok(json);
        }
        anyhow::bail!("Dataset {} not found under {}", name, self.root.display())
    }
}

#[async_trait]
impl DatasetRepository for FileDatasetRepository {
    async fn fetch_document(&self, name: &str) -> Result<serde_json::Value> {
        let path = self.locate(name).await?;
        tracing::debug!("Reading dataset {} from {}", name, path.display());

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
