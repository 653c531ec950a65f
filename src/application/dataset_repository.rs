// Repository trait for dataset access
use async_trait::async_trait;

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Fetch one dataset document by name, parsed but not yet interpreted
    async fn fetch_document(&self, name: &str) -> anyhow::Result<serde_json::Value>;
}
