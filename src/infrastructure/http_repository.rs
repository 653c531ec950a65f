// HTTP dataset repository - static JSON documents under a base URL
use crate::application::dataset_repository::DatasetRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct HttpDatasetRepository {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDatasetRepository {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn document_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(name))
    }
}

#[async_trait]
impl DatasetRepository for HttpDatasetRepository {
    async fn fetch_document(&self, name: &str) -> Result<serde_json::Value> {
        let url = self.document_url(name);
        tracing::debug!("Fetching dataset {} from {}", name, url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to request dataset {}", name))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Dataset {} request failed with status {}: {}", name, status, body);
        }

        response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Failed to parse dataset {}", name))
    }
}
