use anyhow::Context;
use serde::Deserialize;
use uuid::Uuid;

/// Metadata and content the fingerprint processor needs, as returned by the
/// upstream asset storage service. Byte content is fetched separately via
/// `fetch_bytes` since OCR needs the body but fingerprinting alone does not.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetMetadata {
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Clone)]
pub struct AssetFetcherClient {
    http: reqwest::Client,
    base_url: String,
}

impl AssetFetcherClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn fetch_metadata(&self, asset_id: Uuid) -> anyhow::Result<AssetMetadata> {
        let url = format!("{}/assets/{asset_id}/metadata", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .context("requesting asset metadata")?
            .error_for_status()
            .context("asset metadata request failed")?
            .json()
            .await
            .context("decoding asset metadata")
    }

    pub async fn fetch_bytes(&self, asset_id: Uuid) -> anyhow::Result<Vec<u8>> {
        let url = format!("{}/assets/{asset_id}/content", self.base_url);
        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .context("requesting asset content")?
            .error_for_status()
            .context("asset content request failed")?
            .bytes()
            .await
            .context("reading asset content")?;
        Ok(bytes.to_vec())
    }
}
