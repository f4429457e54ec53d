use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    clients::asset_fetcher::AssetFetcherClient, error::ServiceError,
    services::processors::ProcessorOutput,
};

/// Computes a content hash and records the identity signals (etag,
/// content-length, last-modified) the admission and ranking services key
/// off of. Always fetches bytes rather than trusting the source etag, so a
/// storage backend without stable etags still gets a usable signature.
/// Metadata and content are independent requests, so they're issued
/// concurrently rather than one after the other.
pub async fn run(
    client: &AssetFetcherClient,
    asset_id: Uuid,
) -> Result<ProcessorOutput, ServiceError> {
    let (metadata, bytes) = futures::join!(client.fetch_metadata(asset_id), client.fetch_bytes(asset_id));
    let metadata = metadata.map_err(ServiceError::Internal)?;
    let bytes = bytes.map_err(ServiceError::Internal)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = hex::encode(hasher.finalize());

    let data = json!({
        "sha256": sha256,
        "etag": metadata.etag,
        "content_type": metadata.content_type,
        "content_length": metadata.content_length.unwrap_or(bytes.len() as i64),
        "last_modified": metadata.last_modified,
    });

    Ok(ProcessorOutput {
        data,
        confidence: None,
        ocr_text: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_client(asset_id: Uuid, metadata: serde_json::Value, body: &[u8]) -> AssetFetcherClient {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/assets/{asset_id}/metadata")))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/assets/{asset_id}/content")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&server)
            .await;
        AssetFetcherClient::new(server.uri())
    }

    #[tokio::test]
    async fn hashes_fetched_bytes_and_carries_through_metadata() {
        let asset_id = Uuid::new_v4();
        let client = mock_client(
            asset_id,
            json!({
                "content_type": "image/png",
                "content_length": 4,
                "etag": "\"abc123\"",
                "last_modified": "Tue, 01 Jul 2025 00:00:00 GMT",
            }),
            b"data",
        )
        .await;

        let output = run(&client, asset_id).await.unwrap();

        let mut hasher = Sha256::new();
        hasher.update(b"data");
        let expected_sha256 = hex::encode(hasher.finalize());

        assert_eq!(output.data["sha256"], json!(expected_sha256));
        assert_eq!(output.data["etag"], json!("\"abc123\""));
        assert_eq!(output.data["content_type"], json!("image/png"));
        assert_eq!(output.data["content_length"], json!(4));
    }

    #[tokio::test]
    async fn falls_back_to_observed_length_when_metadata_omits_it() {
        let asset_id = Uuid::new_v4();
        let client = mock_client(
            asset_id,
            json!({
                "content_type": null,
                "content_length": null,
                "etag": null,
                "last_modified": null,
            }),
            b"longer body",
        )
        .await;

        let output = run(&client, asset_id).await.unwrap();
        assert_eq!(output.data["content_length"], json!(11));
    }
}
