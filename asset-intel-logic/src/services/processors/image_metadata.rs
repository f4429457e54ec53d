use image::GenericImageView;
use serde_json::json;
use uuid::Uuid;

use crate::{
    clients::asset_fetcher::AssetFetcherClient, error::ServiceError,
    services::processors::ProcessorOutput,
};

/// Decodes the asset as an image and records its dimensions and format.
/// Unsupported formats surface as an `ServiceError::BadRequest`-shaped
/// message so the retry service classifies them correctly rather than
/// treating them as a transient failure worth retrying.
pub async fn run(
    client: &AssetFetcherClient,
    asset_id: Uuid,
) -> Result<ProcessorOutput, ServiceError> {
    let bytes = client
        .fetch_bytes(asset_id)
        .await
        .map_err(ServiceError::Internal)?;

    let format = image::guess_format(&bytes)
        .map_err(|err| ServiceError::Internal(anyhow::anyhow!("unsupported image format: {err}")))?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|err| ServiceError::Internal(anyhow::anyhow!("corrupt image file: {err}")))?;
    let (width, height) = img.dimensions();

    let data = json!({
        "width": width,
        "height": height,
        "format": format!("{format:?}"),
        "color_type": format!("{:?}", img.color()),
    });

    Ok(ProcessorOutput {
        data,
        confidence: None,
        ocr_text: None,
    })
}
