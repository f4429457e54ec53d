use entity::sea_orm_active_enums::ResultType;
use sea_orm::ConnectionTrait;
use serde_json::Value;
use uuid::Uuid;

use crate::repository::results;

/// Derives a stable signature for "has this asset's content already been
/// fingerprinted" from a fingerprint result's JSON payload, preferring the
/// strongest identity signal available: a content hash, then an HTTP etag,
/// then a length+last-modified tuple. Returns `None` when the payload has
/// none of these, in which case runs for this asset can never be reused.
pub fn signature_from_fingerprint_data(data: &Value) -> Option<String> {
    if let Some(sha256) = data.get("sha256").and_then(Value::as_str) {
        return Some(format!("sha256:{sha256}"));
    }
    if let Some(etag) = data.get("etag").and_then(Value::as_str) {
        return Some(format!("etag:{etag}"));
    }
    let content_length = data.get("content_length").and_then(Value::as_i64);
    let last_modified = data.get("last_modified").and_then(Value::as_str);
    if let (Some(content_length), Some(last_modified)) = (content_length, last_modified) {
        return Some(format!("lenlm:{content_length}:{last_modified}"));
    }
    None
}

pub async fn latest_signature_for_asset<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<String>, sea_orm::DbErr> {
    let latest = results::latest_by_type(db, tenant_id, asset_id, ResultType::Fingerprint).await?;
    Ok(latest.and_then(|r| signature_from_fingerprint_data(&r.data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_sha256_over_etag_and_lenlm() {
        let data = json!({
            "sha256": "abc123",
            "etag": "W/\"xyz\"",
            "content_length": 42,
            "last_modified": "2024-01-01T00:00:00Z",
        });
        assert_eq!(
            signature_from_fingerprint_data(&data),
            Some("sha256:abc123".to_string())
        );
    }

    #[test]
    fn falls_back_to_etag_then_lenlm() {
        let data = json!({ "etag": "W/\"xyz\"" });
        assert_eq!(
            signature_from_fingerprint_data(&data),
            Some("etag:W/\"xyz\"".to_string())
        );

        let data = json!({ "content_length": 42, "last_modified": "2024-01-01T00:00:00Z" });
        assert_eq!(
            signature_from_fingerprint_data(&data),
            Some("lenlm:42:2024-01-01T00:00:00Z".to_string())
        );
    }

    #[test]
    fn no_signal_yields_none() {
        assert_eq!(signature_from_fingerprint_data(&json!({})), None);
    }
}
