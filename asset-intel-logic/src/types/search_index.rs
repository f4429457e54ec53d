use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SearchIndexEntry {
    pub asset_id: Uuid,
    pub sha256: Option<String>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub ocr_text_preview: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<entity::search_index::Model> for SearchIndexEntry {
    fn from(m: entity::search_index::Model) -> Self {
        Self {
            asset_id: m.asset_id,
            sha256: m.sha256,
            etag: m.etag,
            content_type: m.content_type,
            content_length: m.content_length,
            ocr_text_preview: m.ocr_text_preview,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub asset_id: Uuid,
    pub rank: f64,
    pub snippet: Option<String>,
}
