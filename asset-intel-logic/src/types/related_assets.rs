use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RelatedAsset {
    pub asset_id: Uuid,
    pub score: f64,
    pub explanation: String,
    pub badges: Vec<MatchReason>,
    pub snippet: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Sha256,
    Etag,
    NearSize,
    TextSimilarity,
}

impl MatchReason {
    /// Human-readable explanation for the top-scoring signal, shown as the
    /// headline reason a candidate was surfaced as related.
    pub fn explain(self, near_size_pct: Option<f64>) -> String {
        match self {
            MatchReason::Sha256 => "Exact duplicate".to_string(),
            MatchReason::Etag => "Same ETag".to_string(),
            MatchReason::NearSize => match near_size_pct {
                Some(pct) => format!("Near duplicate ({pct:.0}%)"),
                None => "Near duplicate".to_string(),
            },
            MatchReason::TextSimilarity => "Related by OCR text".to_string(),
        }
    }
}
