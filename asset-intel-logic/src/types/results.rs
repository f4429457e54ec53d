use chrono::{DateTime, Utc};
use entity::sea_orm_active_enums::ResultType;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub run_id: Uuid,
    pub r#type: ResultType,
    pub confidence: Option<f64>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl From<entity::results::Model> for RunResult {
    fn from(m: entity::results::Model) -> Self {
        Self {
            id: m.id,
            asset_id: m.asset_id,
            run_id: m.run_id,
            r#type: m.r#type,
            confidence: m.confidence,
            data: m.data,
            created_at: m.created_at,
        }
    }
}
