use chrono::{DateTime, Utc};
use entity::sea_orm_active_enums::RunStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Run {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    pub processor_name: String,
    pub processor_version: String,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancel_requested: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub progress_current: i32,
    pub progress_total: Option<i32>,
    pub progress_message: Option<String>,
    pub estimated_cost_cents: i32,
    pub retry_count: i32,
}

impl From<entity::runs::Model> for Run {
    fn from(m: entity::runs::Model) -> Self {
        Self {
            id: m.id,
            tenant_id: m.tenant_id,
            asset_id: m.asset_id,
            processor_name: m.processor_name,
            processor_version: m.processor_version,
            status: m.status,
            error_message: m.error_message,
            created_at: m.created_at,
            completed_at: m.completed_at,
            cancel_requested: m.cancel_requested,
            canceled_at: m.canceled_at,
            progress_current: m.progress_current,
            progress_total: m.progress_total,
            progress_message: m.progress_message,
            estimated_cost_cents: m.estimated_cost_cents,
            retry_count: m.retry_count,
        }
    }
}

/// Body for `POST /v1/assets/{asset_id}/intelligence/{processor_name}/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRunRequest {
    /// Bypasses the reuse-by-signature policy and always enqueues a fresh run.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelRunResponse {
    pub run_id: Uuid,
    pub already_requested: bool,
}
