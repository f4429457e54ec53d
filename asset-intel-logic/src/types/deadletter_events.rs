use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DeadletterEvent {
    pub id: Uuid,
    pub run_id: Uuid,
    pub asset_id: Uuid,
    pub processor_name: String,
    pub processor_version: String,
    pub task_name: String,
    pub job_try: i32,
    pub error_summary: String,
    pub failed_at: DateTime<Utc>,
    pub requeued_at: Option<DateTime<Utc>>,
}

impl From<entity::deadletter_events::Model> for DeadletterEvent {
    fn from(m: entity::deadletter_events::Model) -> Self {
        Self {
            id: m.id,
            run_id: m.run_id,
            asset_id: m.asset_id,
            processor_name: m.processor_name,
            processor_version: m.processor_version,
            task_name: m.task_name,
            job_try: m.job_try,
            error_summary: m.error_summary,
            failed_at: m.failed_at,
            requeued_at: m.requeued_at,
        }
    }
}
