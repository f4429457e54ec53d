use actix_web::{web, HttpRequest, HttpResponse};
use asset_intel_logic::{error::ServiceError, repository::deadletter_events, services::retry};
use serde::Deserialize;
use uuid::Uuid;

use super::{require_admin, AppState};

#[derive(Debug, Deserialize)]
pub struct ListDeadletterQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

pub async fn list_deadletter(
    req: HttpRequest,
    query: web::Query<ListDeadletterQuery>,
    tenant: super::TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    if let Err(response) = require_admin(&req, &state.admin) {
        return Ok(response);
    }
    let limit = query.limit.min(state.service.deadletter_max_items as u64);
    let rows = deadletter_events::list_for_tenant(&state.db, tenant.0, limit).await?;
    Ok(HttpResponse::Ok().json(rows.into_iter().map(DeadletterEvent::from).collect::<Vec<_>>()))
}

pub async fn requeue(
    req: HttpRequest,
    path: web::Path<Uuid>,
    tenant: super::TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    if let Err(response) = require_admin(&req, &state.admin) {
        return Ok(response);
    }
    let run_id = path.into_inner();
    let run = retry::requeue_for_run(&state.db, &state.queue, tenant.0, run_id).await?;
    Ok(HttpResponse::Ok().json(asset_intel_logic::types::runs::Run::from(run)))
}

pub async fn requeue_latest_for_asset(
    req: HttpRequest,
    path: web::Path<(Uuid, String)>,
    tenant: super::TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    if let Err(response) = require_admin(&req, &state.admin) {
        return Ok(response);
    }
    let (asset_id, processor) = path.into_inner();
    let run =
        retry::requeue_latest_for_asset(&state.db, &state.queue, tenant.0, asset_id, &processor)
            .await?;
    Ok(HttpResponse::Ok().json(asset_intel_logic::types::runs::Run::from(run)))
}

#[derive(Debug, serde::Serialize)]
struct DeadletterEvent {
    id: Uuid,
    run_id: Uuid,
    asset_id: Uuid,
    processor_name: String,
    task_name: String,
    job_try: i32,
    error_summary: String,
    failed_at: chrono::DateTime<chrono::Utc>,
    requeued_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<entity::deadletter_events::Model> for DeadletterEvent {
    fn from(m: entity::deadletter_events::Model) -> Self {
        Self {
            id: m.id,
            run_id: m.run_id,
            asset_id: m.asset_id,
            processor_name: m.processor_name,
            task_name: m.task_name,
            job_try: m.job_try,
            error_summary: m.error_summary,
            failed_at: m.failed_at,
            requeued_at: m.requeued_at,
        }
    }
}
