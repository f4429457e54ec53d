use actix_web::{web, HttpResponse};
use asset_intel_logic::{
    error::ServiceError,
    repository::{results, runs},
    services::{admission, cancellation},
    types::{results::RunResult, runs::Run},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, TenantId};

#[derive(Debug, Deserialize)]
pub struct EnqueueQuery {
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub retry: bool,
}

pub async fn enqueue_run(
    path: web::Path<(Uuid, String)>,
    query: web::Query<EnqueueQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let (asset_id, processor) = path.into_inner();
    let run = admission::admit_run(
        &state.db,
        &state.queue,
        tenant_id,
        asset_id,
        &processor,
        query.force,
        query.retry,
    )
    .await?;
    Ok(HttpResponse::Accepted().json(run))
}

#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    #[serde(default = "default_list_limit")]
    pub limit: u64,
}

fn default_list_limit() -> u64 {
    50
}

pub async fn list_runs(
    path: web::Path<Uuid>,
    query: web::Query<ListRunsQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let asset_id = path.into_inner();
    let rows = runs::list_for_asset(&state.db, tenant_id, asset_id, query.limit).await?;
    let runs: Vec<Run> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(runs))
}

#[derive(Debug, Deserialize)]
pub struct LatestRunQuery {
    pub processor: String,
}

pub async fn latest_run(
    path: web::Path<Uuid>,
    query: web::Query<LatestRunQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let asset_id = path.into_inner();
    let run = runs::find_latest_for_asset_processor(&state.db, tenant_id, asset_id, &query.processor)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no runs for processor {}", query.processor)))?;
    Ok(HttpResponse::Ok().json(Run::from(run)))
}

#[derive(Debug, Serialize)]
struct RunDetail {
    #[serde(flatten)]
    run: Run,
    results: Vec<RunResult>,
}

pub async fn run_status(
    path: web::Path<Uuid>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let run_id = path.into_inner();
    let run = runs::find_by_id(&state.db, tenant_id, run_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("run {run_id} not found")))?;
    let results = results::for_run(&state.db, run.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(RunDetail {
        run: run.into(),
        results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    #[serde(default)]
    pub cascade: bool,
}

pub async fn cancel_run(
    path: web::Path<Uuid>,
    query: web::Query<CancelQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let run_id = path.into_inner();
    let response =
        cancellation::request_cancel_run(&state.db, tenant_id, run_id, query.cascade).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn cancel_latest_for_asset(
    path: web::Path<(Uuid, String)>,
    query: web::Query<CancelQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let (asset_id, processor) = path.into_inner();
    let response = cancellation::request_cancel_latest_run_for_asset(
        &state.db,
        tenant_id,
        asset_id,
        &processor,
        query.cascade,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Serialize)]
struct AssetSummary {
    asset_id: Uuid,
    latest_results: Vec<RunResult>,
    recent_runs: Vec<Run>,
}

/// Aggregated view backing `GET /assets/{id}/intelligence/summary`: the
/// latest result of each processor output type plus a recent-runs snapshot,
/// so a client can render an asset's intelligence state in one call.
pub async fn summary(
    path: web::Path<Uuid>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    use entity::sea_orm_active_enums::ResultType;

    let asset_id = path.into_inner();
    let mut latest_results = Vec::new();
    for result_type in [
        ResultType::Fingerprint,
        ResultType::ImageMetadata,
        ResultType::OcrText,
        ResultType::OcrTextPartial,
    ] {
        if let Some(result) = results::latest_by_type(&state.db, tenant_id, asset_id, result_type).await? {
            latest_results.push(result.into());
        }
    }
    let recent_runs = runs::list_for_asset(&state.db, tenant_id, asset_id, 20)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(AssetSummary {
        asset_id,
        latest_results,
        recent_runs,
    }))
}
