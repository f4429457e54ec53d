use actix_web::{web, HttpResponse};
use asset_intel_logic::{
    error::ServiceError,
    repository::{runs, search_index},
    services::{admission, retry, search_index as search_index_svc, signature},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{normalize_page_size, AppState, TenantId};

#[derive(Debug, Deserialize)]
pub struct IndexStatusQuery {
    #[serde(default)]
    pub auto_retry_ocr: bool,
}

#[derive(Debug, Serialize)]
struct IndexStatus {
    asset_id: Uuid,
    indexed: bool,
    has_ocr_text: bool,
    ocr_auto_retry: Option<OcrAutoRetryOutcome>,
}

#[derive(Debug, Serialize)]
struct OcrAutoRetryOutcome {
    started: bool,
    reason: Option<String>,
}

/// `GET /assets/{id}/index/status`. When `auto_retry_ocr=true` and the
/// asset's latest OCR run failed in a transient, retry-eligible way, this
/// also kicks off a fresh OCR run and responds 202 to signal work started.
pub async fn index_status(
    path: web::Path<Uuid>,
    query: web::Query<IndexStatusQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let asset_id = path.into_inner();
    let entry = search_index::find_by_asset(&state.db, tenant_id, asset_id).await?;
    let has_ocr_text = entry
        .as_ref()
        .and_then(|e| e.ocr_text_preview.as_deref())
        .is_some_and(|t| !t.trim().is_empty());

    let mut outcome = None;
    let mut started = false;
    if query.auto_retry_ocr && !has_ocr_text {
        outcome = maybe_auto_retry_ocr(&state, tenant_id, asset_id).await?;
        started = outcome.as_ref().is_some_and(|o| o.started);
    }

    let status = IndexStatus {
        asset_id,
        indexed: entry.is_some(),
        has_ocr_text,
        ocr_auto_retry: outcome,
    };

    if started {
        Ok(HttpResponse::Accepted().json(status))
    } else {
        Ok(HttpResponse::Ok().json(status))
    }
}

async fn maybe_auto_retry_ocr(
    state: &AppState,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<OcrAutoRetryOutcome>, ServiceError> {
    let Some(latest) =
        runs::find_latest_for_asset_processor(&state.db, tenant_id, asset_id, "ocr-text").await?
    else {
        return Ok(None);
    };
    if latest.status != entity::sea_orm_active_enums::RunStatus::Failed {
        return Ok(None);
    }

    let category = retry::classify_ocr_failure(latest.error_message.as_deref().unwrap_or_default());
    let seconds_since_last_retry = latest.last_retry_at.map(retry::seconds_since);
    let current_signature = signature::latest_signature_for_asset(&state.db, tenant_id, asset_id).await?;
    if !retry::should_auto_retry_ocr(
        category,
        latest.retry_count,
        seconds_since_last_retry,
        current_signature.as_deref(),
        latest.input_fingerprint_signature.as_deref(),
    ) {
        return Ok(Some(OcrAutoRetryOutcome {
            started: false,
            reason: Some(format!("{category:?}")),
        }));
    }

    admission::admit_run(
        &state.db,
        &state.queue,
        tenant_id,
        asset_id,
        "ocr-text",
        false,
        true,
    )
    .await?;
    Ok(Some(OcrAutoRetryOutcome {
        started: true,
        reason: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    #[serde(default = "default_limit_per_bucket")]
    pub limit_per_bucket: u64,
    #[serde(default)]
    pub ensure_index: bool,
}

fn default_limit_per_bucket() -> u64 {
    10
}

pub async fn related(
    path: web::Path<Uuid>,
    query: web::Query<RelatedQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let asset_id = path.into_inner();

    if query.ensure_index && search_index::find_by_asset(&state.db, tenant_id, asset_id).await?.is_none() {
        admission::admit_run(
            &state.db,
            &state.queue,
            tenant_id,
            asset_id,
            "asset-fingerprint",
            false,
            false,
        )
        .await?;
        return Ok(HttpResponse::Accepted().json(serde_json::json!({
            "asset_id": asset_id,
            "related": [],
            "indexing_started": true,
        })));
    }

    let related =
        search_index_svc::rank_related_assets(&state.db, tenant_id, asset_id, query.limit_per_bucket)
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "asset_id": asset_id,
        "related": related,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_search_limit() -> u64 {
    20
}

pub async fn search_assets(
    query: web::Query<SearchQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let limit = normalize_page_size(&state.api, Some(query.limit as u32));
    let hits = search_index_svc::search_by_text(&state.db, tenant_id, &query.query, limit + query.offset).await?;
    let hits: Vec<_> = hits.into_iter().skip(query.offset as usize).collect();
    Ok(HttpResponse::Ok().json(hits))
}

#[derive(Debug, Deserialize)]
pub struct DuplicatesQuery {
    pub sha256: Option<String>,
    pub etag: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: u64,
}

pub async fn duplicates(
    query: web::Query<DuplicatesQuery>,
    TenantId(tenant_id): TenantId,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    if query.sha256.is_none() && query.etag.is_none() {
        return Err(ServiceError::BadRequest(
            "at least one of sha256 or etag is required".to_string(),
        ));
    }

    let mut rows = Vec::new();
    if let Some(sha256) = &query.sha256 {
        rows.extend(search_index::find_by_sha256(&state.db, tenant_id, sha256, Uuid::nil()).await?);
    }
    if let Some(etag) = &query.etag {
        rows.extend(search_index::find_by_etag(&state.db, tenant_id, etag, Uuid::nil()).await?);
    }
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    rows.dedup_by(|a, b| a.asset_id == b.asset_id);
    rows.truncate(query.limit as usize);

    let entries: Vec<asset_intel_logic::types::search_index::SearchIndexEntry> =
        rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(entries))
}
