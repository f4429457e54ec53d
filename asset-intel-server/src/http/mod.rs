mod admin;
mod intelligence;
mod search;

use actix_web::{
    dev::Payload, http::header::HeaderValue, web, FromRequest, HttpRequest, HttpResponse,
};
use asset_intel_logic::error::ServiceError;
use sea_orm::DatabaseConnection;
use std::{future::Future, pin::Pin};
use uuid::Uuid;

use crate::settings::{AdminSettings, ApiSettings, ServiceSettings};

/// Everything a request handler needs: the write connection, the queue, the
/// asset-content client, and the paging/admin knobs from configuration.
pub struct AppState {
    pub db: DatabaseConnection,
    pub queue: asset_intel_logic::services::queue::QueueAdapter,
    pub asset_client: asset_intel_logic::clients::asset_fetcher::AssetFetcherClient,
    pub api: ApiSettings,
    pub admin: AdminSettings,
    pub service: ServiceSettings,
}

/// Resolves `X-API-Key` to a tenant. Identity-provider lookup (API-key hash
/// -> tenant, role) is an external collaborator outside this crate's scope;
/// the header is taken to already carry the resolved tenant id.
pub struct TenantId(pub Uuid);

impl FromRequest for TenantId {
    type Error = ServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req.headers().get("X-API-Key").cloned();
        Box::pin(async move {
            let value = header
                .ok_or_else(|| ServiceError::BadRequest("missing X-API-Key header".to_string()))?;
            let tenant_id = parse_header_uuid(&value)
                .map_err(|_| ServiceError::BadRequest("invalid X-API-Key header".to_string()))?;
            Ok(TenantId(tenant_id))
        })
    }
}

fn parse_header_uuid(value: &HeaderValue) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(value.to_str().unwrap_or_default())
}

/// Enforced on every `/admin/*` route: 404 when the admin surface is
/// disabled globally (so its existence isn't even leaked), 403 on a key
/// mismatch.
pub fn require_admin(req: &HttpRequest, admin: &AdminSettings) -> Result<(), HttpResponse> {
    if !admin.enabled {
        return Err(HttpResponse::NotFound().finish());
    }
    let configured = admin.admin_key.as_deref().unwrap_or_default();
    let provided = req
        .headers()
        .get("X-Admin-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if configured.is_empty() || provided != configured {
        return Err(HttpResponse::Forbidden().finish());
    }
    Ok(())
}

pub fn configure(service_config: &mut web::ServiceConfig) {
    service_config
        .route("/health", web::get().to(health))
        .service(
            web::scope("/assets/{asset_id}/intelligence")
                .route("/summary", web::get().to(intelligence::summary))
                .route("/runs", web::get().to(intelligence::list_runs))
                .route("/runs/latest", web::get().to(intelligence::latest_run))
                .route(
                    "/{processor}",
                    web::post().to(intelligence::enqueue_run),
                )
                .route(
                    "/{processor}/cancel",
                    web::post().to(intelligence::cancel_latest_for_asset),
                ),
        )
        .route(
            "/intelligence/runs/{run_id}",
            web::get().to(intelligence::run_status),
        )
        .route(
            "/intelligence/runs/{run_id}/cancel",
            web::post().to(intelligence::cancel_run),
        )
        .route(
            "/assets/{asset_id}/index/status",
            web::get().to(search::index_status),
        )
        .route(
            "/assets/{asset_id}/related",
            web::get().to(search::related),
        )
        .route("/search/assets", web::get().to(search::search_assets))
        .route(
            "/search/duplicates",
            web::get().to(search::duplicates),
        )
        .route(
            "/admin/deadletter/intelligence_runs",
            web::get().to(admin::list_deadletter),
        )
        .route(
            "/admin/deadletter/intelligence_runs/{run_id}/requeue",
            web::post().to(admin::requeue),
        )
        .route(
            "/admin/deadletter/assets/{asset_id}/requeue_latest",
            web::post().to(admin::requeue_latest_for_asset),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "SERVING" }))
}

pub(crate) fn normalize_page_size(api: &ApiSettings, requested: Option<u32>) -> u64 {
    requested
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size) as u64
}
