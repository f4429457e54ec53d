use entity::runs::Model;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    metrics::RUNS_CANCELED_TOTAL,
    repository::runs,
    services::registry,
    types::runs::CancelRunResponse,
};

/// Requests cancellation of a specific run. Idempotent: a run that already
/// has `cancel_requested` set, or is already terminal, is reported as
/// `already_requested` rather than erroring. `cascade` is an explicit
/// caller opt-in: when set, dependent-processor runs for the same asset are
/// cancel-requested too (still gated by `registry::cascades_to`, so it's a
/// no-op for processors with no dependents).
pub async fn request_cancel_run<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    run_id: Uuid,
    cascade: bool,
) -> Result<CancelRunResponse, ServiceError> {
    let run = runs::find_by_id(db, tenant_id, run_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("run {run_id} not found")))?;

    if run.cancel_requested || run.status.is_terminal() {
        return Ok(CancelRunResponse {
            run_id,
            already_requested: true,
        });
    }

    let processor_name = run.processor_name.clone();
    let asset_id = run.asset_id;
    let run = runs::set_cancel_requested(db, run).await?;

    if cascade {
        cascade_cancel_asset_runs(db, tenant_id, asset_id, &processor_name, run.id).await?;
    }

    Ok(CancelRunResponse {
        run_id: run.id,
        already_requested: false,
    })
}

/// Cancels the latest non-terminal run for `(asset_id, processor_name)`,
/// used when a caller knows the asset and processor but not the run id.
pub async fn request_cancel_latest_run_for_asset<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
    cascade: bool,
) -> Result<CancelRunResponse, ServiceError> {
    let Some(run) =
        runs::find_latest_for_asset_processor(db, tenant_id, asset_id, processor_name).await?
    else {
        return Err(ServiceError::NotFound(format!(
            "no runs found for asset {asset_id} and processor {processor_name}"
        )));
    };
    request_cancel_run(db, tenant_id, run.id, cascade).await
}

/// Cancellation of a fingerprint run cascades to dependent processors
/// (currently only `ocr-text`) for the same asset, since their input would
/// be invalidated anyway. The inverse never cascades.
async fn cascade_cancel_asset_runs<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
    exclude_run_id: Uuid,
) -> Result<(), ServiceError> {
    let dependents = registry::cascades_to(processor_name);
    if dependents.is_empty() {
        return Ok(());
    }
    runs::cascade_cancel_asset_runs(db, tenant_id, asset_id, dependents, exclude_run_id).await?;
    Ok(())
}

pub fn is_cancel_requested(run: &Model) -> bool {
    run.cancel_requested
}

pub async fn mark_run_canceled<C: ConnectionTrait>(
    db: &C,
    run: Model,
) -> Result<Model, ServiceError> {
    let processor_name = run.processor_name.clone();
    let run = runs::mark_canceled(db, run).await?;
    RUNS_CANCELED_TOTAL
        .with_label_values(&[processor_name.as_str()])
        .inc();
    Ok(run)
}
