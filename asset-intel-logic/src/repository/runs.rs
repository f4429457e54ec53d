use chrono::Utc;
use entity::{
    runs::{ActiveModel, Column, Entity, Model},
    sea_orm_active_enums::RunStatus,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

pub async fn insert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<Model, DbErr> {
    active.insert(db).await
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    run_id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(run_id)
        .filter(Column::TenantId.eq(tenant_id))
        .one(db)
        .await
}

/// The most recently created run for this asset+processor, used by the
/// reuse-by-signature admission policy and by cancellation cascades.
pub async fn find_latest_for_asset_processor<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .filter(Column::ProcessorName.eq(processor_name))
        .order_by_desc(Column::CreatedAt)
        .one(db)
        .await
}

pub async fn list_for_asset<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    limit: u64,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

pub async fn mark_running<C: ConnectionTrait>(db: &C, run: Model) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.status = Set(RunStatus::Running);
    active.update(db).await
}

pub async fn mark_completed<C: ConnectionTrait>(db: &C, run: Model) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.status = Set(RunStatus::Completed);
    active.completed_at = Set(Some(Utc::now()));
    active.error_message = Set(None);
    active.update(db).await
}

pub async fn mark_failed<C: ConnectionTrait>(
    db: &C,
    run: Model,
    error_message: String,
) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.status = Set(RunStatus::Failed);
    active.completed_at = Set(Some(Utc::now()));
    active.error_message = Set(Some(error_message));
    active.update(db).await
}

pub async fn mark_canceled<C: ConnectionTrait>(db: &C, run: Model) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.status = Set(RunStatus::Canceled);
    active.completed_at = Set(Some(Utc::now()));
    active.canceled_at = Set(Some(Utc::now()));
    active.update(db).await
}

pub async fn set_cancel_requested<C: ConnectionTrait>(db: &C, run: Model) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.cancel_requested = Set(true);
    active.update(db).await
}

pub async fn record_retry<C: ConnectionTrait>(db: &C, run: Model) -> Result<Model, DbErr> {
    let retry_count = run.retry_count + 1;
    let mut active: ActiveModel = run.into();
    active.status = Set(RunStatus::Pending);
    active.retry_count = Set(retry_count);
    active.last_retry_at = Set(Some(Utc::now()));
    active.update(db).await
}

pub async fn update_progress<C: ConnectionTrait>(
    db: &C,
    run: Model,
    current: i32,
    total: Option<i32>,
    message: Option<String>,
) -> Result<Model, DbErr> {
    let mut active: ActiveModel = run.into();
    active.progress_current = Set(current);
    active.progress_total = Set(total);
    active.progress_message = Set(message);
    active.update(db).await
}

/// Bulk-marks non-terminal runs of `processor_names` for this asset as
/// cancel-requested, skipping `exclude_run_id`. Limited to 50 rows per call
/// so a single cascade can't stall the request that triggered it.
pub async fn cascade_cancel_asset_runs<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_names: &[&str],
    exclude_run_id: Uuid,
) -> Result<u64, DbErr> {
    let candidates = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .filter(Column::ProcessorName.is_in(processor_names.to_vec()))
        .filter(Column::Id.ne(exclude_run_id))
        .filter(Column::CancelRequested.eq(false))
        .filter(
            Column::Status
                .ne(RunStatus::Completed)
                .and(Column::Status.ne(RunStatus::Failed))
                .and(Column::Status.ne(RunStatus::Canceled)),
        )
        .limit(50)
        .all(db)
        .await?;

    let count = candidates.len() as u64;
    for run in candidates {
        set_cancel_requested(db, run).await?;
    }
    Ok(count)
}
