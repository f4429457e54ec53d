use chrono::Utc;
use entity::deadletter_events::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

pub async fn insert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<Model, DbErr> {
    active.insert(db).await
}

pub async fn list_for_tenant<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    limit: u64,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .order_by_desc(Column::FailedAt)
        .limit(limit)
        .all(db)
        .await
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    event_id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(event_id)
        .filter(Column::TenantId.eq(tenant_id))
        .one(db)
        .await
}

pub async fn latest_non_requeued_for_run<C: ConnectionTrait>(
    db: &C,
    run_id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::RunId.eq(run_id))
        .filter(Column::RequeuedAt.is_null())
        .order_by_desc(Column::FailedAt)
        .one(db)
        .await
}

pub async fn latest_non_requeued_for_asset_processor<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .filter(Column::ProcessorName.eq(processor_name))
        .filter(Column::RequeuedAt.is_null())
        .order_by_desc(Column::FailedAt)
        .one(db)
        .await
}

pub async fn mark_requeued<C: ConnectionTrait>(db: &C, event: Model) -> Result<Model, DbErr> {
    let mut active: ActiveModel = event.into();
    active.requeued_at = Set(Some(Utc::now()));
    active.update(db).await
}
