use entity::{
    results::{ActiveModel, Column, Entity, Model},
    sea_orm_active_enums::ResultType,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

pub async fn insert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<Model, DbErr> {
    active.insert(db).await
}

pub async fn latest_by_type<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    r#type: ResultType,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .filter(Column::Type.eq(r#type))
        .order_by_desc(Column::CreatedAt)
        .one(db)
        .await
}

pub async fn for_run<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::RunId.eq(run_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
}
