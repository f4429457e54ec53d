use entity::stripe_events::{ActiveModel, Column, Entity, Model};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

/// `stripe_event_id` carries a unique index, so a redelivered webhook hits
/// this and is treated as already-applied rather than double-counted.
pub async fn already_applied<C: ConnectionTrait>(
    db: &C,
    stripe_event_id: &str,
) -> Result<bool, DbErr> {
    Ok(Entity::find()
        .filter(Column::StripeEventId.eq(stripe_event_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn insert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<Model, DbErr> {
    match active.insert(db).await {
        Ok(model) => Ok(model),
        Err(DbErr::RecordNotInserted) => Err(DbErr::RecordNotInserted),
        Err(err) => Err(err),
    }
}
