use entity::tenants::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, tenant_id: Uuid) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(tenant_id).one(db).await
}

/// Applies a plan change only if `event_created` is newer than the last
/// Stripe event this tenant actually applied -- the optimistic lock that
/// keeps an out-of-order webhook redelivery from clobbering a later one.
pub async fn apply_plan_if_newer<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    plan: &str,
    stripe_customer_id: &str,
    event_created: i64,
) -> Result<Option<Model>, DbErr> {
    let Some(model) = Entity::find()
        .filter(Column::Id.eq(tenant_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    if model
        .last_applied_stripe_event_created
        .is_some_and(|last| last >= event_created)
    {
        return Ok(Some(model));
    }
    let mut active: ActiveModel = model.into();
    active.plan = Set(plan.to_string());
    active.stripe_customer_id = Set(Some(stripe_customer_id.to_string()));
    active.last_applied_stripe_event_created = Set(Some(event_created));
    Ok(Some(active.update(db).await?))
}
