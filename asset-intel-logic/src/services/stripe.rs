use entity::stripe_events::ActiveModel as StripeEventActiveModel;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    repository::{stripe_events, tenants},
    types::stripe_events::StripeWebhookEvent,
};

/// Maps a Stripe Price id to our internal plan name. `free` has no Stripe
/// price (it's the default for tenants with no subscription).
fn plan_for_price_id(price_id: &str) -> Option<&'static str> {
    match price_id {
        id if id == std::env::var("STRIPE_PRICE_ID_PRO").unwrap_or_default() => Some("pro"),
        id if id == std::env::var("STRIPE_PRICE_ID_TEAM").unwrap_or_default() => Some("team"),
        _ => None,
    }
}

/// Applies a subscription webhook to the local plan table. Uses the unique
/// `stripe_event_id` as an optimistic lock against redelivery: the audit
/// row is inserted first, then the plan change is applied only if this
/// event is newer than the last one actually applied for the tenant, so an
/// out-of-order redelivery can never clobber a later plan change.
pub async fn apply_subscription_event<C: ConnectionTrait>(
    db: &C,
    event: StripeWebhookEvent,
) -> Result<(), ServiceError> {
    if stripe_events::already_applied(db, &event.id).await? {
        tracing::info!(stripe_event_id = %event.id, "stripe event already applied, skipping");
        return Ok(());
    }

    let tenant_id = event.data.object.metadata.tenant_id;
    let stripe_customer_id = event.data.object.customer.clone();
    let price_id = event
        .data
        .object
        .items
        .data
        .first()
        .map(|item| item.price.id.clone());
    let event_created = event.created;

    let record = StripeEventActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        stripe_event_id: Set(event.id),
        event_type: Set(event.event_type),
        stripe_event_created: Set(event_created),
        ..Default::default()
    };
    stripe_events::insert(db, record).await?;

    if let Some(plan) = price_id.as_deref().and_then(plan_for_price_id) {
        tenants::apply_plan_if_newer(db, tenant_id, plan, &stripe_customer_id, event_created).await?;
    }

    Ok(())
}
