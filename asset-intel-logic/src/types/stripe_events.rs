use serde::Deserialize;

/// Minimal shape of the Stripe webhook payloads we act on; full Stripe event
/// schemas carry far more than `customer.subscription.updated` needs.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: StripeWebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEventData {
    pub object: StripeSubscriptionObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionObject {
    /// Maps to `tenants.id` via the Stripe customer metadata, not modeled
    /// further here since subscription provisioning is out of scope.
    pub metadata: StripeSubscriptionMetadata,
    pub items: StripeSubscriptionItems,
    pub customer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionMetadata {
    pub tenant_id: uuid::Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}
