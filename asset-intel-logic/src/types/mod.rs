pub mod deadletter_events;
pub mod org_usage;
pub mod related_assets;
pub mod results;
pub mod runs;
pub mod search_index;
pub mod stripe_events;
pub mod tenants;

pub type TenantId = uuid::Uuid;
pub type AssetId = uuid::Uuid;
