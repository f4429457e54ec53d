use chrono::Utc;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{error::ServiceError, repository::org_usage, types::org_usage::OrgUsage};

fn current_period() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Usage accounting for the current billing period only; historical periods
/// are retained in `org_usage` but surfaced through direct queries rather
/// than this helper, which backs the `/v1/tenants/{tenant_id}/usage` summary.
pub async fn current_usage<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
) -> Result<OrgUsage, ServiceError> {
    let period = current_period();
    let usage = org_usage::find(db, tenant_id, &period).await?;
    Ok(usage.map(Into::into).unwrap_or(OrgUsage {
        tenant_id,
        period,
        intelligence_runs: 0,
        estimated_cost_cents: 0,
    }))
}
