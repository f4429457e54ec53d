use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct OrgUsage {
    pub tenant_id: Uuid,
    pub period: String,
    pub intelligence_runs: i64,
    pub estimated_cost_cents: i64,
}

impl From<entity::org_usage::Model> for OrgUsage {
    fn from(m: entity::org_usage::Model) -> Self {
        Self {
            tenant_id: m.tenant_id,
            period: m.period,
            intelligence_runs: m.intelligence_runs,
            estimated_cost_cents: m.estimated_cost_cents,
        }
    }
}
