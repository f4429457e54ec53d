use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub plan: Plan,
}

impl From<entity::tenants::Model> for Tenant {
    fn from(m: entity::tenants::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            plan: Plan::from_str_or_default(&m.plan),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
    Team,
}

/// Monthly caps per plan, frozen from the original billing configuration.
/// See DESIGN.md for the rationale behind the `ocr-text` price point, which
/// the source system never published.
pub struct PlanQuota {
    pub max_runs_per_month: i64,
    pub max_cost_cents_per_month: i64,
}

impl Plan {
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "pro" => Self::Pro,
            "team" => Self::Team,
            _ => Self::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Team => "team",
        }
    }

    pub fn quota(&self) -> PlanQuota {
        match self {
            Self::Free => PlanQuota {
                max_runs_per_month: 1_000,
                max_cost_cents_per_month: 10_00,
            },
            Self::Pro => PlanQuota {
                max_runs_per_month: 50_000,
                max_cost_cents_per_month: 500_00,
            },
            Self::Team => PlanQuota {
                max_runs_per_month: 200_000,
                max_cost_cents_per_month: 2_000_00,
            },
        }
    }
}
