use chrono::Utc;
use entity::{runs::ActiveModel, sea_orm_active_enums::RunStatus};
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    metrics::RUNS_ENQUEUED_TOTAL,
    repository::{org_usage, runs, tenants},
    services::{queue::QueueAdapter, registry, signature},
    types::{runs::Run, tenants::Plan},
};

fn current_period() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Admits a run for `(asset_id, processor_name)`: enforces the tenant's
/// monthly quota, reuses an in-flight or still-valid completed run when one
/// exists, and otherwise inserts a fresh pending run and pushes it onto the
/// queue. Idempotent by design -- calling this twice for the same asset and
/// processor without `force` and without new content never enqueues twice.
///
/// `retry` only matters when the latest run for this asset/processor is
/// `failed`: without it a failed run is reused as-is (the caller is just
/// polling), with it a fresh run is created (the caller wants another
/// attempt).
pub async fn admit_run<C: ConnectionTrait>(
    db: &C,
    queue: &QueueAdapter,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
    force: bool,
    retry: bool,
) -> Result<Run, ServiceError> {
    let spec = registry::find(processor_name)?;

    let plan = tenants::find_by_id(db, tenant_id)
        .await?
        .map(|t| Plan::from_str_or_default(&t.plan))
        .unwrap_or(Plan::Free);
    check_quota(db, tenant_id, plan).await?;

    let current_signature = if spec.name != "asset-fingerprint" {
        signature::latest_signature_for_asset(db, tenant_id, asset_id).await?
    } else {
        None
    };

    if !force {
        if let Some(reused) =
            find_reusable_run(db, tenant_id, asset_id, processor_name, retry, current_signature.as_deref())
                .await?
        {
            return Ok(reused.into());
        }
    }

    let run = ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        asset_id: Set(asset_id),
        processor_name: Set(spec.name.to_string()),
        processor_version: Set(spec.version.to_string()),
        status: Set(RunStatus::Pending),
        estimated_cost_cents: Set(spec.price_cents),
        input_fingerprint_signature: Set(current_signature),
        ..Default::default()
    };
    let run = runs::insert(db, run).await?;

    queue
        .enqueue(&crate::services::queue::RunJob {
            run_id: run.id,
            tenant_id,
        })
        .await
        .map_err(ServiceError::from)?;

    RUNS_ENQUEUED_TOTAL
        .with_label_values(&[spec.name])
        .inc();

    Ok(run.into())
}

async fn check_quota<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    plan: Plan,
) -> Result<(), ServiceError> {
    let quota = plan.quota();
    let period = current_period();
    let usage = org_usage::find(db, tenant_id, &period).await?;

    if let Some(usage) = usage {
        if usage.intelligence_runs >= quota.max_runs_per_month {
            return Err(ServiceError::QuotaRunsExceeded(format!(
                "monthly run quota of {} exceeded for plan {}",
                quota.max_runs_per_month,
                plan.as_str()
            )));
        }
        if usage.estimated_cost_cents >= quota.max_cost_cents_per_month {
            return Err(ServiceError::QuotaCostExceeded(format!(
                "monthly cost quota of {} cents exceeded for plan {}",
                quota.max_cost_cents_per_month,
                plan.as_str()
            )));
        }
    }
    Ok(())
}

/// A non-terminal run is always reused (dedupes concurrent admission calls).
/// A completed run is reused only when the processor is keyed on the asset's
/// fingerprint signature and that signature hasn't changed since (an unknown
/// signature on either side is treated as a match). A failed run is reused
/// unless the caller asked for `retry`. A canceled run is never reused --
/// cancellation carries no retry semantics of its own, so the caller always
/// gets a fresh attempt.
async fn find_reusable_run<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
    retry: bool,
    current_signature: Option<&str>,
) -> Result<Option<entity::runs::Model>, ServiceError> {
    let Some(latest) =
        runs::find_latest_for_asset_processor(db, tenant_id, asset_id, processor_name).await?
    else {
        return Ok(None);
    };

    let reusable = is_reusable(
        &latest.status,
        retry,
        current_signature,
        latest.input_fingerprint_signature.as_deref(),
    );
    Ok(reusable.then_some(latest))
}

fn is_reusable(
    status: &RunStatus,
    retry: bool,
    current_signature: Option<&str>,
    prior_signature: Option<&str>,
) -> bool {
    if !status.is_terminal() {
        return true;
    }
    match status {
        RunStatus::Completed => match (current_signature, prior_signature) {
            (Some(current), Some(prior)) => current == prior,
            _ => true,
        },
        RunStatus::Failed => !retry,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RunStatus::Pending, false, None, None, true)]
    #[case(RunStatus::Running, false, None, None, true)]
    #[case(RunStatus::Completed, false, Some("a"), Some("a"), true)]
    #[case(RunStatus::Completed, false, Some("a"), Some("b"), false)]
    #[case(RunStatus::Completed, false, None, None, true)]
    #[case(RunStatus::Failed, false, None, None, true)]
    #[case(RunStatus::Failed, true, None, None, false)]
    #[case(RunStatus::Canceled, false, None, None, false)]
    fn reuse_table_matches_policy(
        #[case] status: RunStatus,
        #[case] retry: bool,
        #[case] current_signature: Option<&str>,
        #[case] prior_signature: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(
            is_reusable(&status, retry, current_signature, prior_signature),
            expected
        );
    }
}
