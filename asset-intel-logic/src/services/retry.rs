use chrono::Utc;
use entity::{deadletter_events::ActiveModel as DeadletterActiveModel, runs::Model as RunModel};
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    metrics::{RUNS_DEADLETTERED_TOTAL, RUNS_ENQUEUED_TOTAL, RUNS_RETRIED_TOTAL},
    repository::{deadletter_events, runs},
    services::queue::{QueueAdapter, RunJob},
};

const MAX_TRIES: i32 = 3;
const ERROR_SUMMARY_MAX_LEN: usize = 200;
const MIN_RETRY_DELAY_SECONDS: i64 = 60;
const MAX_OCR_RETRIES_PER_SIGNATURE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrFailureCategory {
    DependencyMissing,
    PdfDependencyMissing,
    PdfRasterizeFailed,
    UnsupportedContentType,
    NotImage,
    NetworkError,
    HttpError,
    Unknown,
}

/// Buckets a raw OCR error message into the stable, UI-visible categories
/// the auto-retry decision tree reasons about, by matching well-known
/// substrings -- the upstream OCR engine doesn't give us structured codes.
pub fn classify_ocr_failure(error_message: &str) -> OcrFailureCategory {
    let lower = error_message.to_lowercase();
    if lower.contains("pdf") && (lower.contains("dependency") || lower.contains("not installed")) {
        OcrFailureCategory::PdfDependencyMissing
    } else if lower.contains("dependency") || lower.contains("not installed") {
        OcrFailureCategory::DependencyMissing
    } else if lower.contains("rasteriz") {
        OcrFailureCategory::PdfRasterizeFailed
    } else if lower.contains("unsupported") || lower.contains("unknown format") {
        OcrFailureCategory::UnsupportedContentType
    } else if lower.contains("not an image") || lower.contains("not_image") {
        OcrFailureCategory::NotImage
    } else if lower.contains("timeout") || lower.contains("timed out") || lower.contains("connection") {
        OcrFailureCategory::NetworkError
    } else if lower.contains("rate limit") || lower.contains("429") || lower.contains("http") {
        OcrFailureCategory::HttpError
    } else {
        OcrFailureCategory::Unknown
    }
}

/// Auto-retry is permitted only when every condition holds: the category
/// isn't one of the permanent dependency-missing cases, the asset's content
/// hasn't moved on since the failed run was admitted, the minimum backoff
/// has elapsed, and the per-signature retry budget isn't exhausted.
pub fn should_auto_retry_ocr(
    category: OcrFailureCategory,
    retries_for_signature: i32,
    seconds_since_last_retry: Option<i64>,
    current_signature: Option<&str>,
    failed_run_signature: Option<&str>,
) -> bool {
    if matches!(
        category,
        OcrFailureCategory::DependencyMissing | OcrFailureCategory::PdfDependencyMissing
    ) {
        return false;
    }
    if let (Some(current), Some(failed)) = (current_signature, failed_run_signature) {
        if current != failed {
            return false;
        }
    }
    if retries_for_signature >= MAX_OCR_RETRIES_PER_SIGNATURE {
        return false;
    }
    seconds_since_last_retry.is_none_or(|secs| secs >= MIN_RETRY_DELAY_SECONDS)
}

/// Truncates and flattens an error message for storage, so a multi-line
/// stack trace doesn't blow out the dead-letter listing.
pub fn safe_error_summary(raw: &str) -> String {
    let flattened = raw.replace(['\n', '\r'], " ");
    if flattened.chars().count() <= ERROR_SUMMARY_MAX_LEN {
        flattened
    } else {
        let truncated: String = flattened.chars().take(ERROR_SUMMARY_MAX_LEN).collect();
        format!("{truncated}…")
    }
}

/// Called by the dispatcher (and by the worker on a job timeout) when a
/// run's handler fails. Retries in place up to `MAX_TRIES`, re-enqueuing the
/// run for another delivery, then writes a dead-letter event and marks the
/// run failed.
pub async fn record_failure<C: ConnectionTrait>(
    db: &C,
    queue: &QueueAdapter,
    run: RunModel,
    task_name: &str,
    error_raw: &str,
) -> Result<RunModel, ServiceError> {
    let job_try = run.retry_count + 1;
    let processor_name = run.processor_name.clone();
    let tenant_id = run.tenant_id;

    if job_try < MAX_TRIES {
        let run = runs::record_retry(db, run).await?;
        queue
            .enqueue(&RunJob {
                run_id: run.id,
                tenant_id,
            })
            .await?;
        RUNS_RETRIED_TOTAL
            .with_label_values(&[processor_name.as_str()])
            .inc();
        RUNS_ENQUEUED_TOTAL
            .with_label_values(&[processor_name.as_str()])
            .inc();
        return Ok(run);
    }

    let event = DeadletterActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(run.tenant_id),
        run_id: Set(run.id),
        asset_id: Set(run.asset_id),
        processor_name: Set(run.processor_name.clone()),
        processor_version: Set(run.processor_version.clone()),
        task_name: Set(task_name.to_string()),
        job_try: Set(job_try),
        error_summary: Set(safe_error_summary(error_raw)),
        error_raw: Set(error_raw.to_string()),
        ..Default::default()
    };
    deadletter_events::insert(db, event).await?;

    let error_message = format!(
        "Dead-lettered after repeated failures: {}",
        safe_error_summary(error_raw)
    );
    let run = runs::mark_failed(db, run, error_message).await?;
    RUNS_DEADLETTERED_TOTAL
        .with_label_values(&[processor_name.as_str()])
        .inc();
    Ok(run)
}

/// Requeues a dead-lettered run for another attempt: marks the triggering
/// event as requeued (so it won't be requeued twice), resets the run to
/// `pending`, and re-enqueues it.
pub async fn requeue_deadletter_run<C: ConnectionTrait>(
    db: &C,
    queue: &QueueAdapter,
    tenant_id: Uuid,
    event_id: Uuid,
) -> Result<RunModel, ServiceError> {
    let event = deadletter_events::find_by_id(db, tenant_id, event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("deadletter event {event_id} not found")))?;

    if event.requeued_at.is_some() {
        return Err(ServiceError::Conflict(
            "deadletter event already requeued".to_string(),
        ));
    }

    let run = runs::find_by_id(db, tenant_id, event.run_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("run {} not found", event.run_id)))?;

    deadletter_events::mark_requeued(db, event).await?;

    let run = entity::runs::ActiveModel {
        status: Set(entity::sea_orm_active_enums::RunStatus::Pending),
        error_message: Set(None),
        cancel_requested: Set(false),
        canceled_at: Set(None),
        ..run.clone().into()
    };
    let run: RunModel = sea_orm::ActiveModelTrait::update(run, db).await?;

    queue
        .enqueue(&RunJob {
            run_id: run.id,
            tenant_id,
        })
        .await?;
    RUNS_ENQUEUED_TOTAL
        .with_label_values(&[run.processor_name.as_str()])
        .inc();

    Ok(run)
}

/// Requeues the latest non-requeued dead-letter event for `run_id`, used by
/// the admin endpoint that addresses a dead-lettered run directly.
pub async fn requeue_for_run<C: ConnectionTrait>(
    db: &C,
    queue: &QueueAdapter,
    tenant_id: Uuid,
    run_id: Uuid,
) -> Result<RunModel, ServiceError> {
    let event = deadletter_events::latest_non_requeued_for_run(db, run_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("no dead-lettered event found for run {run_id}"))
        })?;
    requeue_deadletter_run(db, queue, tenant_id, event.id).await
}

/// Requeues the latest non-requeued dead-letter event for `(asset_id,
/// processor_name)`, used when a caller knows the asset but not the run id.
pub async fn requeue_latest_for_asset<C: ConnectionTrait>(
    db: &C,
    queue: &QueueAdapter,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
) -> Result<RunModel, ServiceError> {
    let event = deadletter_events::latest_non_requeued_for_asset_processor(
        db,
        tenant_id,
        asset_id,
        processor_name,
    )
    .await?
    .ok_or_else(|| {
        ServiceError::NotFound(format!(
            "no dead-lettered runs found for asset {asset_id} and processor {processor_name}"
        ))
    })?;
    requeue_deadletter_run(db, queue, tenant_id, event.id).await
}

pub fn seconds_since(timestamp: chrono::DateTime<Utc>) -> i64 {
    (Utc::now() - timestamp).num_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_ocr_errors() {
        assert_eq!(
            classify_ocr_failure("engine timed out after 30s"),
            OcrFailureCategory::NetworkError
        );
        assert_eq!(
            classify_ocr_failure("received 429 rate limit from provider"),
            OcrFailureCategory::HttpError
        );
        assert_eq!(
            classify_ocr_failure("pdf rasterizer dependency not installed"),
            OcrFailureCategory::PdfDependencyMissing
        );
        assert_eq!(
            classify_ocr_failure("unsupported image format webp2"),
            OcrFailureCategory::UnsupportedContentType
        );
        assert_eq!(
            classify_ocr_failure("something else entirely"),
            OcrFailureCategory::Unknown
        );
    }

    #[test]
    fn retries_transient_failures_within_budget() {
        assert!(should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            0,
            None,
            None,
            None
        ));
        assert!(should_auto_retry_ocr(
            OcrFailureCategory::HttpError,
            1,
            Some(120),
            Some("sig-a"),
            Some("sig-a")
        ));
        assert!(!should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            2,
            None,
            None,
            None
        ));
        assert!(!should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            0,
            Some(10),
            None,
            None
        ));
    }

    #[test]
    fn never_retries_dependency_missing_failures() {
        assert!(!should_auto_retry_ocr(
            OcrFailureCategory::DependencyMissing,
            0,
            None,
            None,
            None
        ));
        assert!(!should_auto_retry_ocr(
            OcrFailureCategory::PdfDependencyMissing,
            0,
            None,
            None,
            None
        ));
    }

    #[test]
    fn never_retries_against_a_stale_signature() {
        assert!(!should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            0,
            None,
            Some("sig-new"),
            Some("sig-old")
        ));
    }

    #[test]
    fn retries_when_either_signature_is_unknown() {
        assert!(should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            0,
            None,
            None,
            Some("sig-old")
        ));
        assert!(should_auto_retry_ocr(
            OcrFailureCategory::NetworkError,
            0,
            None,
            Some("sig-new"),
            None
        ));
    }

    #[test]
    fn dead_letter_message_carries_fixed_prefix() {
        let message = format!(
            "Dead-lettered after repeated failures: {}",
            safe_error_summary("engine crashed")
        );
        assert_eq!(message, "Dead-lettered after repeated failures: engine crashed");
    }

    #[test]
    fn truncates_long_multiline_errors() {
        let raw = format!("line one\nline two\n{}", "x".repeat(300));
        let summary = safe_error_summary(&raw);
        assert!(!summary.contains('\n'));
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), ERROR_SUMMARY_MAX_LEN + 1);
    }
}
