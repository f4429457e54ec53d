use entity::{
    results::ActiveModel as ResultActiveModel,
    runs::Model as RunModel,
    sea_orm_active_enums::ResultType,
};
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use uuid::Uuid;

use crate::{
    clients::asset_fetcher::AssetFetcherClient,
    error::ServiceError,
    metrics::RUNS_COMPLETED_TOTAL,
    repository::{org_usage, results, runs},
    services::{
        cancellation, processors,
        processors::{fingerprint, image_metadata, ocr_text::{self, OcrOutcome}, CancellationCheck, ProgressReporter},
        queue::{QueueAdapter, RunJob},
        retry, search_index, signature,
    },
};

fn current_period() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

struct DbCancellationCheck<'a, C> {
    db: &'a C,
    tenant_id: Uuid,
    run_id: Uuid,
}

#[async_trait::async_trait]
impl<C: ConnectionTrait + Sync> CancellationCheck for DbCancellationCheck<'_, C> {
    async fn is_canceled(&self) -> Result<bool, ServiceError> {
        let run = runs::find_by_id(self.db, self.tenant_id, self.run_id).await?;
        Ok(run.map(|r| r.cancel_requested).unwrap_or(false))
    }
}

struct DbProgressReporter<'a, C> {
    db: &'a C,
    tenant_id: Uuid,
    run_id: Uuid,
}

#[async_trait::async_trait]
impl<C: ConnectionTrait + Sync> ProgressReporter for DbProgressReporter<'_, C> {
    async fn report(
        &self,
        current: i32,
        total: Option<i32>,
        message: Option<String>,
    ) -> Result<(), ServiceError> {
        if let Some(run) = runs::find_by_id(self.db, self.tenant_id, self.run_id).await? {
            runs::update_progress(self.db, run, current, total, message).await?;
        }
        Ok(())
    }
}

/// Runs one job end to end: marks the run running, invokes the matching
/// processor handler, and routes the outcome to completion, cancellation, or
/// the retry/dead-letter path. Called by the worker runtime for every
/// delivery off the queue.
pub async fn dispatch<C: ConnectionTrait + Sync>(
    db: &C,
    queue: &QueueAdapter,
    asset_client: &AssetFetcherClient,
    job: &RunJob,
) -> Result<(), ServiceError> {
    let Some(run) = runs::find_by_id(db, job.tenant_id, job.run_id).await? else {
        tracing::warn!(run_id = %job.run_id, "dispatched run no longer exists, dropping");
        return Ok(());
    };

    if cancellation::is_cancel_requested(&run) {
        cancellation::mark_run_canceled(db, run).await?;
        return Ok(());
    }

    let run = runs::mark_running(db, run).await?;
    let processor_name = run.processor_name.clone();

    let cancellation_check = DbCancellationCheck {
        db,
        tenant_id: run.tenant_id,
        run_id: run.id,
    };
    let progress_reporter = DbProgressReporter {
        db,
        tenant_id: run.tenant_id,
        run_id: run.id,
    };

    let outcome = run_processor(
        db,
        asset_client,
        &run,
        &cancellation_check,
        &progress_reporter,
    )
    .await;

    match outcome {
        Ok(RunOutcome::Completed) => {
            RUNS_COMPLETED_TOTAL
                .with_label_values(&[processor_name.as_str(), "completed"])
                .inc();
        }
        Ok(RunOutcome::Canceled) => {
            let run = runs::find_by_id(db, run.tenant_id, run.id)
                .await?
                .unwrap_or(run);
            cancellation::mark_run_canceled(db, run).await?;
        }
        Err(err) => {
            let run = runs::find_by_id(db, run.tenant_id, run.id)
                .await?
                .unwrap_or(run);
            retry::record_failure(db, queue, run, &processor_name, &err.to_string()).await?;
            RUNS_COMPLETED_TOTAL
                .with_label_values(&[processor_name.as_str(), "failed"])
                .inc();
        }
    }

    Ok(())
}

enum RunOutcome {
    Completed,
    Canceled,
}

async fn run_processor<C: ConnectionTrait + Sync>(
    db: &C,
    asset_client: &AssetFetcherClient,
    run: &RunModel,
    cancellation_check: &dyn CancellationCheck,
    progress_reporter: &dyn ProgressReporter,
) -> Result<RunOutcome, ServiceError> {
    match run.processor_name.as_str() {
        "asset-fingerprint" => {
            let output = fingerprint::run(asset_client, run.asset_id).await?;
            let signature = signature::signature_from_fingerprint_data(&output.data);
            persist_result(db, run, ResultType::Fingerprint, &output).await?;
            search_index::ensure_asset_indexing(db, run.tenant_id, run.asset_id, Some(&output.data), None)
                .await?;
            finalize_run(db, run, signature).await?;
            Ok(RunOutcome::Completed)
        }
        "image-metadata" => {
            let output = image_metadata::run(asset_client, run.asset_id).await?;
            persist_result(db, run, ResultType::ImageMetadata, &output).await?;
            finalize_run(db, run, None).await?;
            Ok(RunOutcome::Completed)
        }
        "ocr-text" => {
            match ocr_text::run(asset_client, run.asset_id, cancellation_check, progress_reporter).await? {
                OcrOutcome::Completed(output) => {
                    let ocr_text = output.ocr_text.clone();
                    persist_result(db, run, ResultType::OcrText, &output).await?;
                    search_index::ensure_asset_indexing(
                        db,
                        run.tenant_id,
                        run.asset_id,
                        None,
                        ocr_text.as_deref(),
                    )
                    .await?;
                    finalize_run(db, run, None).await?;
                    Ok(RunOutcome::Completed)
                }
                OcrOutcome::Canceled {
                    partial_text,
                    pages_done,
                    pages_total,
                } => {
                    let output = processors::ProcessorOutput {
                        data: serde_json::json!({ "text": partial_text, "pages_done": pages_done, "pages_total": pages_total }),
                        confidence: None,
                        ocr_text: Some(partial_text),
                    };
                    persist_result(db, run, ResultType::OcrTextPartial, &output).await?;
                    search_index::ensure_asset_indexing(
                        db,
                        run.tenant_id,
                        run.asset_id,
                        None,
                        output.ocr_text.as_deref(),
                    )
                    .await?;
                    Ok(RunOutcome::Canceled)
                }
            }
        }
        other => Err(ServiceError::BadRequest(format!("unknown processor: {other}"))),
    }
}

async fn persist_result<C: ConnectionTrait>(
    db: &C,
    run: &RunModel,
    r#type: ResultType,
    output: &processors::ProcessorOutput,
) -> Result<(), ServiceError> {
    let active = ResultActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(run.tenant_id),
        asset_id: Set(run.asset_id),
        run_id: Set(run.id),
        r#type: Set(r#type),
        confidence: Set(output.confidence),
        data: Set(output.data.clone()),
        ..Default::default()
    };
    results::insert(db, active).await?;
    Ok(())
}

/// Marks the run completed and records usage exactly once: usage is billed
/// here, on the transition to `completed`, never at admission time, so a
/// canceled or failed run is never charged.
async fn finalize_run<C: ConnectionTrait>(
    db: &C,
    run: &RunModel,
    signature: Option<String>,
) -> Result<(), ServiceError> {
    let mut run = run.clone();
    run.input_fingerprint_signature = signature.or(run.input_fingerprint_signature);
    let cost_cents = run.estimated_cost_cents as i64;
    let tenant_id = run.tenant_id;
    runs::mark_completed(db, run).await?;
    org_usage::increment(db, tenant_id, &current_period(), cost_cents).await?;
    Ok(())
}
