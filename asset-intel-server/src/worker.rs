use asset_intel_logic::{
    clients::asset_fetcher::AssetFetcherClient,
    repository::runs,
    services::{dispatcher, queue::QueueAdapter, retry},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::settings::Settings;

const BLOCK_MS: usize = 5_000;
const BATCH_SIZE: usize = 16;
const TIMEOUT_ERROR_MESSAGE: &str = "job timed out";

/// Long-polls the run queue and dispatches deliveries concurrently, up to
/// `worker_concurrency` in flight at once. A delivery is acked once the
/// outcome is recorded: `dispatch` itself writes the retry/dead-letter state
/// for a handler failure, and a timeout (which cuts `dispatch` off before it
/// can do that) is recorded here instead. Either way the run's own status is
/// what a redelivery would act on next, so the stream entry is acked
/// regardless of outcome.
pub async fn run_worker(
    settings: Settings,
    db: DatabaseConnection,
    queue: QueueAdapter,
) -> Result<(), anyhow::Error> {
    let db = Arc::new(db);
    let asset_client = Arc::new(AssetFetcherClient::new(
        settings.service.asset_fetcher_url.to_string(),
    ));
    let consumer_name = format!("worker-{}", uuid::Uuid::new_v4());
    let semaphore = Arc::new(tokio::sync::Semaphore::new(settings.service.worker_concurrency));

    tracing::info!(consumer_name, "starting asset intelligence worker");

    loop {
        let jobs = queue.read_group(&consumer_name, BLOCK_MS, BATCH_SIZE).await?;
        for (entry_id, job) in jobs {
            let db = Arc::clone(&db);
            let asset_client = Arc::clone(&asset_client);
            let queue = queue.clone();
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let timeout = settings.service.job_timeout;

            tokio::spawn(async move {
                let _permit = permit;
                let result = tokio::time::timeout(
                    timeout,
                    dispatcher::dispatch(db.as_ref(), &queue, asset_client.as_ref(), &job),
                )
                .await;

                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => tracing::error!(err = ?err, run_id = %job.run_id, "run dispatch failed"),
                    Err(_) => {
                        tracing::error!(run_id = %job.run_id, "run dispatch timed out");
                        record_timeout(db.as_ref(), &queue, job.tenant_id, job.run_id).await;
                    }
                }

                if let Err(err) = queue.ack(&entry_id).await {
                    tracing::error!(err = ?err, entry_id, "failed to ack queue entry");
                }
            });
        }
    }
}

/// A job timeout cuts `dispatch`'s future off before it can write any
/// failure state, so the run is otherwise left `running` forever. Fetches
/// the run fresh and routes it through the same retry/dead-letter path a
/// handler error would take.
async fn record_timeout(
    db: &DatabaseConnection,
    queue: &QueueAdapter,
    tenant_id: uuid::Uuid,
    run_id: uuid::Uuid,
) {
    let run = match runs::find_by_id(db, tenant_id, run_id).await {
        Ok(Some(run)) => run,
        Ok(None) => return,
        Err(err) => {
            tracing::error!(err = ?err, run_id = %run_id, "failed to load timed-out run");
            return;
        }
    };
    let processor_name = run.processor_name.clone();
    if let Err(err) = retry::record_failure(db, queue, run, &processor_name, TIMEOUT_ERROR_MESSAGE).await {
        tracing::error!(err = ?err, run_id = %run_id, "failed to record timeout failure");
    }
}
