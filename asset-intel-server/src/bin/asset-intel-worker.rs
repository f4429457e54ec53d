use asset_intel_server::{run_worker, Settings};
use blockscout_service_launcher::{database, launcher::ConfigSettings};
use migration::Migrator;

/// Standalone worker process: long-polls the queue and dispatches processor
/// runs, scaled independently from the HTTP server per the concurrency model.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = Settings::build().expect("failed to read config");
    blockscout_service_launcher::tracing::init_logs(
        "asset_intel_worker",
        &settings.tracing,
        &settings.jaeger,
    )?;

    let repo = database::ReadWriteRepo::new::<Migrator>(
        &settings.database,
        settings.replica_database.as_ref(),
    )
    .await?;
    let queue =
        asset_intel_logic::services::queue::QueueAdapter::connect_with_backoff(settings.redis.url.as_str())
            .await?;

    run_worker(settings, repo.main_db().clone(), queue).await
}
