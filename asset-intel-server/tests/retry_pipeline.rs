#![allow(dead_code)]
mod helpers;

use asset_intel_logic::services::{queue::QueueAdapter, retry};
use blockscout_service_launcher::database;
use entity::sea_orm_active_enums::RunStatus;
use migration::Migrator;
use pretty_assertions::assert_eq;
use sea_orm::{ActiveValue::Set, EntityTrait};
use uuid::Uuid;

const TEST_REDIS_URL: &str = "redis://localhost:6379";

async fn insert_running_run(
    db: &sea_orm::DatabaseConnection,
    tenant_id: Uuid,
    asset_id: Uuid,
    retry_count: i32,
) -> entity::runs::Model {
    let run = entity::runs::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        asset_id: Set(asset_id),
        processor_name: Set("asset-fingerprint".to_string()),
        processor_version: Set("1".to_string()),
        status: Set(RunStatus::Running),
        estimated_cost_cents: Set(0),
        retry_count: Set(retry_count),
        ..Default::default()
    };
    entity::runs::Entity::insert(run)
        .exec_with_returning(db)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Needs database and redis to run"]
async fn transient_failure_re_enqueues_instead_of_dropping() {
    let db = database!(Migrator);
    let client = db.client();
    let queue = QueueAdapter::connect_with_backoff(TEST_REDIS_URL)
        .await
        .expect("redis must be reachable for this test");

    let tenant_id = Uuid::new_v4();
    let asset_id = Uuid::new_v4();
    let run = insert_running_run(client.as_ref(), tenant_id, asset_id, 0).await;

    let run = retry::record_failure(client.as_ref(), &queue, run, "asset-fingerprint", "connection reset")
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.retry_count, 1);

    let consumer = format!("test-consumer-{}", Uuid::new_v4());
    let jobs = queue.read_group(&consumer, 2_000, 8).await.unwrap();
    assert!(
        jobs.iter().any(|(_, job)| job.run_id == run.id),
        "re-enqueued run should be claimable from the stream"
    );
    for (entry_id, _) in jobs {
        queue.ack(&entry_id).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "Needs database and redis to run"]
async fn exhausted_retries_dead_letter_without_re_enqueuing() {
    let db = database!(Migrator);
    let client = db.client();
    let queue = QueueAdapter::connect_with_backoff(TEST_REDIS_URL)
        .await
        .expect("redis must be reachable for this test");

    let tenant_id = Uuid::new_v4();
    let asset_id = Uuid::new_v4();
    let run = insert_running_run(client.as_ref(), tenant_id, asset_id, 2).await;

    let run = retry::record_failure(client.as_ref(), &queue, run, "asset-fingerprint", "permanent failure")
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(
        run.error_message.as_deref(),
        Some("Dead-lettered after repeated failures: permanent failure")
    );
}
