#![allow(dead_code)]
mod helpers;

use asset_intel_logic::services::cancellation;
use blockscout_service_launcher::database;
use entity::sea_orm_active_enums::RunStatus;
use migration::Migrator;
use pretty_assertions::assert_eq;
use sea_orm::{ActiveValue::Set, EntityTrait};
use uuid::Uuid;

async fn insert_run(
    db: &sea_orm::DatabaseConnection,
    tenant_id: Uuid,
    asset_id: Uuid,
    processor_name: &str,
) -> entity::runs::Model {
    let run = entity::runs::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        asset_id: Set(asset_id),
        processor_name: Set(processor_name.to_string()),
        processor_version: Set("1".to_string()),
        status: Set(RunStatus::Running),
        estimated_cost_cents: Set(0),
        ..Default::default()
    };
    entity::runs::Entity::insert(run)
        .exec_with_returning(db)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Needs database to run"]
async fn cascade_true_cancels_dependent_ocr_run() {
    let db = database!(Migrator);
    let client = db.client();

    let tenant_id = Uuid::new_v4();
    let asset_id = Uuid::new_v4();
    let fingerprint_run = insert_run(client.as_ref(), tenant_id, asset_id, "asset-fingerprint").await;
    let ocr_run = insert_run(client.as_ref(), tenant_id, asset_id, "ocr-text").await;

    cancellation::request_cancel_run(client.as_ref(), tenant_id, fingerprint_run.id, true)
        .await
        .unwrap();

    let ocr_run = entity::runs::Entity::find_by_id(ocr_run.id)
        .one(client.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(ocr_run.cancel_requested, "dependent run should be cancel-requested when cascade=true");
}

#[tokio::test]
#[ignore = "Needs database to run"]
async fn cascade_false_leaves_dependent_ocr_run_untouched() {
    let db = database!(Migrator);
    let client = db.client();

    let tenant_id = Uuid::new_v4();
    let asset_id = Uuid::new_v4();
    let fingerprint_run = insert_run(client.as_ref(), tenant_id, asset_id, "asset-fingerprint").await;
    let ocr_run = insert_run(client.as_ref(), tenant_id, asset_id, "ocr-text").await;

    cancellation::request_cancel_run(client.as_ref(), tenant_id, fingerprint_run.id, false)
        .await
        .unwrap();

    let ocr_run = entity::runs::Entity::find_by_id(ocr_run.id)
        .one(client.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!ocr_run.cancel_requested, "dependent run should stay untouched when cascade=false");
}

#[tokio::test]
#[ignore = "Needs database to run"]
async fn non_cascading_processor_never_cancels_siblings() {
    let db = database!(Migrator);
    let client = db.client();

    let tenant_id = Uuid::new_v4();
    let asset_id = Uuid::new_v4();
    let ocr_run = insert_run(client.as_ref(), tenant_id, asset_id, "ocr-text").await;
    let fingerprint_run = insert_run(client.as_ref(), tenant_id, asset_id, "asset-fingerprint").await;

    cancellation::request_cancel_run(client.as_ref(), tenant_id, ocr_run.id, true)
        .await
        .unwrap();

    let fingerprint_run = entity::runs::Entity::find_by_id(fingerprint_run.id)
        .one(client.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fingerprint_run.status, RunStatus::Running);
    assert!(!fingerprint_run.cancel_requested, "ocr-text has no cascade targets");
}
