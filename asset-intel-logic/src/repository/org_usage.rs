use entity::org_usage::{Column, Entity, Model};
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, Statement};
use uuid::Uuid;

pub async fn find<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    period: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Period.eq(period))
        .one(db)
        .await
}

/// Atomically bumps the run count and accumulated cost for `period`, in a
/// single upsert rather than a read-then-write so concurrent dispatchers
/// can't clobber each other's increments.
pub async fn increment<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    period: &str,
    cost_cents: i64,
) -> Result<(), DbErr> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
            INSERT INTO org_usage (tenant_id, period, intelligence_runs, estimated_cost_cents)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (tenant_id, period) DO UPDATE SET
                intelligence_runs = org_usage.intelligence_runs + 1,
                estimated_cost_cents = org_usage.estimated_cost_cents + excluded.estimated_cost_cents
        "#,
        [tenant_id.into(), period.into(), cost_cents.into()],
    );
    db.execute(stmt).await?;
    Ok(())
}
