use chrono::Utc;
use entity::search_index::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, Statement,
};
use uuid::Uuid;

/// Upserts the `(tenant_id, asset_id)` row. `ocr_tsv` has no sea-orm mapping
/// and is refreshed by the `search_index_ocr_tsv_update` trigger whenever
/// `ocr_text_preview` changes, so it is never set here.
pub async fn upsert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<Model, DbErr> {
    Entity::insert(active)
        .on_conflict(
            OnConflict::columns([Column::TenantId, Column::AssetId])
                .update_columns([
                    Column::Sha256,
                    Column::Etag,
                    Column::ContentType,
                    Column::ContentLength,
                    Column::LastModified,
                    Column::OcrTextPreview,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_with_returning(db)
        .await
}

pub async fn find_by_asset<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::AssetId.eq(asset_id))
        .one(db)
        .await
}

pub async fn find_by_sha256<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    sha256: &str,
    exclude_asset_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Sha256.eq(sha256))
        .filter(Column::AssetId.ne(exclude_asset_id))
        .all(db)
        .await
}

pub async fn find_by_etag<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    etag: &str,
    exclude_asset_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Etag.eq(etag))
        .filter(Column::AssetId.ne(exclude_asset_id))
        .all(db)
        .await
}

/// Candidates within `[min_length, max_length]` sharing `content_type`; the
/// caller computes the bounds from the 3% relative tolerance.
pub async fn find_near_size<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    content_type: &str,
    min_length: i64,
    max_length: i64,
    exclude_asset_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::ContentType.eq(content_type))
        .filter(Column::ContentLength.gte(min_length))
        .filter(Column::ContentLength.lte(max_length))
        .filter(Column::AssetId.ne(exclude_asset_id))
        .all(db)
        .await
}

#[derive(Debug, FromQueryResult)]
pub struct SearchRow {
    pub asset_id: Uuid,
    pub rank: f64,
    pub snippet: Option<String>,
}

/// Full-text search over `ocr_text_preview` via the maintained `ocr_tsv`
/// column; there is no sea-orm query-builder support for `tsvector`, so this
/// goes through raw SQL the way migrations already do.
pub async fn search_ocr_text<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    query: &str,
    limit: u64,
) -> Result<Vec<SearchRow>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
            SELECT
                asset_id,
                ts_rank_cd(ocr_tsv, plainto_tsquery('english', $2)) AS rank,
                ts_headline('english', coalesce(ocr_text_preview, ''), plainto_tsquery('english', $2)) AS snippet
            FROM search_index
            WHERE tenant_id = $1
              AND ocr_tsv @@ plainto_tsquery('english', $2)
            ORDER BY rank DESC
            LIMIT $3
        "#,
        [tenant_id.into(), query.into(), (limit as i64).into()],
    );
    SearchRow::find_by_statement(stmt).all(db).await
}

pub fn touch_active_model(tenant_id: Uuid, asset_id: Uuid) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        asset_id: Set(asset_id),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
}
