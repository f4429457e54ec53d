use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TYPE run_status AS ENUM ('pending', 'running', 'completed', 'failed', 'canceled');
            CREATE TYPE result_type AS ENUM ('fingerprint', 'image_metadata', 'ocr_text', 'ocr_text_partial');

            CREATE TABLE tenants (
                id uuid NOT NULL,
                name text NOT NULL,
                plan text NOT NULL DEFAULT 'free',
                stripe_customer_id text,
                last_applied_stripe_event_created bigint,
                created_at timestamptz NOT NULL DEFAULT now(),
                PRIMARY KEY (id)
            );
            CREATE UNIQUE INDEX tenants_name_index ON tenants (name);

            CREATE TABLE runs (
                id uuid NOT NULL,
                tenant_id uuid NOT NULL,
                asset_id uuid NOT NULL,
                processor_name text NOT NULL,
                processor_version text NOT NULL,
                status run_status NOT NULL DEFAULT 'pending',
                error_message text,
                created_at timestamptz NOT NULL DEFAULT now(),
                completed_at timestamptz,
                cancel_requested boolean NOT NULL DEFAULT false,
                canceled_at timestamptz,
                input_fingerprint_signature text,
                progress_current integer NOT NULL DEFAULT 0,
                progress_total integer,
                progress_message text,
                estimated_cost_cents integer NOT NULL DEFAULT 0,
                retry_count integer NOT NULL DEFAULT 0,
                last_retry_at timestamptz,
                PRIMARY KEY (id)
            );
            CREATE INDEX runs_tenant_asset_index ON runs (tenant_id, asset_id);
            CREATE INDEX runs_tenant_status_index ON runs (tenant_id, status);
            CREATE INDEX runs_tenant_asset_processor_created_index
                ON runs (tenant_id, asset_id, processor_name, created_at DESC);

            CREATE TABLE results (
                id uuid NOT NULL,
                tenant_id uuid NOT NULL,
                asset_id uuid NOT NULL,
                run_id uuid NOT NULL REFERENCES runs (id) ON DELETE CASCADE,
                type result_type NOT NULL,
                confidence double precision,
                data jsonb NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now(),
                PRIMARY KEY (id)
            );
            CREATE INDEX results_tenant_asset_type_index ON results (tenant_id, asset_id, type);
            CREATE INDEX results_run_id_index ON results (run_id);

            CREATE TABLE deadletter_events (
                id uuid NOT NULL,
                tenant_id uuid NOT NULL,
                run_id uuid NOT NULL REFERENCES runs (id) ON DELETE CASCADE,
                asset_id uuid NOT NULL,
                processor_name text NOT NULL,
                processor_version text NOT NULL,
                task_name text NOT NULL,
                job_try integer NOT NULL,
                error_summary text NOT NULL,
                error_raw text NOT NULL,
                failed_at timestamptz NOT NULL DEFAULT now(),
                requeued_at timestamptz,
                PRIMARY KEY (id)
            );
            CREATE INDEX deadletter_events_tenant_index ON deadletter_events (tenant_id, failed_at DESC);
            CREATE INDEX deadletter_events_run_id_index ON deadletter_events (run_id);

            CREATE TABLE search_index (
                id uuid NOT NULL,
                tenant_id uuid NOT NULL,
                asset_id uuid NOT NULL,
                sha256 text,
                etag text,
                content_type text,
                content_length bigint,
                last_modified text,
                ocr_text_preview text,
                ocr_tsv tsvector,
                updated_at timestamptz NOT NULL DEFAULT now(),
                PRIMARY KEY (id)
            );
            CREATE UNIQUE INDEX search_index_tenant_asset_index ON search_index (tenant_id, asset_id);
            CREATE INDEX search_index_tenant_sha256_index ON search_index (tenant_id, sha256);
            CREATE INDEX search_index_tenant_etag_index ON search_index (tenant_id, etag);
            CREATE INDEX search_index_ocr_tsv_index ON search_index USING GIN (ocr_tsv);

            CREATE OR REPLACE FUNCTION search_index_ocr_tsv_trigger() RETURNS trigger AS $$
            begin
                new.ocr_tsv := to_tsvector('english', coalesce(new.ocr_text_preview, ''));
                return new;
            end
            $$ LANGUAGE plpgsql;

            CREATE TRIGGER search_index_ocr_tsv_update
                BEFORE INSERT OR UPDATE OF ocr_text_preview ON search_index
                FOR EACH ROW EXECUTE FUNCTION search_index_ocr_tsv_trigger();

            CREATE TABLE org_usage (
                tenant_id uuid NOT NULL,
                period text NOT NULL,
                intelligence_runs bigint NOT NULL DEFAULT 0,
                estimated_cost_cents bigint NOT NULL DEFAULT 0,
                PRIMARY KEY (tenant_id, period)
            );

            CREATE TABLE stripe_events (
                id uuid NOT NULL,
                tenant_id uuid NOT NULL,
                stripe_event_id text NOT NULL,
                event_type text NOT NULL,
                stripe_event_created bigint NOT NULL,
                applied_at timestamptz NOT NULL DEFAULT now(),
                PRIMARY KEY (id)
            );
            CREATE UNIQUE INDEX stripe_events_stripe_event_id_index ON stripe_events (stripe_event_id);
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE IF EXISTS stripe_events;
            DROP TABLE IF EXISTS org_usage;
            DROP TABLE IF EXISTS search_index;
            DROP TABLE IF EXISTS deadletter_events;
            DROP TABLE IF EXISTS results;
            DROP TABLE IF EXISTS runs;
            DROP TABLE IF EXISTS tenants;
            DROP TYPE IF EXISTS result_type;
            DROP TYPE IF EXISTS run_status;
        "#;
        crate::from_sql(manager, sql).await
    }
}
