//! Migration: Create catalog_entries table.
//!
//! KBOB, EC3 and OpenEPD reference data. Coefficients are per kg.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE catalog_entries (
                    id UUID PRIMARY KEY,
                    source VARCHAR(20) NOT NULL
                        CHECK (source IN ('kbob', 'ec3', 'openepd')),
                    external_id VARCHAR(255) NOT NULL,
                    name TEXT NOT NULL,
                    name_normalized TEXT NOT NULL,
                    category TEXT,

                    gwp DOUBLE PRECISION,
                    ubp DOUBLE PRECISION,
                    penre DOUBLE PRECISION,

                    density DOUBLE PRECISION,
                    density_min DOUBLE PRECISION,
                    density_max DOUBLE PRECISION,
                    declared_unit VARCHAR(50),

                    -- Imported record as received
                    raw JSONB,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    UNIQUE (source, external_id)
                );

                CREATE INDEX idx_catalog_entries_name_normalized
                    ON catalog_entries(name_normalized);

                CREATE TRIGGER update_catalog_entries_updated_at
                    BEFORE UPDATE ON catalog_entries
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS catalog_entries CASCADE;")
            .await?;

        Ok(())
    }
}
