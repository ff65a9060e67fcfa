//! Migration: Create materials table.
//!
//! Materials are unique per project by name and hold the current catalog match.

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
                CREATE TABLE materials (
                    id UUID PRIMARY KEY,
                    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,

                    catalog_entry_id UUID REFERENCES catalog_entries(id) ON DELETE SET NULL,
                    density DOUBLE PRECISION,
                    auto_matched BOOLEAN NOT NULL DEFAULT FALSE,
                    match_score DOUBLE PRECISION
                        CHECK (match_score IS NULL OR (match_score >= 0 AND match_score <= 1)),
                    matched_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    UNIQUE (project_id, name)
                );

                -- Unmatched materials lookup
                CREATE INDEX idx_materials_unmatched ON materials(project_id)
                    WHERE catalog_entry_id IS NULL;

                CREATE INDEX idx_materials_catalog_entry_id ON materials(catalog_entry_id);

                CREATE TRIGGER update_materials_updated_at
                    BEFORE UPDATE ON materials
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
            .execute_unprepared("DROP TABLE IF EXISTS materials CASCADE;")
            .await?;

        Ok(())
    }
}
