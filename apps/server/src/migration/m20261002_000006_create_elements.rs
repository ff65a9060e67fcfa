//! Migration: Create elements table.

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
                CREATE TABLE elements (
                    id UUID PRIMARY KEY,
                    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    -- Kept when the upload row is deleted separately
                    upload_id UUID REFERENCES uploads(id) ON DELETE SET NULL,
                    global_id VARCHAR(64) NOT NULL,
                    ifc_type VARCHAR(100) NOT NULL,
                    name TEXT,
                    volume DOUBLE PRECISION NOT NULL DEFAULT 0,
                    archived BOOLEAN NOT NULL DEFAULT FALSE,

                    gwp DOUBLE PRECISION NOT NULL DEFAULT 0,
                    ubp DOUBLE PRECISION NOT NULL DEFAULT 0,
                    penre DOUBLE PRECISION NOT NULL DEFAULT 0,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Aggregation over active elements
                CREATE INDEX idx_elements_project_active ON elements(project_id)
                    WHERE archived = FALSE;

                CREATE INDEX idx_elements_upload_id ON elements(upload_id);
                CREATE INDEX idx_elements_ifc_type ON elements(project_id, ifc_type);

                CREATE TRIGGER update_elements_updated_at
                    BEFORE UPDATE ON elements
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
            .execute_unprepared("DROP TABLE IF EXISTS elements CASCADE;")
            .await?;

        Ok(())
    }
}
