//! Migration: Create deletion_records table.
//!
//! Audit trail of deleted elements, materials and uploads. Records outlive
//! the deleted rows, so there are no foreign keys.

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
                CREATE TABLE deletion_records (
                    id UUID PRIMARY KEY,
                    project_id UUID NOT NULL,
                    entity_type VARCHAR(20) NOT NULL
                        CHECK (entity_type IN ('element', 'material', 'upload')),
                    entity_id UUID NOT NULL,
                    entity_name TEXT,
                    reason TEXT NOT NULL,
                    deleted_by VARCHAR(100) NOT NULL,
                    snapshot JSONB,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_deletion_records_project_id
                    ON deletion_records(project_id, created_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS deletion_records CASCADE;")
            .await?;

        Ok(())
    }
}
