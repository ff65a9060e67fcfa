//! Migration: Create element_materials table.
//!
//! Material layers of an element, ordered by position.

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
                CREATE TABLE element_materials (
                    id UUID PRIMARY KEY,
                    element_id UUID NOT NULL REFERENCES elements(id) ON DELETE CASCADE,
                    material_id UUID NOT NULL REFERENCES materials(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    volume DOUBLE PRECISION NOT NULL DEFAULT 0,
                    fraction DOUBLE PRECISION NOT NULL DEFAULT 0,

                    UNIQUE (element_id, position)
                );

                -- Fan-out from a material to its elements
                CREATE INDEX idx_element_materials_material_id
                    ON element_materials(material_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS element_materials CASCADE;")
            .await?;

        Ok(())
    }
}
