//! Audit record written whenever an element, material or upload is deleted.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deletion_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    /// element, material, upload
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub reason: String,
    pub deleted_by: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub snapshot: Option<JsonValue>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
