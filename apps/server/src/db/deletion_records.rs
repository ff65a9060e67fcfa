//! Database queries for the deletion audit trail.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::deletion_record::{self, ActiveModel, Entity as DeletionRecord};
use crate::error::{AppError, AppResult};
use crate::models::DeletedEntity;

use super::DbPool;

/// Audit data for one deleted row.
#[derive(Debug, Clone)]
pub struct NewDeletionRecord {
    pub project_id: Uuid,
    pub entity_type: DeletedEntity,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub reason: String,
    pub deleted_by: String,
    pub snapshot: Option<JsonValue>,
}

pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    record: NewDeletionRecord,
) -> AppResult<deletion_record::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        project_id: Set(record.project_id),
        entity_type: Set(record.entity_type.as_str().to_string()),
        entity_id: Set(record.entity_id),
        entity_name: Set(record.entity_name),
        reason: Set(record.reason),
        deleted_by: Set(record.deleted_by),
        snapshot: Set(record.snapshot),
        created_at: Set(Utc::now()),
    };

    model
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert deletion record: {}", e)))
}

impl DbPool {
    /// Deletion records of a project, newest first.
    pub async fn list_deletions(&self, project_id: Uuid) -> AppResult<Vec<deletion_record::Model>> {
        let records = DeletionRecord::find()
            .filter(deletion_record::Column::ProjectId.eq(project_id))
            .order_by_desc(deletion_record::Column::Id) // UUIDv7 is time-ordered
            .all(self.connection())
            .await?;

        Ok(records)
    }
}
