//! Deletion audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::deletion_record;

/// Kind of entity a deletion record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeletedEntity {
    Element,
    Material,
    Upload,
}

impl DeletedEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Material => "material",
            Self::Upload => "upload",
        }
    }
}

/// Body of every audited DELETE request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

impl DeleteRequest {
    pub fn reason_or_default(&self) -> String {
        match self.reason.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => "No reason given".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletionRecordResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub reason: String,
    pub deleted_by: String,
    #[schema(value_type = Option<Object>)]
    pub snapshot: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl From<deletion_record::Model> for DeletionRecordResponse {
    fn from(m: deletion_record::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            entity_type: m.entity_type,
            entity_id: m.entity_id,
            entity_name: m.entity_name,
            reason: m.reason,
            deleted_by: m.deleted_by,
            snapshot: m.snapshot,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletionListResponse {
    pub deletions: Vec<DeletionRecordResponse>,
}

/// Summary returned by audited deletes.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: Uuid,
    pub deletion_record_id: Uuid,
    pub elements_recomputed: u64,
}
