//! Upload domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::upload;
use crate::models::ParsedElement;

/// Upload processing status.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Elements are being persisted and matched.
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Completed) | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upload of an already parsed model.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ParsedUploadRequest {
    pub filename: String,
    pub elements: Vec<ParsedElement>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub status: UploadStatus,
    pub element_count: i32,
    pub material_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<upload::Model> for UploadResponse {
    fn from(m: upload::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            filename: m.filename,
            // Only written through UploadStatus::as_str
            status: UploadStatus::parse(&m.status).unwrap_or(UploadStatus::Failed),
            element_count: m.element_count,
            material_count: m.material_count,
            error_message: m.error_message,
            created_at: m.created_at,
            updated_at: m.updated_at,
            completed_at: m.completed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadListResponse {
    pub uploads: Vec<UploadResponse>,
}
