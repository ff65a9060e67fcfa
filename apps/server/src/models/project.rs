//! Project API models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::project;
use crate::models::{Indicators, Pagination};

/// Request to create a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a project. Absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Project with its aggregated indicators.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
    pub indicators: Indicators,
    pub last_calculated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            owner: m.owner,
            indicators: Indicators::new(m.gwp, m.ubp, m.penre),
            last_calculated: m.last_calculated,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Paginated project list.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub pagination: Pagination,
}

/// Indicator contribution of one material across the project.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaterialEmission {
    pub material_id: Uuid,
    pub name: String,
    pub catalog_entry_id: Option<Uuid>,
    /// Total layer volume in m³
    pub volume: f64,
    /// Total mass in kg, 0 when the material has no usable density
    pub mass: f64,
    pub indicators: Indicators,
}

/// Project totals with the per-material breakdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmissionsResponse {
    pub project_id: Uuid,
    pub totals: Indicators,
    pub last_calculated: Option<DateTime<Utc>>,
    pub element_count: u64,
    pub materials: Vec<MaterialEmission>,
}

/// Result of a full project recalculation.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecalculateResponse {
    pub project_id: Uuid,
    pub elements_recomputed: u64,
    pub totals: Indicators,
}
