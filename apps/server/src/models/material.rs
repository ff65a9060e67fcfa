//! Material and matching API models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::material;

/// Project material with its current catalog match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaterialResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub catalog_entry_id: Option<Uuid>,
    pub density: Option<f64>,
    pub auto_matched: bool,
    pub match_score: Option<f64>,
    pub matched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<material::Model> for MaterialResponse {
    fn from(m: material::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            name: m.name,
            catalog_entry_id: m.catalog_entry_id,
            density: m.density,
            auto_matched: m.auto_matched,
            match_score: m.match_score,
            matched_at: m.matched_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMaterialsQuery {
    /// Only materials without a catalog match
    #[serde(default)]
    pub unmatched: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaterialListResponse {
    pub materials: Vec<MaterialResponse>,
    pub total: usize,
}

/// Manual match of a single material.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MatchMaterialRequest {
    pub catalog_entry_id: Uuid,
    /// Density override in kg/m³
    #[serde(default)]
    pub density: Option<f64>,
}

/// Match several materials to the same catalog entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkMatchRequest {
    pub material_ids: Vec<Uuid>,
    pub catalog_entry_id: Uuid,
    #[serde(default)]
    pub density: Option<f64>,
}

/// One pair of a bulk individual match.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MaterialMatch {
    pub material_id: Uuid,
    pub catalog_entry_id: Uuid,
    #[serde(default)]
    pub density: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IndividualMatchRequest {
    pub matches: Vec<MaterialMatch>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AutoMatchRequest {
    /// Minimum similarity in [0, 1]. Defaults to the server setting.
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Outcome of a match mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MatchResultResponse {
    pub materials_updated: u64,
    pub elements_recomputed: u64,
}

/// A proposed or applied automatic match.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AutoMatchProposal {
    pub material_name: String,
    pub catalog_entry_id: Uuid,
    pub catalog_name: String,
    pub score: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AutoMatchResponse {
    pub threshold: f64,
    pub matched: Vec<AutoMatchProposal>,
    /// Names of materials that stayed unmatched
    pub unmatched: Vec<String>,
    pub elements_recomputed: u64,
}
