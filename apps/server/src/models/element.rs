//! Element and material layer models.
//!
//! Includes the parsed element shape produced by the IFC parsing service and
//! by the client-side WASM parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::{element, element_material};
use crate::models::Indicators;

/// Element as produced by the IFC parser.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParsedElement {
    #[serde(rename = "globalId")]
    pub global_id: String,
    #[serde(rename = "type")]
    pub ifc_type: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Element volume in m³. Missing or zero means "sum of the layers".
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub materials: Vec<ParsedMaterialLayer>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParsedMaterialLayer {
    pub name: String,
    #[serde(default)]
    pub volume: f64,
}

impl ParsedElement {
    /// Volume to persist for the element.
    pub fn effective_volume(&self) -> f64 {
        match self.volume {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => self
                .materials
                .iter()
                .map(|m| m.volume)
                .filter(|v| v.is_finite() && *v > 0.0)
                .sum(),
        }
    }
}

/// Parsing service response body.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParsedModel {
    pub elements: Vec<ParsedElement>,
}

/// Share of `layer_volume` in `element_volume`, 0 for an empty element.
pub fn layer_fraction(layer_volume: f64, element_volume: f64) -> f64 {
    if element_volume > 0.0 && layer_volume.is_finite() {
        layer_volume / element_volume
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LayerResponse {
    pub position: i32,
    pub material_id: Uuid,
    pub material_name: String,
    pub volume: f64,
    pub fraction: f64,
}

impl LayerResponse {
    pub fn new(layer: element_material::Model, material_name: String) -> Self {
        Self {
            position: layer.position,
            material_id: layer.material_id,
            material_name,
            volume: layer.volume,
            fraction: layer.fraction,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ElementResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub upload_id: Option<Uuid>,
    pub global_id: String,
    pub ifc_type: String,
    pub name: Option<String>,
    pub volume: f64,
    pub archived: bool,
    pub indicators: Indicators,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<element::Model> for ElementResponse {
    fn from(m: element::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            upload_id: m.upload_id,
            global_id: m.global_id,
            ifc_type: m.ifc_type,
            name: m.name,
            volume: m.volume,
            archived: m.archived,
            indicators: Indicators::new(m.gwp, m.ubp, m.penre),
            layers: None,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl ElementResponse {
    pub fn with_layers(mut self, layers: Vec<LayerResponse>) -> Self {
        self.layers = Some(layers);
        self
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListElementsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Filter by IFC class, e.g. IfcWall
    pub ifc_type: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ElementListResponse {
    pub elements: Vec<ElementResponse>,
    pub pagination: crate::models::Pagination,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ArchiveRequest {
    pub archived: bool,
}
