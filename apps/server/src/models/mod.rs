//! Domain models for the LCA server.

use utoipa::ToSchema;

pub mod api_key;
pub mod catalog;
pub mod deletion;
pub mod element;
pub mod indicators;
pub mod material;
pub mod project;
pub mod upload;

pub use api_key::{
    ApiKey, ApiKeyCreateResponse, ApiKeyListItem, ApiKeyRole, AuthenticatedCaller,
    CreateApiKeyRequest,
};
pub use catalog::{
    CatalogData, CatalogEntry, CatalogEntryResponse, CatalogImportRecord, CatalogListResponse,
    CatalogSource, Ec3Entry, ImpactSource, KbobEntry, ListCatalogQuery, OpenEpdEntry,
};
pub use deletion::{
    DeleteRequest, DeleteResponse, DeletedEntity, DeletionListResponse, DeletionRecordResponse,
};
pub use element::{
    ArchiveRequest, ElementListResponse, ElementResponse, LayerResponse, ListElementsQuery,
    ParsedElement, ParsedMaterialLayer, ParsedModel, layer_fraction,
};
pub use indicators::{Coefficients, Indicators};
pub use material::{
    AutoMatchProposal, AutoMatchRequest, AutoMatchResponse, BulkMatchRequest,
    IndividualMatchRequest, ListMaterialsQuery, MatchMaterialRequest, MatchResultResponse,
    MaterialListResponse, MaterialMatch, MaterialResponse,
};
pub use project::{
    CreateProjectRequest, EmissionsResponse, MaterialEmission, ProjectListResponse,
    ProjectResponse, RecalculateResponse, UpdateProjectRequest,
};
pub use upload::{ParsedUploadRequest, UploadListResponse, UploadResponse, UploadStatus};

/// Pagination parameters.
#[derive(Debug, Clone, Default, serde::Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

impl PaginationParams {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.clamped_limit()
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(default_limit()).clamp(1, 500)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
