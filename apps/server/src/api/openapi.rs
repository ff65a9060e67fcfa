//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::config::{ADMIN_KEY_HEADER, API_KEY_HEADER};
use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "IFC LCA Server",
        version = "0.1.0",
        description = "Life-cycle assessment of building materials extracted from IFC models, matched against the KBOB, EC3 and OpenEPD catalogs"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        api::health::health,
        api::health::ready,
        // Projects
        api::projects::create_project,
        api::projects::list_projects,
        api::projects::get_project,
        api::projects::update_project,
        api::projects::delete_project,
        api::projects::recalculate_project,
        api::projects::get_emissions,
        api::projects::list_deletions,
        // Materials
        api::materials::list_materials,
        api::materials::get_material,
        api::materials::delete_material,
        api::materials::match_material,
        api::materials::remove_match,
        api::materials::bulk_match,
        api::materials::individual_match,
        api::materials::auto_match,
        // Elements
        api::elements::list_elements,
        api::elements::get_element,
        api::elements::delete_element,
        api::elements::set_archived,
        // Uploads
        api::uploads::upload_ifc,
        api::uploads::upload_parsed,
        api::uploads::list_uploads,
        api::uploads::get_upload,
        api::uploads::delete_upload,
        // Catalog
        api::catalog::list_catalog,
        api::catalog::get_catalog_entry,
        // Auth
        services::auth_admin::create_api_key,
        services::auth_admin::list_api_keys,
        services::auth_admin::revoke_api_key,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            models::Indicators,
            models::Pagination,
            // Projects
            models::CreateProjectRequest,
            models::UpdateProjectRequest,
            models::ProjectResponse,
            models::ProjectListResponse,
            models::MaterialEmission,
            models::EmissionsResponse,
            models::RecalculateResponse,
            // Materials
            models::MaterialResponse,
            models::MaterialListResponse,
            models::MatchMaterialRequest,
            models::BulkMatchRequest,
            models::MaterialMatch,
            models::IndividualMatchRequest,
            models::AutoMatchRequest,
            models::MatchResultResponse,
            models::AutoMatchProposal,
            models::AutoMatchResponse,
            // Elements
            models::ParsedElement,
            models::ParsedMaterialLayer,
            models::LayerResponse,
            models::ElementResponse,
            models::ElementListResponse,
            models::ArchiveRequest,
            // Uploads
            models::UploadStatus,
            models::ParsedUploadRequest,
            models::UploadResponse,
            models::UploadListResponse,
            // Deletions
            models::DeletedEntity,
            models::DeleteRequest,
            models::DeleteResponse,
            models::DeletionRecordResponse,
            models::DeletionListResponse,
            // Catalog
            models::CatalogSource,
            models::CatalogEntryResponse,
            models::CatalogListResponse,
            // Auth
            models::ApiKeyRole,
            models::ApiKeyCreateResponse,
            models::ApiKeyListItem,
            models::CreateApiKeyRequest,
            services::auth_admin::ListApiKeysResponse,
            services::auth_admin::RevokeApiKeyResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Projects", description = "Projects and their emission totals"),
        (name = "Materials", description = "Project materials and catalog matching"),
        (name = "Elements", description = "Building elements and their layers"),
        (name = "Uploads", description = "IFC model uploads"),
        (name = "Catalog", description = "KBOB, EC3 and OpenEPD reference data"),
        (name = "Auth", description = "API key management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `X-API-Key` and `X-Admin-Key` header schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
            components.add_security_scheme(
                "admin_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_KEY_HEADER))),
            );
        }
    }
}
