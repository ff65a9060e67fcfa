//! Material and matching API handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::api::optional_json;
use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, materials};
use crate::error::{AppError, AppResult};
use crate::models::{
    AutoMatchRequest, AutoMatchResponse, BulkMatchRequest, DeleteRequest, DeleteResponse,
    IndividualMatchRequest, ListMaterialsQuery, MatchMaterialRequest, MatchResultResponse,
    MaterialListResponse, MaterialResponse,
};
use crate::services::UploadProcessor;
use crate::services::projects::{load_owned_project, load_writable_project};
use crate::services::{deletion, matching};

#[utoipa::path(
    get,
    path = "/projects/{project_id}/materials",
    tag = "Materials",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ListMaterialsQuery
    ),
    responses(
        (status = 200, description = "Project materials ordered by name", body = MaterialListResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_materials(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<ListMaterialsQuery>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    let rows = materials::list_materials(pool.connection(), project.id, query.unmatched).await?;

    let materials: Vec<MaterialResponse> = rows.into_iter().map(MaterialResponse::from).collect();
    Ok(HttpResponse::Ok().json(MaterialListResponse {
        total: materials.len(),
        materials,
    }))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/materials/{material_id}",
    tag = "Materials",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("material_id" = Uuid, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Material", body = MaterialResponse),
        (status = 404, description = "Project or material not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_material(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (project_id, material_id) = path.into_inner();
    let project = load_owned_project(&pool, &auth.caller, project_id).await?;

    let material = materials::get_material(pool.connection(), project.id, material_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Material {}", material_id)))?;

    Ok(HttpResponse::Ok().json(MaterialResponse::from(material)))
}

/// Delete a material and its layers. The body may carry a reason.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/materials/{material_id}",
    tag = "Materials",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("material_id" = Uuid, Path, description = "Material ID")
    ),
    request_body(content = DeleteRequest, description = "Optional deletion reason"),
    responses(
        (status = 200, description = "Material deleted", body = DeleteResponse),
        (status = 404, description = "Project or material not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn delete_material(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (project_id, material_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;
    let reason = optional_json::<DeleteRequest>(&body)?.reason_or_default();

    let response = deletion::delete_material(
        pool.connection(),
        project.id,
        material_id,
        reason,
        &auth.caller.name,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Manually match one material.
#[utoipa::path(
    put,
    path = "/projects/{project_id}/materials/{material_id}/match",
    tag = "Materials",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("material_id" = Uuid, Path, description = "Material ID")
    ),
    request_body = MatchMaterialRequest,
    responses(
        (status = 200, description = "Material matched", body = MatchResultResponse),
        (status = 404, description = "Project, material or catalog entry not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn match_material(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<MatchMaterialRequest>,
) -> AppResult<HttpResponse> {
    let (project_id, material_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;

    let result = matching::apply_match(
        pool.connection(),
        project.id,
        &[material_id],
        body.catalog_entry_id,
        body.density,
    )
    .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Remove the catalog match of a material.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/materials/{material_id}/match",
    tag = "Materials",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("material_id" = Uuid, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Match removed", body = MatchResultResponse),
        (status = 404, description = "Project or material not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn remove_match(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (project_id, material_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;

    let result = matching::remove_match(pool.connection(), project.id, material_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Match several materials to the same catalog entry.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/materials/match",
    tag = "Materials",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body = BulkMatchRequest,
    responses(
        (status = 200, description = "Materials matched", body = MatchResultResponse),
        (status = 400, description = "Empty material list", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown material or catalog entry", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn bulk_match(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<BulkMatchRequest>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;

    let result = matching::apply_match(
        pool.connection(),
        project.id,
        &body.material_ids,
        body.catalog_entry_id,
        body.density,
    )
    .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Match each material to its own catalog entry.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/materials/match/individual",
    tag = "Materials",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body = IndividualMatchRequest,
    responses(
        (status = 200, description = "Materials matched", body = MatchResultResponse),
        (status = 400, description = "Empty match list", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown material or catalog entry", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn individual_match(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<IndividualMatchRequest>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;

    let result =
        matching::apply_individual_matches(pool.connection(), project.id, &body.matches).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Match every unmatched material by name similarity.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/materials/auto-match",
    tag = "Materials",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body(content = AutoMatchRequest, description = "Optional threshold override"),
    responses(
        (status = 200, description = "Automatic matching result", body = AutoMatchResponse),
        (status = 400, description = "Threshold outside [0, 1]", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn auto_match(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    processor: web::Data<UploadProcessor>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;
    let threshold = optional_json::<AutoMatchRequest>(&body)?
        .threshold
        .unwrap_or_else(|| processor.threshold());

    let result = matching::auto_match(pool.connection(), project.id, threshold).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Literal segments are registered before `{material_id}`
    cfg.service(
        web::resource("/projects/{project_id}/materials").route(web::get().to(list_materials)),
    )
    .service(
        web::resource("/projects/{project_id}/materials/match").route(web::post().to(bulk_match)),
    )
    .service(
        web::resource("/projects/{project_id}/materials/match/individual")
            .route(web::post().to(individual_match)),
    )
    .service(
        web::resource("/projects/{project_id}/materials/auto-match")
            .route(web::post().to(auto_match)),
    )
    .service(
        web::resource("/projects/{project_id}/materials/{material_id}")
            .route(web::get().to(get_material))
            .route(web::delete().to(delete_material)),
    )
    .service(
        web::resource("/projects/{project_id}/materials/{material_id}/match")
            .route(web::put().to(match_material))
            .route(web::delete().to(remove_match)),
    );
}
