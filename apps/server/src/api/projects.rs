//! Project API handlers.

use actix_web::{HttpResponse, web};
use sea_orm::TransactionTrait;
use tracing::info;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, elements};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateProjectRequest, DeletionListResponse, DeletionRecordResponse, EmissionsResponse,
    Indicators, Pagination, PaginationParams, ProjectListResponse, ProjectResponse, RecalculateResponse,
    UpdateProjectRequest,
};
use crate::services::projects::{load_owned_project, load_writable_project, require_writer};
use crate::services::recalculation;

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Missing required field: name".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Create a project owned by the calling key.
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Viewer key", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn create_project(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    require_writer(&auth.caller)?;
    let body = body.into_inner();
    let name = validate_name(&body.name)?;

    let project = pool
        .insert_project(&name, body.description, &auth.caller.name)
        .await?;

    info!(project_id = %project.id, owner = %project.owner, "Project created");
    Ok(HttpResponse::Created().json(ProjectResponse::from(project)))
}

/// List the caller's projects. Admins see every project.
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    params(PaginationParams),
    responses(
        (status = 200, description = "Projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_projects(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let owner = (!auth.caller.is_admin()).then_some(auth.caller.name.as_str());
    let limit = query.clamped_limit();
    let (projects, total) = pool
        .list_projects(owner, query.offset() as u64, limit as u64)
        .await?;

    Ok(HttpResponse::Ok().json(ProjectListResponse {
        projects: projects.into_iter().map(ProjectResponse::from).collect(),
        pagination: Pagination::new(query.page(), limit, total),
    }))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_project(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProjectResponse::from(project)))
}

#[utoipa::path(
    put,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn update_project(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;
    let body = body.into_inner();
    let name = body.name.as_deref().map(validate_name).transpose()?;

    let updated = pool.update_project(project, name, body.description).await?;
    Ok(HttpResponse::Ok().json(ProjectResponse::from(updated)))
}

/// Delete a project with all its uploads, elements and materials.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn delete_project(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;

    if !pool.delete_project(project.id).await? {
        return Err(AppError::NotFound(format!("Project {}", project.id)));
    }

    info!(project_id = %project.id, deleted_by = %auth.caller.name, "Project deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Recompute every element and the project totals.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/recalculate",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project recalculated", body = RecalculateResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn recalculate_project(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;

    let txn = pool.connection().begin().await?;
    let (elements_recomputed, totals) = recalculation::recompute_all(&txn, project.id).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(RecalculateResponse {
        project_id: project.id,
        elements_recomputed,
        totals,
    }))
}

/// Project totals with the per-material breakdown.
#[utoipa::path(
    get,
    path = "/projects/{project_id}/emissions",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Emissions", body = EmissionsResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_emissions(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    let conn = pool.connection();

    let materials = recalculation::material_breakdown(conn, project.id).await?;
    let element_count = elements::count_active(conn, project.id).await?;
    let response = EmissionsResponse {
        project_id: project.id,
        totals: Indicators::new(project.gwp, project.ubp, project.penre),
        last_calculated: project.last_calculated,
        element_count,
        materials,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Audit trail of deleted elements, materials and uploads.
#[utoipa::path(
    get,
    path = "/projects/{project_id}/deletions",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Deletion records, newest first", body = DeletionListResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_deletions(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    let records = pool.list_deletions(project.id).await?;

    Ok(HttpResponse::Ok().json(DeletionListResponse {
        deletions: records
            .into_iter()
            .map(DeletionRecordResponse::from)
            .collect(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    .service(
        web::resource("/projects/{project_id}")
            .route(web::get().to(get_project))
            .route(web::put().to(update_project))
            .route(web::delete().to(delete_project)),
    )
    .service(
        web::resource("/projects/{project_id}/recalculate")
            .route(web::post().to(recalculate_project)),
    )
    .service(web::resource("/projects/{project_id}/emissions").route(web::get().to(get_emissions)))
    .service(web::resource("/projects/{project_id}/deletions").route(web::get().to(list_deletions)));
}
