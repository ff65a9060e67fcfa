//! Element API handlers.

use actix_web::{HttpResponse, web};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::api::optional_json;
use crate::auth::ApiKeyAuth;
use crate::db::elements::{self, ElementFilter};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    ArchiveRequest, DeleteRequest, DeleteResponse, ElementListResponse, ElementResponse,
    LayerResponse, ListElementsQuery, Pagination, PaginationParams,
};
use crate::services::projects::{load_owned_project, load_writable_project};
use crate::services::{deletion, recalculation};

#[utoipa::path(
    get,
    path = "/projects/{project_id}/elements",
    tag = "Elements",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ListElementsQuery
    ),
    responses(
        (status = 200, description = "Elements", body = ElementListResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_elements(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<ListElementsQuery>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    let query = query.into_inner();

    let pagination = PaginationParams::new(query.page, query.limit);
    let filter = ElementFilter {
        ifc_type: query.ifc_type.filter(|t| !t.trim().is_empty()),
        include_archived: query.include_archived,
    };
    let limit = pagination.clamped_limit();
    let (rows, total) = pool
        .list_elements(project.id, &filter, pagination.offset() as u64, limit as u64)
        .await?;

    Ok(HttpResponse::Ok().json(ElementListResponse {
        elements: rows.into_iter().map(ElementResponse::from).collect(),
        pagination: Pagination::new(pagination.page(), limit, total),
    }))
}

/// Element detail with its material layers.
#[utoipa::path(
    get,
    path = "/projects/{project_id}/elements/{element_id}",
    tag = "Elements",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("element_id" = Uuid, Path, description = "Element ID")
    ),
    responses(
        (status = 200, description = "Element with layers", body = ElementResponse),
        (status = 404, description = "Project or element not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_element(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (project_id, element_id) = path.into_inner();
    let project = load_owned_project(&pool, &auth.caller, project_id).await?;
    let conn = pool.connection();

    let element = elements::get_element(conn, project.id, element_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Element {}", element_id)))?;
    let layers = elements::layers_of_element(conn, element_id)
        .await?
        .into_iter()
        .map(|(layer, material)| {
            let name = material.map(|m| m.name).unwrap_or_default();
            LayerResponse::new(layer, name)
        })
        .collect();

    Ok(HttpResponse::Ok().json(ElementResponse::from(element).with_layers(layers)))
}

/// Delete an element. The body may carry a reason.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/elements/{element_id}",
    tag = "Elements",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("element_id" = Uuid, Path, description = "Element ID")
    ),
    request_body(content = DeleteRequest, description = "Optional deletion reason"),
    responses(
        (status = 200, description = "Element deleted", body = DeleteResponse),
        (status = 404, description = "Project or element not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn delete_element(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (project_id, element_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;
    let reason = optional_json::<DeleteRequest>(&body)?.reason_or_default();

    let response = deletion::delete_element(
        pool.connection(),
        project.id,
        element_id,
        reason,
        &auth.caller.name,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Archive or restore an element. Archived elements leave the project totals.
#[utoipa::path(
    put,
    path = "/projects/{project_id}/elements/{element_id}/archived",
    tag = "Elements",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("element_id" = Uuid, Path, description = "Element ID")
    ),
    request_body = ArchiveRequest,
    responses(
        (status = 200, description = "Element updated", body = ElementResponse),
        (status = 404, description = "Project or element not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn set_archived(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ArchiveRequest>,
) -> AppResult<HttpResponse> {
    let (project_id, element_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;

    let txn = pool.connection().begin().await?;
    if !elements::set_archived(&txn, project.id, element_id, body.archived).await? {
        return Err(AppError::NotFound(format!("Element {}", element_id)));
    }
    recalculation::recompute_project(&txn, project.id).await?;
    let element = elements::get_element(&txn, project.id, element_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Element {}", element_id)))?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(ElementResponse::from(element)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/{project_id}/elements").route(web::get().to(list_elements)),
    )
    .service(
        web::resource("/projects/{project_id}/elements/{element_id}")
            .route(web::get().to(get_element))
            .route(web::delete().to(delete_element)),
    )
    .service(
        web::resource("/projects/{project_id}/elements/{element_id}/archived")
            .route(web::put().to(set_archived)),
    );
}
