//! Reference catalog API handlers. The catalog is read-only over HTTP.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, catalog_entries};
use crate::error::{AppError, AppResult};
use crate::models::{CatalogEntryResponse, CatalogListResponse, CatalogSource, ListCatalogQuery};

/// Largest page of catalog entries returned at once.
const MAX_CATALOG_LIMIT: u64 = 500;

/// Search catalog entries by dataset and name.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "Catalog",
    params(ListCatalogQuery),
    responses(
        (status = 200, description = "Catalog entries", body = CatalogListResponse),
        (status = 400, description = "Unknown source", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_catalog(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListCatalogQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let source = match query.source.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            CatalogSource::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown catalog source '{}'", s)))?,
        ),
        None => None,
    };
    let limit = query.limit.clamp(1, MAX_CATALOG_LIMIT);

    let (rows, total) = pool
        .search_catalog(source, query.q.as_deref(), query.offset, limit)
        .await?;

    Ok(HttpResponse::Ok().json(CatalogListResponse {
        entries: rows.into_iter().map(CatalogEntryResponse::from).collect(),
        total,
        limit,
        offset: query.offset,
    }))
}

#[utoipa::path(
    get,
    path = "/catalog/{entry_id}",
    tag = "Catalog",
    params(("entry_id" = Uuid, Path, description = "Catalog entry ID")),
    responses(
        (status = 200, description = "Catalog entry", body = CatalogEntryResponse),
        (status = 404, description = "Catalog entry not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_catalog_entry(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = catalog_entries::get_entry(pool.connection(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Catalog entry {}", id)))?;

    Ok(HttpResponse::Ok().json(CatalogEntryResponse::from(entry)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/catalog").route(web::get().to(list_catalog)))
        .service(web::resource("/catalog/{entry_id}").route(web::get().to(get_catalog_entry)));
}
