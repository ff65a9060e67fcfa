//! Upload API handlers.
//!
//! Both entry points create the upload in `processing`, hand the payload to
//! the [`UploadProcessor`] and reply 202 without waiting for it.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::optional_json;
use crate::auth::ApiKeyAuth;
use crate::db::{DbPool, uploads};
use crate::error::{AppError, AppResult};
use crate::models::{
    DeleteRequest, DeleteResponse, ParsedUploadRequest, UploadListResponse, UploadResponse,
};
use crate::services::processing::validate_parsed;
use crate::services::projects::{load_owned_project, load_writable_project};
use crate::services::{UploadPayload, UploadProcessor, deletion};

/// Accepted extension of uploaded model files.
const IFC_EXTENSION: &str = ".ifc";

/// Column limit of `uploads.filename`.
const MAX_FILENAME_LEN: usize = 255;

/// Maximum size of an IFC file in bytes.
#[derive(Debug, Clone, Copy)]
pub struct MaxUploadSize(pub usize);

/// Base name of a client supplied file name.
fn sanitize_filename(raw: &str) -> AppResult<String> {
    let name = raw
        .replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if name.is_empty() || name == ".." || name.chars().count() > MAX_FILENAME_LEN {
        return Err(AppError::InvalidInput("Invalid file name".to_string()));
    }
    if !name.to_lowercase().ends_with(IFC_EXTENSION) {
        return Err(AppError::InvalidInput(format!(
            "Only {} files are accepted, got {}",
            IFC_EXTENSION, name
        )));
    }
    Ok(name)
}

/// Read the first file field of the form into memory.
async fn read_ifc_file(payload: &mut Multipart, max_size: usize) -> AppResult<(String, Vec<u8>)> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let Some(filename) = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
        else {
            continue;
        };
        let filename = sanitize_filename(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            if bytes.len() + chunk.len() > max_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "{} exceeds the limit of {} bytes",
                    filename, max_size
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(AppError::InvalidInput(format!("{} is empty", filename)));
        }
        return Ok((filename, bytes));
    }

    Err(AppError::InvalidInput(
        "Missing required file field".to_string(),
    ))
}

/// Upload an IFC file for parsing by the external service.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/uploads",
    tag = "Uploads",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body(content_type = "multipart/form-data", description = "IFC file"),
    responses(
        (status = 202, description = "Upload accepted for processing", body = UploadResponse),
        (status = 400, description = "Missing or invalid file", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn upload_ifc(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    processor: web::Data<UploadProcessor>,
    max_upload_size: web::Data<MaxUploadSize>,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;
    let (filename, bytes) = read_ifc_file(&mut payload, max_upload_size.0).await?;

    let upload = pool.insert_upload(project.id, &filename).await?;
    info!(
        project_id = %project.id,
        upload_id = %upload.id,
        filename = %filename,
        size = bytes.len(),
        "IFC upload accepted"
    );

    processor.spawn(project.id, upload.id, filename, UploadPayload::File(bytes));
    Ok(HttpResponse::Accepted().json(UploadResponse::from(upload)))
}

/// Upload a model parsed on the client.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/uploads/parsed",
    tag = "Uploads",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    request_body = ParsedUploadRequest,
    responses(
        (status = 202, description = "Upload accepted for processing", body = UploadResponse),
        (status = 400, description = "Invalid element list", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn upload_parsed(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    processor: web::Data<UploadProcessor>,
    path: web::Path<Uuid>,
    body: web::Json<ParsedUploadRequest>,
) -> AppResult<HttpResponse> {
    let project = load_writable_project(&pool, &auth.caller, path.into_inner()).await?;
    let ParsedUploadRequest { filename, elements } = body.into_inner();

    let filename = filename.trim().to_string();
    if filename.is_empty() {
        return Err(AppError::InvalidInput(
            "Missing required field: filename".to_string(),
        ));
    }
    if filename.chars().count() > MAX_FILENAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "filename exceeds {} characters",
            MAX_FILENAME_LEN
        )));
    }
    validate_parsed(&elements)?;

    let upload = pool.insert_upload(project.id, &filename).await?;
    info!(
        project_id = %project.id,
        upload_id = %upload.id,
        elements = elements.len(),
        "Parsed upload accepted"
    );

    processor.spawn(project.id, upload.id, filename, UploadPayload::Parsed(elements));
    Ok(HttpResponse::Accepted().json(UploadResponse::from(upload)))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/uploads",
    tag = "Uploads",
    params(("project_id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Uploads, newest first", body = UploadListResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn list_uploads(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let project = load_owned_project(&pool, &auth.caller, path.into_inner()).await?;
    let rows = pool.list_uploads(project.id).await?;

    Ok(HttpResponse::Ok().json(UploadListResponse {
        uploads: rows.into_iter().map(UploadResponse::from).collect(),
    }))
}

/// Upload status.
#[utoipa::path(
    get,
    path = "/projects/{project_id}/uploads/{upload_id}",
    tag = "Uploads",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("upload_id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Upload", body = UploadResponse),
        (status = 404, description = "Project or upload not found", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn get_upload(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (project_id, upload_id) = path.into_inner();
    let project = load_owned_project(&pool, &auth.caller, project_id).await?;

    let upload = uploads::find_in_project(pool.connection(), project.id, upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {}", upload_id)))?;

    Ok(HttpResponse::Ok().json(UploadResponse::from(upload)))
}

/// Delete a finished upload and its elements.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/uploads/{upload_id}",
    tag = "Uploads",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("upload_id" = Uuid, Path, description = "Upload ID")
    ),
    request_body(content = DeleteRequest, description = "Optional deletion reason"),
    responses(
        (status = 200, description = "Upload deleted", body = DeleteResponse),
        (status = 404, description = "Project or upload not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Upload still processing", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = []))
)]
pub async fn delete_upload(
    auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (project_id, upload_id) = path.into_inner();
    let project = load_writable_project(&pool, &auth.caller, project_id).await?;
    let reason = optional_json::<DeleteRequest>(&body)?.reason_or_default();

    let response = deletion::delete_upload(
        pool.connection(),
        project.id,
        upload_id,
        reason,
        &auth.caller.name,
    )
    .await
    .inspect_err(|e| warn!(upload_id = %upload_id, error = %e, "Upload deletion refused"))?;

    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/{project_id}/uploads")
            .route(web::get().to(list_uploads))
            .route(web::post().to(upload_ifc)),
    )
    .service(
        web::resource("/projects/{project_id}/uploads/parsed").route(web::post().to(upload_parsed)),
    )
    .service(
        web::resource("/projects/{project_id}/uploads/{upload_id}")
            .route(web::get().to(get_upload))
            .route(web::delete().to(delete_upload)),
    );
}
