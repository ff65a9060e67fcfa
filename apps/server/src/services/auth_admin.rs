//! API key management endpoints.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ApiKeyCreateResponse, ApiKeyListItem, ApiKeyRole, CreateApiKeyRequest};
use crate::services::api_key;

/// Configure auth admin routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_api_key)
        .service(list_api_keys)
        .service(revoke_api_key);
}

fn require_admin(auth: &ApiKeyAuth, action: &str) -> AppResult<()> {
    if auth.caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Admin role required to {}",
            action
        )))
    }
}

/// Create a new API key.
#[utoipa::path(
    post,
    path = "/auth/keys",
    tag = "Auth",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API key created", body = ApiKeyCreateResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Admin role required")
    ),
    security(("api_key" = []), ("admin_key" = []))
)]
#[post("/auth/keys")]
pub async fn create_api_key(
    auth: ApiKeyAuth,
    body: web::Json<CreateApiKeyRequest>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    require_admin(&auth, "create API keys")?;

    let role = match body.role.as_deref() {
        Some(r) => ApiKeyRole::parse(r)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown role '{}'", r)))?,
        None => ApiKeyRole::default(),
    };

    let (full_key, api_key) =
        api_key::create_key(pool.get_ref(), &body.name, role, body.expires_in.as_deref()).await?;

    tracing::info!(
        key_prefix = %api_key.key_prefix,
        role = %api_key.role,
        created_by = %auth.caller.name,
        "API key created"
    );

    Ok(HttpResponse::Created().json(ApiKeyCreateResponse {
        id: api_key.id,
        key: full_key,
        name: api_key.name,
        role: api_key.role,
        expires_at: api_key.expires_at,
        created_at: api_key.created_at,
    }))
}

/// List all API keys.
#[utoipa::path(
    get,
    path = "/auth/keys",
    tag = "Auth",
    responses(
        (status = 200, description = "List of API keys", body = ListApiKeysResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Admin role required")
    ),
    security(("api_key" = []), ("admin_key" = []))
)]
#[get("/auth/keys")]
pub async fn list_api_keys(auth: ApiKeyAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    require_admin(&auth, "list API keys")?;

    let keys = pool.list_api_keys().await?;
    let items: Vec<ApiKeyListItem> = keys.into_iter().map(ApiKeyListItem::from).collect();

    Ok(HttpResponse::Ok().json(ListApiKeysResponse { keys: items }))
}

/// Revoke an API key.
#[utoipa::path(
    delete,
    path = "/auth/keys/{id}",
    tag = "Auth",
    params(
        ("id" = Uuid, Path, description = "API key ID")
    ),
    responses(
        (status = 200, description = "API key revoked", body = RevokeApiKeyResponse),
        (status = 400, description = "Cannot revoke own key"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "API key not found or already revoked")
    ),
    security(("api_key" = []), ("admin_key" = []))
)]
#[delete("/auth/keys/{id}")]
pub async fn revoke_api_key(
    auth: ApiKeyAuth,
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    require_admin(&auth, "revoke API keys")?;

    let id = path.into_inner();
    if id.to_string() == auth.caller.key_id {
        return Err(AppError::InvalidInput(
            "Cannot revoke your own API key".to_string(),
        ));
    }

    if pool.revoke_api_key(id).await? {
        tracing::info!(key_id = %id, revoked_by = %auth.caller.name, "API key revoked");
        Ok(HttpResponse::Ok().json(RevokeApiKeyResponse {
            message: "API key revoked".to_string(),
            id,
        }))
    } else {
        Err(AppError::NotFound(format!(
            "API key {} (or already revoked)",
            id
        )))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListApiKeysResponse {
    keys: Vec<ApiKeyListItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeApiKeyResponse {
    message: String,
    id: Uuid,
}
