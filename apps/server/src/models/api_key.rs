//! API key model for authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::api_key;

/// Role granted to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyRole {
    Admin,
    #[default]
    Contributor,
    Viewer,
}

impl ApiKeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Contributor => "contributor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "contributor" => Some(Self::Contributor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiKeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// API key as stored in the database.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: Uuid,
    /// SHA-256 hex of the full key
    pub key_hash: String,
    /// First 8 characters of the key, shown in listings
    pub key_prefix: String,
    pub name: String,
    pub role: ApiKeyRole,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Set when the key is revoked
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

impl From<api_key::Model> for ApiKey {
    fn from(m: api_key::Model) -> Self {
        Self {
            id: m.id,
            key_hash: m.key_hash,
            key_prefix: m.key_prefix,
            name: m.name,
            role: ApiKeyRole::parse(&m.role).unwrap_or_default(),
            expires_at: m.expires_at,
            last_used_at: m.last_used_at,
            created_at: m.created_at,
            deleted_at: m.deleted_at,
        }
    }
}

/// Response when creating a new API key. The full key is only shown here.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyCreateResponse {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub role: ApiKeyRole,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// API key listing entry with the key itself masked.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyListItem {
    pub id: Uuid,
    pub key_prefix: String,
    pub name: String,
    pub role: ApiKeyRole,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_revoked: bool,
}

impl From<ApiKey> for ApiKeyListItem {
    fn from(key: ApiKey) -> Self {
        let is_revoked = key.is_revoked();
        Self {
            id: key.id,
            key_prefix: key.key_prefix,
            name: key.name,
            role: key.role,
            expires_at: key.expires_at,
            last_used_at: key.last_used_at,
            created_at: key.created_at,
            is_revoked,
        }
    }
}

/// Request to create a new API key.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration such as "365d", "12w", "6m" or "1y"
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub key_id: String,
    pub name: String,
    pub key_prefix: String,
    pub role: ApiKeyRole,
}

impl AuthenticatedCaller {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, ApiKeyRole::Admin)
    }

    /// Viewers may read but never mutate.
    pub fn can_write(&self) -> bool {
        !matches!(self.role, ApiKeyRole::Viewer)
    }
}
