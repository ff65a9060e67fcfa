//! API key generation, verification and management.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ApiKey, ApiKeyRole, AuthenticatedCaller};

/// API key prefix.
pub const KEY_PREFIX: &str = "lca_";
/// Length of random part of the key.
const KEY_RANDOM_LENGTH: usize = 32;
/// Length of the key prefix stored for identification.
const KEY_PREFIX_LENGTH: usize = 8;

/// Generate a new random API key.
///
/// Returns the full key (shown to the user once) and the record to store.
pub fn generate_key(
    name: &str,
    role: ApiKeyRole,
    expires_in: Option<&str>,
) -> AppResult<(String, ApiKey)> {
    let expires_at = match expires_in.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let duration = parse_duration(s).ok_or_else(|| {
                AppError::InvalidInput(format!("Invalid expiration '{}', use e.g. 30d or 1y", s))
            })?;
            Some(Utc::now() + duration)
        }
        None => None,
    };

    let random_part: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();
    let full_key = format!("{}{}", KEY_PREFIX, random_part);

    let api_key = ApiKey {
        id: Uuid::now_v7(),
        key_hash: hash_key(&full_key),
        key_prefix: full_key.chars().take(KEY_PREFIX_LENGTH).collect(),
        name: name.to_string(),
        role,
        expires_at,
        last_used_at: None,
        created_at: Utc::now(),
        deleted_at: None,
    };

    Ok((full_key, api_key))
}

/// SHA-256 hex of an API key.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a duration string like "365d", "12w", "6m" or "1y".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();

    let (number, days_per_unit) = if let Some(n) = s.strip_suffix('d') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 7)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 30)
    } else if let Some(n) = s.strip_suffix('y') {
        (n, 365)
    } else {
        (s.as_str(), 1)
    };

    number
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| n.checked_mul(days_per_unit))
        .and_then(Duration::try_days)
}

/// Verify an API key and return the authenticated caller.
pub async fn verify_key(pool: &DbPool, key: &str) -> AppResult<AuthenticatedCaller> {
    let api_key = pool
        .find_api_key_by_hash(&hash_key(key))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))?;

    if api_key.is_revoked() {
        return Err(AppError::Unauthorized("API key has been revoked".to_string()));
    }
    if api_key.is_expired() {
        return Err(AppError::Unauthorized("API key has expired".to_string()));
    }

    if let Err(e) = pool.touch_api_key(api_key.id).await {
        warn!(key_prefix = %api_key.key_prefix, error = %e, "Failed to record API key use");
    }

    Ok(AuthenticatedCaller {
        key_id: api_key.id.to_string(),
        name: api_key.name,
        key_prefix: api_key.key_prefix,
        role: api_key.role,
    })
}

/// Create a new API key and store it.
pub async fn create_key(
    pool: &DbPool,
    name: &str,
    role: ApiKeyRole,
    expires_in: Option<&str>,
) -> AppResult<(String, ApiKey)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }

    let (full_key, api_key) = generate_key(name, role, expires_in)?;
    pool.insert_api_key(&api_key).await?;

    Ok((full_key, api_key))
}
