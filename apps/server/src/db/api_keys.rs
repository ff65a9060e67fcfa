//! Database operations for API keys using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::api_key::{self, Entity as ApiKeyEntity};
use crate::error::AppResult;
use crate::models::ApiKey;

use super::DbPool;

impl DbPool {
    /// Insert a new API key.
    pub async fn insert_api_key(&self, key: &ApiKey) -> AppResult<()> {
        let model = api_key::ActiveModel {
            id: Set(key.id),
            key_hash: Set(key.key_hash.clone()),
            key_prefix: Set(key.key_prefix.clone()),
            name: Set(key.name.clone()),
            role: Set(key.role.as_str().to_string()),
            expires_at: Set(key.expires_at),
            last_used_at: Set(key.last_used_at),
            created_at: Set(key.created_at),
            deleted_at: Set(key.deleted_at),
        };

        ApiKeyEntity::insert(model).exec(self.connection()).await?;

        Ok(())
    }

    /// Find an API key by the SHA-256 hex of the full key.
    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let result = ApiKeyEntity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(self.connection())
            .await?;

        Ok(result.map(ApiKey::from))
    }

    pub async fn touch_api_key(&self, id: Uuid) -> AppResult<()> {
        ApiKeyEntity::update_many()
            .col_expr(api_key::Column::LastUsedAt, Expr::value(Some(Utc::now())))
            .filter(api_key::Column::Id.eq(id))
            .exec(self.connection())
            .await?;

        Ok(())
    }

    /// List all API keys, revoked ones included.
    pub async fn list_api_keys(&self) -> AppResult<Vec<ApiKey>> {
        let results = ApiKeyEntity::find()
            .order_by_desc(api_key::Column::CreatedAt)
            .all(self.connection())
            .await?;

        Ok(results.into_iter().map(ApiKey::from).collect())
    }

    /// Soft-delete an API key. Returns false if missing or already revoked.
    pub async fn revoke_api_key(&self, id: Uuid) -> AppResult<bool> {
        let result = ApiKeyEntity::update_many()
            .col_expr(api_key::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .filter(api_key::Column::Id.eq(id))
            .filter(api_key::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
