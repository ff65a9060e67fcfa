//! Database queries for reference catalog entries.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::catalog_entry::{self, ActiveModel, Entity as CatalogEntryEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CatalogEntry, CatalogImportRecord, CatalogSource};
use crate::services::matching::normalize_name;

use super::{DbPool, IN_CHUNK_SIZE};

pub async fn get_entry<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<catalog_entry::Model>> {
    Ok(CatalogEntryEntity::find_by_id(id).one(conn).await?)
}

/// Typed catalog entries for the given ids.
pub async fn find_by_ids<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<Vec<CatalogEntry>> {
    let mut entries = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let rows = CatalogEntryEntity::find()
            .filter(catalog_entry::Column::Id.is_in(chunk.iter().copied()))
            .all(conn)
            .await?;
        entries.extend(rows.iter().filter_map(CatalogEntry::from_model));
    }
    Ok(entries)
}

/// Load every catalog entry as a typed [`CatalogEntry`].
///
/// Rows with an unknown source are skipped.
pub async fn load_all<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<CatalogEntry>> {
    let rows = CatalogEntryEntity::find()
        .order_by_asc(catalog_entry::Column::ExternalId)
        .all(conn)
        .await?;

    Ok(rows.iter().filter_map(CatalogEntry::from_model).collect())
}

/// Insert or update an entry keyed by `(source, external_id)`.
///
/// Returns true when a new entry was inserted.
pub async fn upsert<C: ConnectionTrait>(conn: &C, record: &CatalogImportRecord) -> AppResult<bool> {
    let now = Utc::now();
    let raw = serde_json::json!({
        "source": record.source.as_str(),
        "external_id": record.external_id,
        "name": record.name,
        "category": record.category,
        "gwp": record.gwp,
        "ubp": record.ubp,
        "penre": record.penre,
        "density": record.density,
        "density_min": record.density_min,
        "density_max": record.density_max,
        "declared_unit": record.declared_unit,
    });

    let existing = CatalogEntryEntity::find()
        .filter(catalog_entry::Column::Source.eq(record.source.as_str()))
        .filter(catalog_entry::Column::ExternalId.eq(record.external_id.as_str()))
        .one(conn)
        .await?;

    let (mut active, inserted): (ActiveModel, bool) = match existing {
        Some(model) => (model.into(), false),
        None => (
            ActiveModel {
                id: Set(Uuid::now_v7()),
                source: Set(record.source.as_str().to_string()),
                external_id: Set(record.external_id.clone()),
                created_at: Set(now),
                ..Default::default()
            },
            true,
        ),
    };

    active.name = Set(record.name.clone());
    active.name_normalized = Set(normalize_name(&record.name));
    active.category = Set(record.category.clone());
    active.gwp = Set(record.gwp);
    active.ubp = Set(record.ubp);
    active.penre = Set(record.penre);
    active.density = Set(record.density);
    active.density_min = Set(record.density_min);
    active.density_max = Set(record.density_max);
    active.declared_unit = Set(record.declared_unit.clone());
    active.raw = Set(Some(raw));
    active.updated_at = Set(now);

    let saved = if inserted {
        active.insert(conn).await
    } else {
        active.update(conn).await
    };
    saved.map_err(|e| AppError::Database(format!("Failed to save catalog entry: {}", e)))?;

    Ok(inserted)
}

impl DbPool {
    /// Search the catalog by source and name fragment.
    pub async fn search_catalog(
        &self,
        source: Option<CatalogSource>,
        q: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<catalog_entry::Model>, u64)> {
        let mut query = CatalogEntryEntity::find();
        if let Some(source) = source {
            query = query.filter(catalog_entry::Column::Source.eq(source.as_str()));
        }
        if let Some(q) = q.map(normalize_name).filter(|q| !q.is_empty()) {
            query = query.filter(catalog_entry::Column::NameNormalized.contains(q.as_str()));
        }

        let total = query.clone().count(self.connection()).await?;
        let entries = query
            .order_by_asc(catalog_entry::Column::Source)
            .order_by_asc(catalog_entry::Column::ExternalId)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await?;

        Ok((entries, total))
    }
}
