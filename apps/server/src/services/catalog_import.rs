//! Import of reference catalog datasets.
//!
//! A dataset is a JSON array of catalog records. Entries are upserted by
//! `(source, external_id)` in a single transaction.

use std::collections::BTreeMap;
use std::path::Path;

use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

use crate::db::catalog_entries;
use crate::error::{AppError, AppResult};
use crate::models::{CatalogImportRecord, CatalogSource};

/// Outcome of a catalog import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
    /// Imported records per source
    pub per_source: BTreeMap<&'static str, u64>,
}

/// Parse a dataset and check every record has an id and a name.
pub fn parse_records(json: &str) -> AppResult<Vec<CatalogImportRecord>> {
    let records: Vec<CatalogImportRecord> = serde_json::from_str(json)?;

    for (i, r) in records.iter().enumerate() {
        if r.external_id.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "record {} has an empty external_id",
                i
            )));
        }
        if r.name.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "record {} ({}) has an empty name",
                i, r.external_id
            )));
        }
    }
    Ok(records)
}

/// Upsert the records.
///
/// `only` restricts the import to one source; other records are skipped.
pub async fn import_records(
    db: &DatabaseConnection,
    records: &[CatalogImportRecord],
    only: Option<CatalogSource>,
) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    let txn = db.begin().await?;

    for record in records {
        if only.is_some_and(|s| s != record.source) {
            continue;
        }
        if catalog_entries::upsert(&txn, record).await? {
            summary.inserted += 1;
        } else {
            summary.updated += 1;
        }
        *summary.per_source.entry(record.source.as_str()).or_default() += 1;
    }

    txn.commit().await?;

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        "Catalog import finished"
    );
    Ok(summary)
}

/// Read a dataset file and import it.
pub async fn import_file(
    db: &DatabaseConnection,
    path: &Path,
    only: Option<CatalogSource>,
) -> AppResult<ImportSummary> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let records = parse_records(&json)?;
    import_records(db, &records, only).await
}
