//! E2E tests: catalog dataset import from disk.

use std::io::Write;

use ifc_lca_lib::models::{CatalogData, CatalogSource, ImpactSource};
use ifc_lca_lib::services::catalog_import;
use tempfile::NamedTempFile;

use super::test_helpers::*;

const UPDATE_DATASET: &str = r#"[
    {"source": "kbob", "external_id": "01.002", "name": "Beton C30/37 (2024)",
     "gwp": 110.0, "ubp": 55.0, "penre": 11.0, "density": 2400.0},
    {"source": "openepd", "external_id": "epd-glass-7", "name": "Float Glass",
     "gwp": 1.3, "penre": 15.0, "density": 2500.0, "declared_unit": "1 kg"}
]"#;

fn dataset_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes())
        .expect("Failed to write dataset");
    file
}

/// Re-importing an entry updates it in place; new entries are inserted.
#[actix_rt::test]
async fn test_import_file_upserts_by_source_and_id() {
    let pool = create_test_pool().await;
    let before = catalog_entry(&pool, "01.002").await;
    let file = dataset_file(UPDATE_DATASET);

    let summary = catalog_import::import_file(pool.connection(), file.path(), None)
        .await
        .unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.per_source.get("kbob"), Some(&1));
    assert_eq!(summary.per_source.get("openepd"), Some(&1));

    let concrete = catalog_entry(&pool, "01.002").await;
    assert_eq!(concrete.id, before.id);
    assert_eq!(concrete.name, "Beton C30/37 (2024)");
    assert_close(concrete.coefficients().unwrap().gwp, 110.0);

    let glass = catalog_entry(&pool, "epd-glass-7").await;
    assert!(matches!(glass.data, CatalogData::OpenEpd(_)));
    assert_eq!(glass.source(), CatalogSource::OpenEpd);
    // OpenEPD publishes no UBP
    assert_close(glass.coefficients().unwrap().ubp, 0.0);
}

#[actix_rt::test]
async fn test_import_file_restricted_to_one_source() {
    let pool = create_test_pool().await;
    let file = dataset_file(UPDATE_DATASET);

    let summary =
        catalog_import::import_file(pool.connection(), file.path(), Some(CatalogSource::OpenEpd))
            .await
            .unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 0);

    let concrete = catalog_entry(&pool, "01.002").await;
    assert_eq!(concrete.name, "Beton C30/37");
}

#[actix_rt::test]
async fn test_import_rejects_invalid_dataset() {
    let pool = create_test_pool().await;

    let file = dataset_file(r#"[{"source": "kbob", "external_id": " ", "name": "Blank"}]"#);
    assert!(
        catalog_import::import_file(pool.connection(), file.path(), None)
            .await
            .is_err()
    );

    let missing = file.path().with_extension("missing");
    assert!(
        catalog_import::import_file(pool.connection(), &missing, None)
            .await
            .is_err()
    );
}
