//! E2E tests: audited deletion of elements, materials and uploads.

use std::time::Duration;

use ifc_lca_lib::db::{elements, materials};
use ifc_lca_lib::error::AppError;
use ifc_lca_lib::services::{UploadPayload, deletion, matching};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_delete_element_records_snapshot() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[
            parsed_element("wall-1", &[("Beton", 1.0)]),
            parsed_element("wall-2", &[("Beton", 2.0)]),
        ],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();

    let element_id = element_ids(&pool, project.id).await[0];
    let element = reload_element(&pool, project.id, element_id).await;
    let response = deletion::delete_element(
        pool.connection(),
        project.id,
        element_id,
        "duplicate geometry".into(),
        "alice",
    )
    .await
    .unwrap();
    assert_eq!(response.deleted, element_id);

    let records = pool.list_deletions(project.id).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, response.deletion_record_id);
    assert_eq!(record.entity_type, "element");
    assert_eq!(record.reason, "duplicate geometry");
    assert_eq!(record.deleted_by, "alice");
    let snapshot = record.snapshot.as_ref().unwrap();
    assert_eq!(snapshot["global_id"], element.global_id.as_str());
    assert_eq!(snapshot["layers"].as_array().unwrap().len(), 1);

    // The remaining element alone makes up the totals
    let remaining = element_ids(&pool, project.id).await;
    assert_eq!(remaining.len(), 1);
    let expected = reload_element(&pool, project.id, remaining[0]).await.gwp;
    assert_close(reload_project(&pool, project.id).await.gwp, expected);
}

#[actix_rt::test]
async fn test_delete_unknown_element() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;

    let err = deletion::delete_element(
        pool.connection(),
        project.id,
        uuid::Uuid::now_v7(),
        "gone".into(),
        "alice",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(pool.list_deletions(project.id).await.unwrap().is_empty());
}

/// Deleting a material removes its layers and recomputes the elements.
#[actix_rt::test]
async fn test_delete_material_recomputes_elements() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;
    let wool = catalog_entry(&pool, "06.012").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Beton", 1.0), ("Dämmung", 1.0)])],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();
    matching::apply_match(pool.connection(), project.id, &[ids["Dämmung"]], wool.id, None)
        .await
        .unwrap();
    assert_close(reload_project(&pool, project.id).await.gwp, 240_072.0);

    let response = deletion::delete_material(
        pool.connection(),
        project.id,
        ids["Beton"],
        "wrong layer".into(),
        "alice",
    )
    .await
    .unwrap();
    assert_eq!(response.elements_recomputed, 1);

    assert!(
        materials::get_material(pool.connection(), project.id, ids["Beton"])
            .await
            .unwrap()
            .is_none()
    );
    let element_id = element_ids(&pool, project.id).await[0];
    let layers = elements::layers_of_element(pool.connection(), element_id)
        .await
        .unwrap();
    assert_eq!(layers.len(), 1);
    assert_close(reload_project(&pool, project.id).await.gwp, 72.0);

    let records = pool.list_deletions(project.id).await.unwrap();
    assert_eq!(records[0].entity_type, "material");
    assert_eq!(records[0].entity_name.as_deref(), Some("Beton"));
}

/// A finished upload is deleted with its elements; a running one is refused.
#[actix_rt::test]
async fn test_delete_upload() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(
        &pool,
        StubParser::new(StubBehavior::Fail("unused")),
        Duration::from_secs(10),
    );

    let kept = pool.insert_upload(project.id, "kept.ifc").await.unwrap();
    processor
        .spawn(
            project.id,
            kept.id,
            "kept.ifc".into(),
            UploadPayload::Parsed(vec![parsed_element("kept", &[("Beton C30/37", 1.0)])]),
        )
        .await
        .unwrap();

    let removed = pool.insert_upload(project.id, "removed.ifc").await.unwrap();
    let err = deletion::delete_upload(pool.connection(), project.id, removed.id, "x".into(), "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    processor
        .spawn(
            project.id,
            removed.id,
            "removed.ifc".into(),
            UploadPayload::Parsed(vec![
                parsed_element("r1", &[("Beton C30/37", 1.0)]),
                parsed_element("r2", &[("Beton C30/37", 1.0)]),
            ]),
        )
        .await
        .unwrap();
    assert_close(reload_project(&pool, project.id).await.gwp, 720_000.0);

    deletion::delete_upload(pool.connection(), project.id, removed.id, "superseded".into(), "alice")
        .await
        .unwrap();

    assert!(pool.get_upload(removed.id).await.unwrap().is_none());
    assert_eq!(element_ids(&pool, project.id).await.len(), 1);
    assert_close(reload_project(&pool, project.id).await.gwp, 240_000.0);

    let records = pool.list_deletions(project.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_type, "upload");
    let snapshot = records[0].snapshot.as_ref().unwrap();
    assert_eq!(snapshot["element_ids"].as_array().unwrap().len(), 2);
}
