//! E2E tests: manual, bulk and automatic matching.

use ifc_lca_lib::db::materials;
use ifc_lca_lib::error::AppError;
use ifc_lca_lib::models::MaterialMatch;
use ifc_lca_lib::services::matching;
use uuid::Uuid;

use super::test_helpers::*;

/// Matching twice keeps only the latest catalog entry.
#[actix_rt::test]
async fn test_latest_match_wins() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;
    let wool = catalog_entry(&pool, "06.012").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Dämmung", 1.0)])],
    )
    .await;
    let material_id = ids["Dämmung"];

    matching::apply_match(pool.connection(), project.id, &[material_id], concrete.id, None)
        .await
        .unwrap();
    matching::apply_match(pool.connection(), project.id, &[material_id], wool.id, None)
        .await
        .unwrap();

    let material = materials::get_material(pool.connection(), project.id, material_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(material.catalog_entry_id, Some(wool.id));
    assert_eq!(material.density, Some(60.0));
    assert!(!material.auto_matched);

    // 1 m³ × 60 kg/m³ × 1.2
    assert_close(reload_project(&pool, project.id).await.gwp, 72.0);
}

/// A bulk match recomputes every element referencing any of the materials.
#[actix_rt::test]
async fn test_bulk_match_recomputes_referencing_elements() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[
            parsed_element("wall-1", &[("Beton A", 1.0)]),
            parsed_element("wall-2", &[("Beton B", 1.0), ("Beton C", 1.0)]),
            parsed_element("slab-1", &[("Beton C", 2.0)]),
            parsed_element("door-1", &[("Holz", 0.1)]),
        ],
    )
    .await;

    let result = matching::apply_match(
        pool.connection(),
        project.id,
        &[ids["Beton A"], ids["Beton B"], ids["Beton C"]],
        concrete.id,
        Some(2000.0),
    )
    .await
    .unwrap();

    assert_eq!(result.materials_updated, 3);
    assert_eq!(result.elements_recomputed, 3);
    // 5 m³ × 2000 kg/m³ × 100
    assert_close(reload_project(&pool, project.id).await.gwp, 1_000_000.0);
}

#[actix_rt::test]
async fn test_bulk_match_rejects_foreign_material() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let other = create_project(&pool, "bob").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let own = insert_elements(&pool, project.id, None, &[parsed_element("w", &[("Beton", 1.0)])]).await;
    let foreign = insert_elements(&pool, other.id, None, &[parsed_element("w", &[("Beton", 1.0)])]).await;

    let err = matching::apply_match(
        pool.connection(),
        project.id,
        &[own["Beton"], foreign["Beton"]],
        concrete.id,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Nothing was written
    let material = materials::get_material(pool.connection(), project.id, own["Beton"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(material.catalog_entry_id, None);
}

#[actix_rt::test]
async fn test_match_unknown_catalog_entry() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let ids = insert_elements(&pool, project.id, None, &[parsed_element("w", &[("Beton", 1.0)])]).await;

    let err = matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], Uuid::now_v7(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

/// Each material gets its own entry; a duplicated material keeps the last pair.
#[actix_rt::test]
async fn test_individual_matches() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;
    let wool = catalog_entry(&pool, "06.012").await;
    let timber = catalog_entry(&pool, "ec3-timber-01").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Beton", 1.0), ("Dämmung", 1.0)])],
    )
    .await;

    let matches = vec![
        MaterialMatch {
            material_id: ids["Beton"],
            catalog_entry_id: concrete.id,
            density: None,
        },
        MaterialMatch {
            material_id: ids["Dämmung"],
            catalog_entry_id: timber.id,
            density: None,
        },
        MaterialMatch {
            material_id: ids["Dämmung"],
            catalog_entry_id: wool.id,
            density: None,
        },
    ];
    let result = matching::apply_individual_matches(pool.connection(), project.id, &matches)
        .await
        .unwrap();
    assert_eq!(result.materials_updated, 2);
    assert_eq!(result.elements_recomputed, 1);

    let insulation = materials::get_material(pool.connection(), project.id, ids["Dämmung"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(insulation.catalog_entry_id, Some(wool.id));
    // 240000 + 72
    assert_close(reload_project(&pool, project.id).await.gwp, 240_072.0);
}

#[actix_rt::test]
async fn test_remove_match_zeroes_elements() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;
    let ids = insert_elements(&pool, project.id, None, &[parsed_element("w", &[("Beton", 1.0)])]).await;

    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();
    let result = matching::remove_match(pool.connection(), project.id, ids["Beton"])
        .await
        .unwrap();

    assert_eq!(result.materials_updated, 1);
    assert_eq!(result.elements_recomputed, 1);
    assert_eq!(reload_project(&pool, project.id).await.gwp, 0.0);
}

/// Auto-match only touches unmatched materials above the threshold.
#[actix_rt::test]
async fn test_auto_match_respects_threshold_and_manual_matches() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let wool = catalog_entry(&pool, "06.012").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element(
            "wall-1",
            &[("Beton C30/37", 1.0), ("beton  c30/37 ", 0.0), ("Backstein", 1.0), ("Xyz", 1.0)],
        )],
    )
    .await;

    // A manual match is never overwritten
    matching::apply_match(pool.connection(), project.id, &[ids["Backstein"]], wool.id, None)
        .await
        .unwrap();

    let response = matching::auto_match(pool.connection(), project.id, TEST_THRESHOLD)
        .await
        .unwrap();

    let matched: Vec<&str> = response
        .matched
        .iter()
        .map(|p| p.material_name.as_str())
        .collect();
    assert!(matched.contains(&"Beton C30/37"));
    assert!(!matched.contains(&"Backstein"));
    assert!(response.unmatched.contains(&"Xyz".to_string()));

    let concrete = materials::get_material(pool.connection(), project.id, ids["Beton C30/37"])
        .await
        .unwrap()
        .unwrap();
    assert!(concrete.auto_matched);
    assert!(concrete.match_score.unwrap() >= TEST_THRESHOLD);

    let brick = materials::get_material(pool.connection(), project.id, ids["Backstein"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(brick.catalog_entry_id, Some(wool.id));
}

#[actix_rt::test]
async fn test_auto_match_rejects_invalid_threshold() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;

    for threshold in [-0.1, 1.5, f64::NAN] {
        let err = matching::auto_match(pool.connection(), project.id, threshold)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
