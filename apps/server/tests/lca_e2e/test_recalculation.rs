//! E2E tests: indicator computation and project aggregates.

use ifc_lca_lib::db::elements;
use ifc_lca_lib::services::{deletion, matching, recalculation};
use sea_orm::TransactionTrait;

use super::test_helpers::*;

/// 2 m³ of concrete at 2400 kg/m³ with 100/50/10 per kg.
#[actix_rt::test]
async fn test_single_layer_element_totals() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Beton", 2.0)])],
    )
    .await;

    let result = matching::apply_match(
        pool.connection(),
        project.id,
        &[ids["Beton"]],
        concrete.id,
        Some(2400.0),
    )
    .await
    .unwrap();
    assert_eq!(result.materials_updated, 1);
    assert_eq!(result.elements_recomputed, 1);

    let project = reload_project(&pool, project.id).await;
    assert_close(project.gwp, 480_000.0);
    assert_close(project.ubp, 240_000.0);
    assert_close(project.penre, 48_000.0);
    assert!(project.last_calculated.is_some());

    let element_id = element_ids(&pool, project.id).await[0];
    let element = reload_element(&pool, project.id, element_id).await;
    assert_close(element.gwp, 480_000.0);
}

/// Deleting every element brings the totals back to zero.
#[actix_rt::test]
async fn test_deleting_all_elements_zeroes_totals() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[
            parsed_element("wall-1", &[("Beton", 2.0)]),
            parsed_element("wall-2", &[("Beton", 1.0)]),
        ],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();
    assert_close(reload_project(&pool, project.id).await.gwp, 720_000.0);

    for id in element_ids(&pool, project.id).await {
        deletion::delete_element(pool.connection(), project.id, id, "cleanup".into(), "alice")
            .await
            .unwrap();
    }

    let project = reload_project(&pool, project.id).await;
    assert_eq!(project.gwp, 0.0);
    assert_eq!(project.ubp, 0.0);
    assert_eq!(project.penre, 0.0);
}

/// Unmatched layers contribute zero; matched layers of the same element still count.
#[actix_rt::test]
async fn test_unmatched_layer_contributes_zero() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Beton", 1.0), ("Unbekannt", 5.0)])],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();

    let project = reload_project(&pool, project.id).await;
    assert_close(project.gwp, 240_000.0);
}

/// Archived elements keep their values but leave the project totals.
#[actix_rt::test]
async fn test_archived_elements_leave_totals() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[
            parsed_element("wall-1", &[("Beton", 1.0)]),
            parsed_element("wall-2", &[("Beton", 1.0)]),
        ],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();

    let archived = element_ids(&pool, project.id).await[0];
    let txn = pool.connection().begin().await.unwrap();
    assert!(elements::set_archived(&txn, project.id, archived, true).await.unwrap());
    recalculation::recompute_project(&txn, project.id).await.unwrap();
    txn.commit().await.unwrap();

    let project = reload_project(&pool, project.id).await;
    assert_close(project.gwp, 240_000.0);
    assert_close(reload_element(&pool, project.id, archived).await.gwp, 240_000.0);
}

/// KBOB entries with only a density range use its midpoint.
#[actix_rt::test]
async fn test_density_range_midpoint() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let brick = catalog_entry(&pool, "02.001").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[parsed_element("wall-1", &[("Ziegel", 1.0)])],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Ziegel"]], brick.id, None)
        .await
        .unwrap();

    // 1 m³ × 1300 kg/m³ × 0.25
    assert_close(reload_project(&pool, project.id).await.gwp, 325.0);
}

/// A full recalculation is idempotent.
#[actix_rt::test]
async fn test_recompute_all_is_idempotent() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let concrete = catalog_entry(&pool, "01.002").await;

    let ids = insert_elements(
        &pool,
        project.id,
        None,
        &[
            parsed_element("wall-1", &[("Beton", 1.5)]),
            parsed_element("slab-1", &[("Beton", 0.5)]),
        ],
    )
    .await;
    matching::apply_match(pool.connection(), project.id, &[ids["Beton"]], concrete.id, None)
        .await
        .unwrap();
    let before = reload_project(&pool, project.id).await;

    let txn = pool.connection().begin().await.unwrap();
    let (count, totals) = recalculation::recompute_all(&txn, project.id).await.unwrap();
    txn.commit().await.unwrap();

    assert_eq!(count, 2);
    assert_close(totals.gwp, before.gwp);
    assert_close(totals.ubp, before.ubp);
    assert_close(totals.penre, before.penre);
}
