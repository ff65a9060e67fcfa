//! E2E tests: upload processing pipeline.

use std::sync::Arc;
use std::time::Duration;

use ifc_lca_lib::db::materials;
use ifc_lca_lib::error::AppError;
use ifc_lca_lib::models::UploadStatus;
use ifc_lca_lib::services::{HttpIfcParser, IfcParser, UploadPayload};
use sea_orm::ConnectionTrait;

use super::mock_ifc_service::MockIfcService;
use super::test_helpers::*;

const TIMEOUT: Duration = Duration::from_secs(10);

/// A parsed upload completes, auto-matches known names and totals follow.
#[actix_rt::test]
async fn test_parsed_upload_completes() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(&pool, StubParser::new(StubBehavior::Fail("unused")), TIMEOUT);

    let upload = pool.insert_upload(project.id, "model.ifc").await.unwrap();
    let parsed = vec![
        parsed_element("wall-1", &[("Beton C30/37", 2.0)]),
        parsed_element("wall-2", &[("Beton C30/37", 1.0), ("Mystery", 1.0)]),
    ];
    processor
        .spawn(project.id, upload.id, "model.ifc".into(), UploadPayload::Parsed(parsed))
        .await
        .unwrap();

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "completed");
    assert_eq!(upload.element_count, 2);
    assert_eq!(upload.material_count, 2);
    assert!(upload.error_message.is_none());
    assert!(upload.completed_at.is_some());

    let unmatched = materials::list_materials(pool.connection(), project.id, true)
        .await
        .unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].name, "Mystery");

    // 3 m³ of concrete at the KBOB density
    assert_close(reload_project(&pool, project.id).await.gwp, 720_000.0);
}

/// A second upload reuses the project's materials.
#[actix_rt::test]
async fn test_materials_are_shared_between_uploads() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(&pool, StubParser::new(StubBehavior::Fail("unused")), TIMEOUT);

    for name in ["a.ifc", "b.ifc"] {
        let upload = pool.insert_upload(project.id, name).await.unwrap();
        let parsed = vec![parsed_element(name, &[("Steinwolle", 1.0)])];
        processor
            .spawn(project.id, upload.id, name.into(), UploadPayload::Parsed(parsed))
            .await
            .unwrap();
    }

    let all = materials::list_materials(pool.connection(), project.id, false)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(element_ids(&pool, project.id).await.len(), 2);
}

#[actix_rt::test]
async fn test_parser_failure_marks_upload_failed() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(
        &pool,
        StubParser::new(StubBehavior::Fail("geometry kernel crashed")),
        TIMEOUT,
    );

    let upload = pool.insert_upload(project.id, "model.ifc").await.unwrap();
    processor
        .spawn(project.id, upload.id, "model.ifc".into(), UploadPayload::File(b"ISO-10303-21;".to_vec()))
        .await
        .unwrap();

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "failed");
    // Parser details stay in the logs
    let message = upload.error_message.unwrap();
    assert_eq!(message, "A downstream service failed to process the request");
    assert!(!message.contains("geometry kernel crashed"));
    assert!(element_ids(&pool, project.id).await.is_empty());
}

/// When storing elements fails, the upload fails and the materials created
/// before the failure are kept.
#[actix_rt::test]
async fn test_persist_failure_keeps_partial_writes() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(&pool, StubParser::new(StubBehavior::Fail("unused")), TIMEOUT);

    pool.connection()
        .execute_unprepared(
            "CREATE TRIGGER reject_elements BEFORE INSERT ON elements \
             WHEN NEW.global_id = 'rejected' \
             BEGIN SELECT RAISE(ABORT, 'element rejected by trigger'); END",
        )
        .await
        .unwrap();

    let upload = pool.insert_upload(project.id, "model.ifc").await.unwrap();
    let parsed = vec![
        parsed_element("wall-1", &[("Beton C30/37", 2.0)]),
        parsed_element("rejected", &[("Glulam Timber", 1.0)]),
    ];
    processor
        .spawn(project.id, upload.id, "model.ifc".into(), UploadPayload::Parsed(parsed))
        .await
        .unwrap();

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "failed");
    let message = upload.error_message.unwrap();
    assert_eq!(message, "An internal database error occurred");
    assert!(!message.contains("trigger"));

    let names: Vec<String> = materials::list_materials(pool.connection(), project.id, false)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Beton C30/37", "Glulam Timber"]);
    assert!(element_ids(&pool, project.id).await.is_empty());
}

/// A finished upload never changes status again.
#[actix_rt::test]
async fn test_finished_upload_is_final() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let upload = pool.insert_upload(project.id, "model.ifc").await.unwrap();

    let done = pool
        .finish_upload(upload.id, UploadStatus::Completed, 3, 2, None)
        .await
        .unwrap();
    assert_eq!(done.status, "completed");

    let err = pool
        .finish_upload(upload.id, UploadStatus::Failed, 0, 0, Some("late".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "completed");
    assert_eq!(upload.element_count, 3);
    assert!(upload.error_message.is_none());

    assert!(matches!(
        pool.finish_upload(upload.id, UploadStatus::Processing, 0, 0, None)
            .await,
        Err(AppError::InvalidInput(_))
    ));
}

#[actix_rt::test]
async fn test_processing_timeout_marks_upload_failed() {
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let processor = create_processor(
        &pool,
        StubParser::new(StubBehavior::Hang(Duration::from_secs(30))),
        Duration::from_millis(50),
    );

    let upload = pool.insert_upload(project.id, "huge.ifc").await.unwrap();
    processor
        .spawn(project.id, upload.id, "huge.ifc".into(), UploadPayload::File(vec![1, 2, 3]))
        .await
        .unwrap();

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "failed");
    assert!(upload.error_message.unwrap().contains("exceeded"));
}

/// The HTTP parser talks to the parsing service.
#[actix_rt::test]
async fn test_http_parser_against_mock_service() {
    let mock = MockIfcService::start().await;
    let parser = HttpIfcParser::new(&mock.base_url, Duration::from_secs(5)).unwrap();

    let elements = parser
        .parse("house.ifc", b"ISO-10303-21;".to_vec())
        .await
        .unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].ifc_type, "IfcWall");
    assert_eq!(elements[1].materials[0].name, "Beton C30/37");
    // Missing volume falls back to the layer sum
    assert_eq!(elements[1].effective_volume(), 4.0);

    let err = parser
        .parse("broken.ifc", b"garbage".to_vec())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("422"));
}

/// File uploads go through the parsing service end to end.
#[actix_rt::test]
async fn test_file_upload_through_parsing_service() {
    let mock = MockIfcService::start().await;
    let pool = create_test_pool().await;
    let project = create_project(&pool, "alice").await;
    let parser = HttpIfcParser::new(&mock.base_url, Duration::from_secs(5)).unwrap();
    let processor = create_processor(&pool, Arc::new(parser), TIMEOUT);

    let upload = pool.insert_upload(project.id, "house.ifc").await.unwrap();
    processor
        .spawn(project.id, upload.id, "house.ifc".into(), UploadPayload::File(b"ISO-10303-21;".to_vec()))
        .await
        .unwrap();

    let upload = pool.get_upload(upload.id).await.unwrap().unwrap();
    assert_eq!(upload.status, "completed");
    assert_eq!(upload.element_count, 2);
    assert_eq!(upload.material_count, 2);

    // Concrete 6 m³ × 2400 × 100 plus rock wool 1 m³ × 60 × 1.2
    assert_close(reload_project(&pool, project.id).await.gwp, 1_440_072.0);
}
