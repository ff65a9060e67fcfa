//! E2E tests: HTTP surface, authentication and ownership.

use std::time::Duration;

use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use super::test_helpers::*;

async fn setup() -> (
    ifc_lca_lib::db::DbPool,
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) {
    let pool = create_test_pool().await;
    let processor = create_processor(
        &pool,
        StubParser::new(StubBehavior::Fail("no parsing service in tests")),
        Duration::from_secs(10),
    );
    let app = create_test_app(&pool, processor).await;
    (pool, app)
}

fn project_id(body: &Value) -> String {
    body["id"].as_str().expect("project id missing").to_string()
}

#[actix_rt::test]
async fn test_health_needs_no_key() {
    let (_pool, app) = setup().await;

    let (status, body) = call_json(&app, test::TestRequest::get().uri("/api/v1/health"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, _) = call_json(&app, test::TestRequest::get().uri("/api/v1/ready"), None).await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_missing_or_unknown_key_is_unauthorized() {
    let (_pool, app) = setup().await;

    let (status, body) = call_json(&app, test::TestRequest::get().uri("/api/v1/projects"), None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = call_json(
        &app,
        test::TestRequest::get().uri("/api/v1/projects"),
        Some("lca_notarealkey0000000000000000000000"),
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_viewer_cannot_create_project() {
    let (_pool, app) = setup().await;
    let viewer = create_api_key(&app, "auditor", "viewer").await;

    let (status, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({ "name": "Schulhaus" })),
        Some(&viewer),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_rt::test]
async fn test_projects_are_private_to_their_owner() {
    let (_pool, app) = setup().await;
    let alice = create_api_key(&app, "alice", "contributor").await;
    let bob = create_api_key(&app, "bob", "contributor").await;

    let (status, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({ "name": "  Schulhaus  ", "description": "Neubau" })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["name"], "Schulhaus");
    let id = project_id(&body);

    let uri = format!("/api/v1/projects/{}", id);
    let (status, _) = call_json(&app, test::TestRequest::get().uri(&uri), Some(&alice)).await;
    assert_eq!(status, 200);

    let (status, body) = call_json(&app, test::TestRequest::get().uri(&uri), Some(&bob)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, body) =
        call_json(&app, test::TestRequest::get().uri("/api/v1/projects"), Some(&bob)).await;
    assert_eq!(status, 200);
    assert_eq!(body["projects"].as_array().unwrap().len(), 0);

    // Admins see every project
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY));
    let (status, _) = call_json(&app, req, None).await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_invalid_requests_are_bad_requests() {
    let (_pool, app) = setup().await;
    let alice = create_api_key(&app, "alice", "contributor").await;

    let (status, _) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({ "name": "   " })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = call_json(
        &app,
        test::TestRequest::get().uri("/api/v1/projects/not-a-uuid"),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

/// Malformed bodies are rejected, an omitted optional body is accepted.
#[actix_rt::test]
async fn test_malformed_bodies_are_bad_requests() {
    let (_pool, app) = setup().await;
    let alice = create_api_key(&app, "alice", "contributor").await;

    let (_, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({ "name": "Werkhof" })),
        Some(&alice),
    )
    .await;
    let id = project_id(&body);
    let auto_match = format!("/api/v1/projects/{}/materials/auto-match", id);

    let (status, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri(&auto_match)
            .set_json(json!({ "threshold": "high" })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 400, "{}", body);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = call_json(
        &app,
        test::TestRequest::post().uri(&auto_match),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 200, "{}", body);

    let (status, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/uploads/parsed", id))
            .set_json(json!({
                "filename": "werkhof.ifc",
                "elements": [
                    {"globalId": "g".repeat(65), "type": "IfcWall",
                     "materials": [{"name": "Beton C30/37", "volume": 1.0}]}
                ]
            })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 400, "{}", body);
    assert_eq!(body["error"], "INVALID_INPUT");
}

/// Parsed upload, manual match and emissions through the API.
#[actix_rt::test]
async fn test_parsed_upload_and_match_flow() {
    let (pool, app) = setup().await;
    let alice = create_api_key(&app, "alice", "contributor").await;
    let brick = catalog_entry(&pool, "02.001").await;

    let (_, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({ "name": "Schulhaus" })),
        Some(&alice),
    )
    .await;
    let id = project_id(&body);

    let (status, body) = call_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/projects/{}/uploads/parsed", id))
            .set_json(json!({
                "filename": "schulhaus.ifc",
                "elements": [
                    {"globalId": "w1", "type": "IfcWall", "volume": 2.0,
                     "materials": [{"name": "Mauerwerk", "volume": 2.0}]},
                    {"globalId": "s1", "type": "IfcSlab",
                     "materials": [{"name": "Beton C30/37", "volume": 1.0}]}
                ]
            })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 202, "{}", body);
    assert_eq!(body["status"], "processing");
    let upload_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let upload = wait_for_upload(&pool, upload_id).await;
    assert_eq!(upload.status, "completed", "{:?}", upload.error_message);

    let (status, body) = call_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/projects/{}/materials?unmatched=true", id)),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 200);
    let unmatched = body["materials"].as_array().unwrap();
    assert_eq!(unmatched.len(), 1);
    let material_id = unmatched[0]["id"].as_str().unwrap().to_string();

    let (status, body) = call_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/projects/{}/materials/{}/match", id, material_id))
            .set_json(json!({ "catalog_entry_id": brick.id, "density": 1200.0 })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["elements_recomputed"], 1);

    let (status, body) = call_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/projects/{}/emissions", id)),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["element_count"], 2);
    // Concrete 1 m³ × 2400 × 100 plus brick 2 m³ × 1200 × 0.25
    let gwp = body["totals"]["gwp"].as_f64().unwrap();
    assert_close(gwp, 240_600.0);
    assert_eq!(body["materials"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_catalog_listing() {
    let (_pool, app) = setup().await;
    let viewer = create_api_key(&app, "auditor", "viewer").await;

    let (status, body) = call_json(
        &app,
        test::TestRequest::get().uri("/api/v1/catalog?source=kbob"),
        Some(&viewer),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["entries"].as_array().unwrap().len(), 3);

    let (status, _) = call_json(
        &app,
        test::TestRequest::get().uri("/api/v1/catalog?source=unknown"),
        Some(&viewer),
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_only_admins_manage_keys() {
    let (_pool, app) = setup().await;
    let alice = create_api_key(&app, "alice", "contributor").await;

    let (status, _) = call_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/keys")
            .set_json(json!({ "name": "sneaky", "role": "admin" })),
        Some(&alice),
    )
    .await;
    assert_eq!(status, 403);

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/keys")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY));
    let (status, body) = call_json(&app, req, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["keys"].as_array().unwrap().len(), 1);
}
