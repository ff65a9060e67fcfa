//! Shared test helpers for LCA E2E tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, dev::ServiceResponse, test, web};
use async_trait::async_trait;
use ifc_lca_lib::api::{self, MaxUploadSize};
use ifc_lca_lib::auth::AdminKey;
use ifc_lca_lib::db::{DbPool, catalog_entries, elements, materials};
use ifc_lca_lib::entity::{
    api_key, catalog_entry, deletion_record, element, element_material, material, project, upload,
};
use ifc_lca_lib::error::{AppError, AppResult};
use ifc_lca_lib::models::{CatalogEntry, ParsedElement, ParsedMaterialLayer};
use ifc_lca_lib::services::catalog_import;
use ifc_lca_lib::services::{IfcParser, UploadProcessor, configure_auth_routes};
use sea_orm::sea_query::{SqliteQueryBuilder, TableCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbBackend, EntityTrait, Schema};
use serde_json::Value;
use uuid::Uuid;

/// Admin key used in tests.
pub const TEST_ADMIN_KEY: &str = "test-admin-key-for-lca-e2e";

/// Default auto-match threshold of test processors.
pub const TEST_THRESHOLD: f64 = 0.8;

/// Catalog used by every test.
///
/// Coefficients are per kg. Concrete has a KBOB density of 2400 kg/m³.
const TEST_CATALOG: &str = r#"[
    {"source": "kbob", "external_id": "01.002", "name": "Beton C30/37",
     "gwp": 100.0, "ubp": 50.0, "penre": 10.0, "density": 2400.0},
    {"source": "kbob", "external_id": "02.001", "name": "Backstein",
     "gwp": 0.25, "ubp": 400.0, "penre": 3.0, "density_min": 1100.0, "density_max": 1500.0},
    {"source": "kbob", "external_id": "06.012", "name": "Steinwolle",
     "gwp": 1.2, "ubp": 1500.0, "penre": 20.0, "density": 60.0},
    {"source": "ec3", "external_id": "ec3-timber-01", "name": "Glulam Timber",
     "gwp": 0.4, "penre": 5.0, "density": 470.0}
]"#;

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> String {
    let stmt: TableCreateStatement = schema.create_table_from_entity(entity);
    stmt.to_string(SqliteQueryBuilder)
}

/// Fresh in-memory database with every table and a seeded catalog.
pub async fn create_test_pool() -> DbPool {
    // A single connection keeps the in-memory database alive and shared
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .expect("Failed to open in-memory SQLite database");

    let schema = Schema::new(DbBackend::Sqlite);
    let statements = [
        table(&schema, api_key::Entity),
        table(&schema, project::Entity),
        table(&schema, catalog_entry::Entity),
        table(&schema, upload::Entity),
        table(&schema, material::Entity),
        table(&schema, element::Entity),
        table(&schema, element_material::Entity),
        table(&schema, deletion_record::Entity),
        "CREATE UNIQUE INDEX idx_materials_project_name ON materials (project_id, name)"
            .to_string(),
    ];
    for sql in statements {
        conn.execute_unprepared(&sql)
            .await
            .unwrap_or_else(|e| panic!("Failed to create schema ({}): {}", sql, e));
    }

    let records = catalog_import::parse_records(TEST_CATALOG).expect("Invalid test catalog");
    catalog_import::import_records(&conn, &records, None)
        .await
        .expect("Failed to seed catalog");

    DbPool::from_connection(conn)
}

/// Seeded catalog entry by external id.
pub async fn catalog_entry(pool: &DbPool, external_id: &str) -> CatalogEntry {
    catalog_entries::load_all(pool.connection())
        .await
        .expect("Failed to load catalog")
        .into_iter()
        .find(|e| e.external_id == external_id)
        .unwrap_or_else(|| panic!("Catalog entry {} not seeded", external_id))
}

/// Parsed element with one layer per `(material, volume)` pair.
pub fn parsed_element(global_id: &str, layers: &[(&str, f64)]) -> ParsedElement {
    ParsedElement {
        global_id: global_id.to_string(),
        ifc_type: "IfcWall".to_string(),
        name: Some(format!("Wall {}", global_id)),
        volume: Some(layers.iter().map(|(_, v)| v).sum()),
        materials: layers
            .iter()
            .map(|(name, volume)| ParsedMaterialLayer {
                name: name.to_string(),
                volume: *volume,
            })
            .collect(),
    }
}

/// Store parsed elements in a project the way an upload does.
///
/// Returns the material name → id map.
pub async fn insert_elements(
    pool: &DbPool,
    project_id: Uuid,
    upload_id: Option<Uuid>,
    parsed: &[ParsedElement],
) -> HashMap<String, Uuid> {
    let names = ifc_lca_lib::services::processing::material_names(parsed);
    let conn = pool.connection();
    let ids = materials::find_or_create_by_names(conn, project_id, &names)
        .await
        .expect("Failed to create materials");
    elements::insert_parsed(conn, project_id, upload_id, parsed, &ids)
        .await
        .expect("Failed to insert elements");
    ids
}

pub async fn create_project(pool: &DbPool, owner: &str) -> project::Model {
    pool.insert_project("Test building", None, owner)
        .await
        .expect("Failed to create project")
}

pub async fn reload_project(pool: &DbPool, id: Uuid) -> project::Model {
    pool.get_project(id)
        .await
        .expect("Failed to load project")
        .expect("Project disappeared")
}

pub async fn reload_element(pool: &DbPool, project_id: Uuid, id: Uuid) -> element::Model {
    elements::get_element(pool.connection(), project_id, id)
        .await
        .expect("Failed to load element")
        .expect("Element disappeared")
}

pub async fn element_ids(pool: &DbPool, project_id: Uuid) -> Vec<Uuid> {
    elements::ids_of_project(pool.connection(), project_id)
        .await
        .expect("Failed to list elements")
}

pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-6 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// How a [`StubParser`] answers.
#[derive(Clone)]
pub enum StubBehavior {
    Elements(Vec<ParsedElement>),
    Fail(&'static str),
    Hang(Duration),
}

/// In-process [`IfcParser`] with a canned answer.
pub struct StubParser {
    behavior: StubBehavior,
}

impl StubParser {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self { behavior })
    }
}

#[async_trait]
impl IfcParser for StubParser {
    async fn parse(&self, _filename: &str, _bytes: Vec<u8>) -> AppResult<Vec<ParsedElement>> {
        match &self.behavior {
            StubBehavior::Elements(elements) => Ok(elements.clone()),
            StubBehavior::Fail(message) => Err(AppError::Upstream(message.to_string())),
            StubBehavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn create_processor(
    pool: &DbPool,
    parser: Arc<dyn IfcParser>,
    timeout: Duration,
) -> UploadProcessor {
    UploadProcessor::new(pool.clone(), parser, 2, timeout, TEST_THRESHOLD)
}

/// Create a test LCA app.
pub async fn create_test_app(
    pool: &DbPool,
    processor: UploadProcessor,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let admin_key = AdminKey::new(Some(TEST_ADMIN_KEY.to_string()));

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(admin_key))
            .app_data(web::Data::new(processor))
            .app_data(web::Data::new(MaxUploadSize(1024 * 1024)))
            .configure(api::configure_extractors)
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_routes)
                    .configure(configure_auth_routes),
            ),
    )
    .await
}

/// Create an API key via the admin API and return the full key.
pub async fn create_api_key<S>(app: &S, name: &str, role: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/keys")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
        .set_json(serde_json::json!({ "name": name, "role": role }))
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(status.as_u16(), 201, "Failed to create key: {}", body);

    body["key"]
        .as_str()
        .expect("key missing from response")
        .to_string()
}

/// Send a request with an API key and return status and JSON body.
///
/// Empty bodies come back as `Value::Null`.
pub async fn call_json<S>(app: &S, req: test::TestRequest, key: Option<&str>) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = match key {
        Some(key) => req.insert_header(("X-API-Key", key)),
        None => req,
    };

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Poll an upload until it leaves `processing`.
pub async fn wait_for_upload(pool: &DbPool, upload_id: Uuid) -> upload::Model {
    for _ in 0..200 {
        let upload = pool
            .get_upload(upload_id)
            .await
            .expect("Failed to load upload")
            .expect("Upload disappeared");
        if upload.status != "processing" {
            return upload;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Upload {} never finished", upload_id);
}
