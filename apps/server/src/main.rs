//! IFC LCA server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ifc_lca_lib::api::{self, ApiDoc, MaxUploadSize};
use ifc_lca_lib::auth::AdminKey;
use ifc_lca_lib::config::Config;
use ifc_lca_lib::db::DbPool;
use ifc_lca_lib::middleware::RequestLogger;
use ifc_lca_lib::services::{self, HttpIfcParser, UploadProcessor};

fn cors(is_development: bool) -> Cors {
    let cors = if is_development {
        Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
    } else {
        // Same-origin only
        Cors::default()
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-admin-key"),
        ])
        .expose_headers(vec![HeaderName::from_static("x-request-id")])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL must be set");
            error!("  - LCA_AUTO_MATCH_THRESHOLD must be within [0, 1]");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  IFC LCA Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    let processing = &config.processing;
    let timeout = Duration::from_secs(processing.timeout_secs);
    let parser = match HttpIfcParser::new(&processing.ifc_service_url, timeout) {
        Ok(parser) => parser,
        Err(e) => {
            error!("Failed to create IFC service client: {}", e);
            std::process::exit(1);
        }
    };
    let processor = UploadProcessor::new(
        pool.clone(),
        Arc::new(parser),
        processing.max_concurrent_uploads,
        timeout,
        processing.auto_match_threshold,
    );
    info!(
        "Upload limits: {}MB max size, {} concurrent, {}s timeout, IFC service at {}",
        processing.max_upload_size / 1024 / 1024,
        processing.max_concurrent_uploads,
        processing.timeout_secs,
        processing.ifc_service_url
    );

    let bind_address = config.bind_address();
    let admin_key = AdminKey::new(config.admin_key.clone());
    let max_upload_size = processing.max_upload_size;
    let is_development = config.is_development();
    let openapi = ApiDoc::openapi();

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    HttpServer::new(move || {
        App::new()
            // CORS must wrap outermost
            .wrap(cors(is_development))
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(admin_key.clone()))
            .app_data(web::Data::new(processor.clone()))
            .app_data(web::Data::new(MaxUploadSize(max_upload_size)))
            // Multipart overhead on top of the file itself
            .app_data(web::PayloadConfig::new(max_upload_size + 1024 * 1024))
            .configure(api::configure_extractors)
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_routes)
                    .configure(services::configure_auth_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
