//! API endpoint modules.

pub mod catalog;
pub mod elements;
pub mod health;
pub mod materials;
pub mod openapi;
pub mod projects;
pub mod uploads;

use actix_web::web;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use uploads::MaxUploadSize;

/// Maximum accepted JSON body, sized for large parsed models.
pub const JSON_LIMIT: usize = 64 * 1024 * 1024;

/// Decode a JSON body the client may omit. An empty body yields the default.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Register every project-scoped and catalog route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(projects::configure_routes)
        .configure(materials::configure_routes)
        .configure(elements::configure_routes)
        .configure(uploads::configure_routes)
        .configure(catalog::configure_routes);
}

/// Extractor settings that report malformed requests as `INVALID_INPUT`.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    );
}
