//! Business logic services.

pub mod api_key;
pub mod auth_admin;
pub mod calculator;
pub mod catalog_import;
pub mod deletion;
pub mod ifc_client;
pub mod matching;
pub mod processing;
pub mod projects;
pub mod recalculation;

pub use ifc_client::{HttpIfcParser, IfcParser};
pub use processing::{UploadPayload, UploadProcessor};
pub use auth_admin::configure_routes as configure_auth_routes;
