//! LCA E2E test suite.
//!
//! Exercises uploads, matching, recalculation and deletion against an
//! in-memory SQLite database, and the HTTP API through `actix_web::test`.
//!
//! Run with: cargo test --test lca_e2e

mod mock_ifc_service;
mod test_helpers;

mod test_catalog_import;
mod test_deletion;
mod test_http_api;
mod test_matching;
mod test_processing;
mod test_recalculation;
