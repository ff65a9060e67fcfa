//! SeaORM entity definitions for PostgreSQL database.

pub mod api_key;
pub mod catalog_entry;
pub mod deletion_record;
pub mod element;
pub mod element_material;
pub mod material;
pub mod project;
pub mod upload;
