//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261002_000001_create_api_keys;
mod m20261002_000002_create_projects;
mod m20261002_000003_create_catalog_entries;
mod m20261002_000004_create_uploads;
mod m20261002_000005_create_materials;
mod m20261002_000006_create_elements;
mod m20261002_000007_create_element_materials;
mod m20261002_000008_create_deletion_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261002_000001_create_api_keys::Migration),
            Box::new(m20261002_000002_create_projects::Migration),
            Box::new(m20261002_000003_create_catalog_entries::Migration),
            Box::new(m20261002_000004_create_uploads::Migration),
            Box::new(m20261002_000005_create_materials::Migration),
            Box::new(m20261002_000006_create_elements::Migration),
            Box::new(m20261002_000007_create_element_materials::Migration),
            Box::new(m20261002_000008_create_deletion_records::Migration),
        ]
    }
}
