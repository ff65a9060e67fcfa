//! Reference catalog entry entity for SeaORM.
//!
//! Rows from KBOB, EC3 and OpenEPD share this table, discriminated by `source`.
//! Coefficients are per kg of material.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// kbob, ec3, openepd
    pub source: String,
    /// Identifier in the source dataset (e.g. KBOB "01.002").
    pub external_id: String,
    pub name: String,
    /// Normalized name used for search and automatic matching.
    pub name_normalized: String,
    pub category: Option<String>,
    pub gwp: Option<f64>,
    pub ubp: Option<f64>,
    pub penre: Option<f64>,
    pub density: Option<f64>,
    pub density_min: Option<f64>,
    pub density_max: Option<f64>,
    pub declared_unit: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub raw: Option<JsonValue>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::material::Entity")]
    Materials,
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
