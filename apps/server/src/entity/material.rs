//! Material entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    /// Material name as found in the IFC model, unique per project.
    pub name: String,
    pub catalog_entry_id: Option<Uuid>,
    /// Density in kg/m³ used for mass calculation.
    pub density: Option<f64>,
    pub auto_matched: bool,
    pub match_score: Option<f64>,
    pub matched_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::catalog_entry::Entity",
        from = "Column::CatalogEntryId",
        to = "super::catalog_entry::Column::Id",
        on_delete = "SetNull"
    )]
    CatalogEntry,
    #[sea_orm(has_many = "super::element_material::Entity")]
    Layers,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::catalog_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogEntry.def()
    }
}

impl Related<super::element_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
