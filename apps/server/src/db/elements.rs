//! Database queries for elements and their material layers.

use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::element::{self, Entity as Element};
use crate::entity::element_material::{self, Entity as Layer};
use crate::entity::material::{self, Entity as Material};
use crate::error::AppResult;
use crate::models::{Indicators, ParsedElement, layer_fraction};

use super::{DbPool, IN_CHUNK_SIZE};

/// Filters for element listings.
#[derive(Debug, Clone, Default)]
pub struct ElementFilter {
    pub ifc_type: Option<String>,
    pub include_archived: bool,
}

/// Persist parsed elements and their layers.
///
/// `material_ids` must contain an id for every layer material name.
/// Returns the number of elements written.
pub async fn insert_parsed<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    upload_id: Option<Uuid>,
    parsed: &[ParsedElement],
    material_ids: &HashMap<String, Uuid>,
) -> AppResult<u64> {
    let now = Utc::now();
    let mut elements = Vec::with_capacity(parsed.len());
    let mut layers = Vec::new();

    for p in parsed {
        let id = Uuid::now_v7();
        let volume = p.effective_volume();

        elements.push(element::ActiveModel {
            id: Set(id),
            project_id: Set(project_id),
            upload_id: Set(upload_id),
            global_id: Set(p.global_id.clone()),
            ifc_type: Set(p.ifc_type.clone()),
            name: Set(p.name.clone()),
            volume: Set(volume),
            archived: Set(false),
            gwp: Set(0.0),
            ubp: Set(0.0),
            penre: Set(0.0),
            created_at: Set(now),
            updated_at: Set(now),
        });

        for (position, layer) in p.materials.iter().enumerate() {
            let Some(material_id) = material_ids.get(layer.name.trim()) else {
                continue;
            };
            let layer_volume = if layer.volume.is_finite() && layer.volume > 0.0 {
                layer.volume
            } else {
                0.0
            };
            layers.push(element_material::ActiveModel {
                id: Set(Uuid::now_v7()),
                element_id: Set(id),
                material_id: Set(*material_id),
                position: Set(position as i32),
                volume: Set(layer_volume),
                fraction: Set(layer_fraction(layer_volume, volume)),
            });
        }
    }

    let count = elements.len() as u64;
    for batch in elements.chunks(IN_CHUNK_SIZE) {
        Element::insert_many(batch.to_vec())
            .exec_without_returning(conn)
            .await?;
    }
    for batch in layers.chunks(IN_CHUNK_SIZE) {
        Layer::insert_many(batch.to_vec())
            .exec_without_returning(conn)
            .await?;
    }

    Ok(count)
}

pub async fn get_element<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    id: Uuid,
) -> AppResult<Option<element::Model>> {
    let result = Element::find_by_id(id)
        .filter(element::Column::ProjectId.eq(project_id))
        .one(conn)
        .await?;

    Ok(result)
}

/// Layers of one element in position order, with their materials.
pub async fn layers_of_element<C: ConnectionTrait>(
    conn: &C,
    element_id: Uuid,
) -> AppResult<Vec<(element_material::Model, Option<material::Model>)>> {
    let rows = Layer::find()
        .filter(element_material::Column::ElementId.eq(element_id))
        .order_by_asc(element_material::Column::Position)
        .find_also_related(Material)
        .all(conn)
        .await?;

    Ok(rows)
}

/// Layers of several elements with their materials.
pub async fn layers_of_elements<C: ConnectionTrait>(
    conn: &C,
    element_ids: &[Uuid],
) -> AppResult<Vec<(element_material::Model, Option<material::Model>)>> {
    let mut rows = Vec::new();
    for chunk in element_ids.chunks(IN_CHUNK_SIZE) {
        let batch = Layer::find()
            .filter(element_material::Column::ElementId.is_in(chunk.iter().copied()))
            .order_by_asc(element_material::Column::ElementId)
            .order_by_asc(element_material::Column::Position)
            .find_also_related(Material)
            .all(conn)
            .await?;
        rows.extend(batch);
    }
    Ok(rows)
}

/// Layers of all non-archived elements of a project with their materials.
pub async fn active_layers_of_project<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<Vec<(element_material::Model, Option<material::Model>)>> {
    let rows = Layer::find()
        .inner_join(Element)
        .filter(element::Column::ProjectId.eq(project_id))
        .filter(element::Column::Archived.eq(false))
        .find_also_related(Material)
        .all(conn)
        .await?;

    Ok(rows)
}

/// Distinct ids of the elements having a layer of any of the materials.
pub async fn ids_referencing_materials<C: ConnectionTrait>(
    conn: &C,
    material_ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    let mut ids = BTreeSet::new();
    for chunk in material_ids.chunks(IN_CHUNK_SIZE) {
        let batch: Vec<Uuid> = Layer::find()
            .select_only()
            .column(element_material::Column::ElementId)
            .distinct()
            .filter(element_material::Column::MaterialId.is_in(chunk.iter().copied()))
            .into_tuple()
            .all(conn)
            .await?;
        ids.extend(batch);
    }
    Ok(ids.into_iter().collect())
}

pub async fn ids_of_project<C: ConnectionTrait>(conn: &C, project_id: Uuid) -> AppResult<Vec<Uuid>> {
    let ids = Element::find()
        .select_only()
        .column(element::Column::Id)
        .filter(element::Column::ProjectId.eq(project_id))
        .into_tuple()
        .all(conn)
        .await?;

    Ok(ids)
}

pub async fn ids_of_upload<C: ConnectionTrait>(conn: &C, upload_id: Uuid) -> AppResult<Vec<Uuid>> {
    let ids = Element::find()
        .select_only()
        .column(element::Column::Id)
        .filter(element::Column::UploadId.eq(upload_id))
        .into_tuple()
        .all(conn)
        .await?;

    Ok(ids)
}

pub async fn store_indicators<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    indicators: Indicators,
) -> AppResult<()> {
    Element::update_many()
        .col_expr(element::Column::Gwp, Expr::value(indicators.gwp))
        .col_expr(element::Column::Ubp, Expr::value(indicators.ubp))
        .col_expr(element::Column::Penre, Expr::value(indicators.penre))
        .col_expr(element::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(element::Column::Id.eq(id))
        .exec(conn)
        .await?;

    Ok(())
}

pub async fn set_archived<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    id: Uuid,
    archived: bool,
) -> AppResult<bool> {
    let result = Element::update_many()
        .col_expr(element::Column::Archived, Expr::value(archived))
        .col_expr(element::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(element::Column::ProjectId.eq(project_id))
        .filter(element::Column::Id.eq(id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Delete elements together with their layers. Returns the elements removed.
pub async fn delete_elements<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<u64> {
    let mut deleted = 0;
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        Layer::delete_many()
            .filter(element_material::Column::ElementId.is_in(chunk.iter().copied()))
            .exec(conn)
            .await?;
        let result = Element::delete_many()
            .filter(element::Column::Id.is_in(chunk.iter().copied()))
            .exec(conn)
            .await?;
        deleted += result.rows_affected;
    }
    Ok(deleted)
}

/// Remove every layer of a material.
pub async fn delete_layers_of_material<C: ConnectionTrait>(
    conn: &C,
    material_id: Uuid,
) -> AppResult<u64> {
    let result = Layer::delete_many()
        .filter(element_material::Column::MaterialId.eq(material_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

pub async fn count_active<C: ConnectionTrait>(conn: &C, project_id: Uuid) -> AppResult<u64> {
    let count = Element::find()
        .filter(element::Column::ProjectId.eq(project_id))
        .filter(element::Column::Archived.eq(false))
        .count(conn)
        .await?;

    Ok(count)
}

impl DbPool {
    /// Paginated element listing of a project.
    pub async fn list_elements(
        &self,
        project_id: Uuid,
        filter: &ElementFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<element::Model>, u64)> {
        let mut query = Element::find().filter(element::Column::ProjectId.eq(project_id));
        if !filter.include_archived {
            query = query.filter(element::Column::Archived.eq(false));
        }
        if let Some(ref ifc_type) = filter.ifc_type {
            query = query.filter(element::Column::IfcType.eq(ifc_type.as_str()));
        }

        let total = query.clone().count(self.connection()).await?;
        let elements = query
            .order_by_asc(element::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await?;

        Ok((elements, total))
    }
}
