//! Database queries for project materials.
//!
//! Every function takes a generic connection so the matching engine can run
//! it inside its transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    UpdateMany,
};
use uuid::Uuid;

use crate::entity::material::{self, ActiveModel, Entity as Material};
use crate::error::AppResult;

use super::IN_CHUNK_SIZE;

/// Catalog assignment written by a manual or automatic match.
#[derive(Debug, Clone, Copy)]
pub struct MatchAssignment {
    pub catalog_entry_id: Uuid,
    pub density: f64,
    /// `Some(score)` for automatic matches
    pub score: Option<f64>,
    pub matched_at: DateTime<Utc>,
}

pub async fn get_material<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    id: Uuid,
) -> AppResult<Option<material::Model>> {
    let result = Material::find_by_id(id)
        .filter(material::Column::ProjectId.eq(project_id))
        .one(conn)
        .await?;

    Ok(result)
}

pub async fn list_materials<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    unmatched_only: bool,
) -> AppResult<Vec<material::Model>> {
    let mut query = Material::find().filter(material::Column::ProjectId.eq(project_id));
    if unmatched_only {
        query = query.filter(material::Column::CatalogEntryId.is_null());
    }

    Ok(query.order_by_asc(material::Column::Name).all(conn).await?)
}

/// Load the materials with the given ids that belong to the project.
pub async fn find_in_project<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    ids: &[Uuid],
) -> AppResult<Vec<material::Model>> {
    let mut found = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let rows = Material::find()
            .filter(material::Column::ProjectId.eq(project_id))
            .filter(material::Column::Id.is_in(chunk.iter().copied()))
            .all(conn)
            .await?;
        found.extend(rows);
    }
    Ok(found)
}

pub async fn find_by_ids<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<Vec<material::Model>> {
    let mut found = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let rows = Material::find()
            .filter(material::Column::Id.is_in(chunk.iter().copied()))
            .all(conn)
            .await?;
        found.extend(rows);
    }
    Ok(found)
}

/// Find the project materials with the given names, creating missing ones.
///
/// Returns a name → material id map covering every requested name.
pub async fn find_or_create_by_names<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    names: &[String],
) -> AppResult<HashMap<String, Uuid>> {
    let mut ids = lookup_names(conn, project_id, names).await?;

    let now = Utc::now();
    let missing: Vec<ActiveModel> = names
        .iter()
        .filter(|name| !ids.contains_key(*name))
        .map(|name| ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            name: Set(name.clone()),
            catalog_entry_id: Set(None),
            density: Set(None),
            auto_matched: Set(false),
            match_score: Set(None),
            matched_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .collect();

    if missing.is_empty() {
        return Ok(ids);
    }

    // A concurrent upload may have created some of the names meanwhile
    for batch in missing.chunks(IN_CHUNK_SIZE) {
        Material::insert_many(batch.to_vec())
            .on_conflict(
                OnConflict::columns([material::Column::ProjectId, material::Column::Name])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    let created: Vec<String> = names
        .iter()
        .filter(|name| !ids.contains_key(*name))
        .cloned()
        .collect();
    ids.extend(lookup_names(conn, project_id, &created).await?);

    Ok(ids)
}

async fn lookup_names<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    names: &[String],
) -> AppResult<HashMap<String, Uuid>> {
    let mut ids = HashMap::with_capacity(names.len());
    for chunk in names.chunks(IN_CHUNK_SIZE) {
        let rows = Material::find()
            .filter(material::Column::ProjectId.eq(project_id))
            .filter(material::Column::Name.is_in(chunk.iter().cloned()))
            .all(conn)
            .await?;
        ids.extend(rows.into_iter().map(|m| (m.name, m.id)));
    }
    Ok(ids)
}

fn assignment_update(assignment: MatchAssignment) -> UpdateMany<Material> {
    Material::update_many()
        .col_expr(
            material::Column::CatalogEntryId,
            Expr::value(Some(assignment.catalog_entry_id)),
        )
        .col_expr(material::Column::Density, Expr::value(Some(assignment.density)))
        .col_expr(
            material::Column::AutoMatched,
            Expr::value(assignment.score.is_some()),
        )
        .col_expr(material::Column::MatchScore, Expr::value(assignment.score))
        .col_expr(
            material::Column::MatchedAt,
            Expr::value(Some(assignment.matched_at)),
        )
        .col_expr(material::Column::UpdatedAt, Expr::value(assignment.matched_at))
}

/// Write a catalog assignment to the given project materials.
///
/// Returns the number of materials updated.
pub async fn assign_match<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    ids: &[Uuid],
    assignment: MatchAssignment,
) -> AppResult<u64> {
    let mut updated = 0;
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let result = assignment_update(assignment)
            .filter(material::Column::ProjectId.eq(project_id))
            .filter(material::Column::Id.is_in(chunk.iter().copied()))
            .exec(conn)
            .await?;
        updated += result.rows_affected;
    }
    Ok(updated)
}

/// Assign a match only if the material is still unmatched.
pub async fn assign_if_unmatched<C: ConnectionTrait>(
    conn: &C,
    material_id: Uuid,
    assignment: MatchAssignment,
) -> AppResult<bool> {
    let result = assignment_update(assignment)
        .filter(material::Column::Id.eq(material_id))
        .filter(material::Column::CatalogEntryId.is_null())
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Clear the catalog assignment of a material.
pub async fn clear_match<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    id: Uuid,
) -> AppResult<u64> {
    let now = Utc::now();
    let active = ActiveModel {
        id: NotSet,
        project_id: NotSet,
        name: NotSet,
        catalog_entry_id: Set(None),
        density: Set(None),
        auto_matched: Set(false),
        match_score: Set(None),
        matched_at: Set(None),
        created_at: NotSet,
        updated_at: Set(now),
    };

    let result = Material::update_many()
        .set(active)
        .filter(material::Column::ProjectId.eq(project_id))
        .filter(material::Column::Id.eq(id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Delete a material. Its layers cascade.
pub async fn delete_material<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<bool> {
    let result = Material::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected > 0)
}
