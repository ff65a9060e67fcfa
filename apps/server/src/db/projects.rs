//! Database queries for projects.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::element;
use crate::entity::project::{self, ActiveModel, Entity as Project};
use crate::error::{AppError, AppResult};
use crate::models::Indicators;

use super::DbPool;

/// Result row of the grouped indicator reduction.
#[derive(Debug, FromQueryResult)]
struct IndicatorSums {
    gwp: Option<f64>,
    ubp: Option<f64>,
    penre: Option<f64>,
}

impl DbPool {
    pub async fn insert_project(
        &self,
        name: &str,
        description: Option<String>,
        owner: &str,
    ) -> AppResult<project::Model> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            description: Set(description),
            owner: Set(owner.to_string()),
            gwp: Set(0.0),
            ubp: Set(0.0),
            penre: Set(0.0),
            last_calculated: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert project: {}", e)))
    }

    pub async fn get_project(&self, id: Uuid) -> AppResult<Option<project::Model>> {
        Ok(Project::find_by_id(id).one(self.connection()).await?)
    }

    /// List projects, newest first. `owner = None` lists every project.
    pub async fn list_projects(
        &self,
        owner: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<project::Model>, u64)> {
        let mut query = Project::find();
        if let Some(owner) = owner {
            query = query.filter(project::Column::Owner.eq(owner));
        }

        let total = query.clone().count(self.connection()).await?;
        let projects = query
            .order_by_desc(project::Column::Id) // UUIDv7 is time-ordered
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await?;

        Ok((projects, total))
    }

    pub async fn update_project(
        &self,
        project: project::Model,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<project::Model> {
        let mut active: ActiveModel = project.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update project: {}", e)))
    }

    /// Delete a project. Uploads, elements, layers and materials cascade.
    pub async fn delete_project(&self, id: Uuid) -> AppResult<bool> {
        let result = Project::delete_by_id(id).exec(self.connection()).await?;
        Ok(result.rows_affected > 0)
    }
}

/// Sum the indicators of all non-archived elements of a project.
pub async fn sum_element_indicators<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<Indicators> {
    let sums = element::Entity::find()
        .select_only()
        .column_as(Func::sum(Expr::col(element::Column::Gwp)), "gwp")
        .column_as(Func::sum(Expr::col(element::Column::Ubp)), "ubp")
        .column_as(Func::sum(Expr::col(element::Column::Penre)), "penre")
        .filter(element::Column::ProjectId.eq(project_id))
        .filter(element::Column::Archived.eq(false))
        .into_model::<IndicatorSums>()
        .one(conn)
        .await?;

    // SUM over zero rows is NULL
    Ok(sums
        .map(|s| {
            Indicators::new(
                s.gwp.unwrap_or(0.0),
                s.ubp.unwrap_or(0.0),
                s.penre.unwrap_or(0.0),
            )
        })
        .unwrap_or_default())
}

/// Store aggregated indicators on the project and stamp `last_calculated`.
pub async fn store_totals<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    totals: Indicators,
) -> AppResult<()> {
    let now = Utc::now();
    let result = Project::update_many()
        .col_expr(project::Column::Gwp, Expr::value(totals.gwp))
        .col_expr(project::Column::Ubp, Expr::value(totals.ubp))
        .col_expr(project::Column::Penre, Expr::value(totals.penre))
        .col_expr(project::Column::LastCalculated, Expr::value(Some(now)))
        .col_expr(project::Column::UpdatedAt, Expr::value(now))
        .filter(project::Column::Id.eq(project_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("Project {}", project_id)));
    }

    Ok(())
}
