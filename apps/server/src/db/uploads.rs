//! Database queries for uploads.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::upload::{self, ActiveModel, Entity as Upload};
use crate::error::{AppError, AppResult};
use crate::models::UploadStatus;

use super::DbPool;

impl DbPool {
    /// Insert a new upload in `processing`.
    pub async fn insert_upload(&self, project_id: Uuid, filename: &str) -> AppResult<upload::Model> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            filename: Set(filename.to_string()),
            status: Set(UploadStatus::Processing.as_str().to_string()),
            element_count: Set(0),
            material_count: Set(0),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert upload: {}", e)))
    }

    pub async fn get_upload(&self, id: Uuid) -> AppResult<Option<upload::Model>> {
        Ok(Upload::find_by_id(id).one(self.connection()).await?)
    }

    pub async fn list_uploads(&self, project_id: Uuid) -> AppResult<Vec<upload::Model>> {
        let uploads = Upload::find()
            .filter(upload::Column::ProjectId.eq(project_id))
            .order_by_desc(upload::Column::Id) // UUIDv7 is time-ordered
            .all(self.connection())
            .await?;

        Ok(uploads)
    }

    /// Move an upload from `processing` to a terminal status.
    ///
    /// The update is conditional on the stored status, so an upload that
    /// already finished is never overwritten. That case returns `Conflict`.
    pub async fn finish_upload(
        &self,
        id: Uuid,
        status: UploadStatus,
        element_count: i32,
        material_count: i32,
        error_message: Option<String>,
    ) -> AppResult<upload::Model> {
        if !UploadStatus::Processing.can_transition_to(status) {
            return Err(AppError::InvalidInput(format!(
                "{} is not a terminal upload status",
                status
            )));
        }

        let now = Utc::now();
        let result = Upload::update_many()
            .set(ActiveModel {
                status: Set(status.as_str().to_string()),
                element_count: Set(element_count),
                material_count: Set(material_count),
                error_message: Set(error_message),
                updated_at: Set(now),
                completed_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(upload::Column::Id.eq(id))
            .filter(upload::Column::Status.eq(UploadStatus::Processing.as_str()))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update upload status: {}", e)))?;

        let upload = self
            .get_upload(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {}", id)))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Upload {} is already {}",
                id, upload.status
            )));
        }
        Ok(upload)
    }
}

pub async fn delete_upload<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<bool> {
    let result = Upload::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected > 0)
}

/// An upload of the given project.
pub async fn find_in_project<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    id: Uuid,
) -> AppResult<Option<upload::Model>> {
    let result = Upload::find_by_id(id)
        .filter(upload::Column::ProjectId.eq(project_id))
        .one(conn)
        .await?;

    Ok(result)
}
