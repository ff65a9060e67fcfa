//! Project ownership checks shared by every project-scoped endpoint.

use crate::db::DbPool;
use crate::entity::project;
use crate::error::{AppError, AppResult};
use crate::models::AuthenticatedCaller;
use uuid::Uuid;

/// Whether the caller may see the project.
pub fn can_access(caller: &AuthenticatedCaller, project: &project::Model) -> bool {
    caller.is_admin() || project.owner == caller.name
}

/// Load a project visible to the caller.
///
/// Projects owned by someone else are reported as missing.
pub async fn load_owned_project(
    pool: &DbPool,
    caller: &AuthenticatedCaller,
    project_id: Uuid,
) -> AppResult<project::Model> {
    pool.get_project(project_id)
        .await?
        .filter(|p| can_access(caller, p))
        .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))
}

/// Reject read-only callers.
pub fn require_writer(caller: &AuthenticatedCaller) -> AppResult<()> {
    if caller.can_write() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Viewer keys cannot modify projects".to_string(),
        ))
    }
}

/// Load a project the caller may modify.
pub async fn load_writable_project(
    pool: &DbPool,
    caller: &AuthenticatedCaller,
    project_id: Uuid,
) -> AppResult<project::Model> {
    require_writer(caller)?;
    load_owned_project(pool, caller, project_id).await
}
