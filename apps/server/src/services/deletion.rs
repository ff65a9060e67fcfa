//! Audited deletion of elements, materials and uploads.
//!
//! Each delete writes a deletion record with a JSON snapshot of the removed
//! row and recalculates what it affected, all in one transaction.

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::{Value as JsonValue, json};
use tracing::info;
use uuid::Uuid;

use crate::db::deletion_records::{self, NewDeletionRecord};
use crate::db::{elements, materials, uploads};
use crate::entity::{element, element_material, material, upload};
use crate::error::{AppError, AppResult};
use crate::models::{DeleteResponse, DeletedEntity, UploadStatus};
use crate::services::recalculation;

fn element_snapshot(e: &element::Model, layers: &[element_material::Model]) -> JsonValue {
    json!({
        "global_id": e.global_id,
        "ifc_type": e.ifc_type,
        "name": e.name,
        "upload_id": e.upload_id,
        "volume": e.volume,
        "archived": e.archived,
        "gwp": e.gwp,
        "ubp": e.ubp,
        "penre": e.penre,
        "layers": layers
            .iter()
            .map(|l| json!({
                "material_id": l.material_id,
                "position": l.position,
                "volume": l.volume,
                "fraction": l.fraction,
            }))
            .collect::<Vec<_>>(),
    })
}

fn material_snapshot(m: &material::Model, element_ids: &[Uuid]) -> JsonValue {
    json!({
        "name": m.name,
        "catalog_entry_id": m.catalog_entry_id,
        "density": m.density,
        "auto_matched": m.auto_matched,
        "match_score": m.match_score,
        "matched_at": m.matched_at,
        "element_ids": element_ids,
    })
}

fn upload_snapshot(u: &upload::Model, element_ids: &[Uuid]) -> JsonValue {
    json!({
        "filename": u.filename,
        "status": u.status,
        "element_count": u.element_count,
        "material_count": u.material_count,
        "error_message": u.error_message,
        "created_at": u.created_at,
        "completed_at": u.completed_at,
        "element_ids": element_ids,
    })
}

/// Delete one element and its layers, then update the project totals.
pub async fn delete_element(
    db: &DatabaseConnection,
    project_id: Uuid,
    element_id: Uuid,
    reason: String,
    deleted_by: &str,
) -> AppResult<DeleteResponse> {
    let txn = db.begin().await?;

    let element = elements::get_element(&txn, project_id, element_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Element {}", element_id)))?;
    let layers: Vec<element_material::Model> = elements::layers_of_element(&txn, element_id)
        .await?
        .into_iter()
        .map(|(layer, _)| layer)
        .collect();

    let record = deletion_records::insert(
        &txn,
        NewDeletionRecord {
            project_id,
            entity_type: DeletedEntity::Element,
            entity_id: element_id,
            entity_name: element.name.clone().or_else(|| Some(element.global_id.clone())),
            reason,
            deleted_by: deleted_by.to_string(),
            snapshot: Some(element_snapshot(&element, &layers)),
        },
    )
    .await?;

    elements::delete_elements(&txn, &[element_id]).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    info!(project_id = %project_id, element_id = %element_id, deleted_by, "Element deleted");

    Ok(DeleteResponse {
        deleted: element_id,
        deletion_record_id: record.id,
        elements_recomputed: 0,
    })
}

/// Delete a material with its layers and recompute the elements that used it.
pub async fn delete_material(
    db: &DatabaseConnection,
    project_id: Uuid,
    material_id: Uuid,
    reason: String,
    deleted_by: &str,
) -> AppResult<DeleteResponse> {
    let txn = db.begin().await?;

    let material = materials::get_material(&txn, project_id, material_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Material {}", material_id)))?;
    let affected = elements::ids_referencing_materials(&txn, &[material_id]).await?;

    let record = deletion_records::insert(
        &txn,
        NewDeletionRecord {
            project_id,
            entity_type: DeletedEntity::Material,
            entity_id: material_id,
            entity_name: Some(material.name.clone()),
            reason,
            deleted_by: deleted_by.to_string(),
            snapshot: Some(material_snapshot(&material, &affected)),
        },
    )
    .await?;

    elements::delete_layers_of_material(&txn, material_id).await?;
    materials::delete_material(&txn, material_id).await?;
    let elements_recomputed = recalculation::recompute_elements(&txn, &affected).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    info!(
        project_id = %project_id,
        material_id = %material_id,
        elements_recomputed,
        deleted_by,
        "Material deleted"
    );

    Ok(DeleteResponse {
        deleted: material_id,
        deletion_record_id: record.id,
        elements_recomputed,
    })
}

/// Delete a terminal upload and every element it created.
pub async fn delete_upload(
    db: &DatabaseConnection,
    project_id: Uuid,
    upload_id: Uuid,
    reason: String,
    deleted_by: &str,
) -> AppResult<DeleteResponse> {
    let txn = db.begin().await?;

    let upload = uploads::find_in_project(&txn, project_id, upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {}", upload_id)))?;
    if !UploadStatus::parse(&upload.status).is_some_and(|s| s.is_terminal()) {
        return Err(AppError::Conflict(format!(
            "Upload {} is still processing",
            upload_id
        )));
    }

    let element_ids = elements::ids_of_upload(&txn, upload_id).await?;
    let record = deletion_records::insert(
        &txn,
        NewDeletionRecord {
            project_id,
            entity_type: DeletedEntity::Upload,
            entity_id: upload_id,
            entity_name: Some(upload.filename.clone()),
            reason,
            deleted_by: deleted_by.to_string(),
            snapshot: Some(upload_snapshot(&upload, &element_ids)),
        },
    )
    .await?;

    let removed = elements::delete_elements(&txn, &element_ids).await?;
    uploads::delete_upload(&txn, upload_id).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    info!(
        project_id = %project_id,
        upload_id = %upload_id,
        elements_removed = removed,
        deleted_by,
        "Upload deleted"
    );

    Ok(DeleteResponse {
        deleted: upload_id,
        deletion_record_id: record.id,
        elements_recomputed: 0,
    })
}
