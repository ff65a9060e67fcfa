//! Background processing of uploaded building models.
//!
//! An upload is created in `processing` by the HTTP handler, which then hands
//! the payload to [`UploadProcessor::spawn`] and replies immediately. The
//! spawned task persists the elements and matches new material names against
//! the catalog concurrently, applies the proposals and recalculates the
//! project. Whatever happens, the upload ends in a terminal state.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{DbPool, catalog_entries, elements, materials};
use crate::error::{AppError, AppResult};
use crate::models::{ParsedElement, UploadStatus};
use crate::services::ifc_client::IfcParser;
use crate::services::matching::{apply_proposals, auto_match_names};
use crate::services::recalculation;

/// Payload of an accepted upload.
pub enum UploadPayload {
    /// Raw IFC file, forwarded to the parsing service
    File(Vec<u8>),
    /// Element list parsed by the client
    Parsed(Vec<ParsedElement>),
}

/// Counts reported on a completed upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub element_count: u64,
    pub material_count: u64,
    pub auto_matched: u64,
}

/// Runs uploads in background tasks, bounded by a semaphore and a timeout.
#[derive(Clone)]
pub struct UploadProcessor {
    pool: DbPool,
    parser: Arc<dyn IfcParser>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    threshold: f64,
}

impl UploadProcessor {
    pub fn new(
        pool: DbPool,
        parser: Arc<dyn IfcParser>,
        max_concurrent: usize,
        timeout: Duration,
        threshold: f64,
    ) -> Self {
        Self {
            pool,
            parser,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
            threshold,
        }
    }

    /// Process the upload on a background task.
    ///
    /// The returned handle resolves once the upload reached a terminal state.
    pub fn spawn(
        &self,
        project_id: Uuid,
        upload_id: Uuid,
        filename: String,
        payload: UploadPayload,
    ) -> tokio::task::JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move {
            processor
                .run(project_id, upload_id, &filename, payload)
                .await;
        })
    }

    /// Process the upload and record the outcome on it.
    pub async fn run(
        &self,
        project_id: Uuid,
        upload_id: Uuid,
        filename: &str,
        payload: UploadPayload,
    ) {
        let outcome = match self.semaphore.clone().acquire_owned().await {
            Ok(_permit) => {
                match tokio::time::timeout(
                    self.timeout,
                    self.process(project_id, upload_id, filename, payload),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(AppError::Timeout(format!(
                        "processing exceeded {:?}",
                        self.timeout
                    ))),
                }
            }
            Err(_) => Err(AppError::Upstream(
                "upload processing is shutting down".to_string(),
            )),
        };

        let finished = match outcome {
            Ok(summary) => {
                info!(
                    upload_id = %upload_id,
                    project_id = %project_id,
                    elements = summary.element_count,
                    materials = summary.material_count,
                    auto_matched = summary.auto_matched,
                    "Upload processed"
                );
                self.pool
                    .finish_upload(
                        upload_id,
                        UploadStatus::Completed,
                        clamp_count(summary.element_count),
                        clamp_count(summary.material_count),
                        None,
                    )
                    .await
            }
            Err(e) => {
                warn!(upload_id = %upload_id, error = %e, "Upload processing failed");
                self.pool
                    .finish_upload(
                        upload_id,
                        UploadStatus::Failed,
                        0,
                        0,
                        Some(e.public_message()),
                    )
                    .await
            }
        };

        if let Err(e) = finished {
            error!(upload_id = %upload_id, error = %e, "Failed to record upload outcome");
        }
    }

    async fn process(
        &self,
        project_id: Uuid,
        upload_id: Uuid,
        filename: &str,
        payload: UploadPayload,
    ) -> AppResult<ProcessingSummary> {
        let parsed = match payload {
            UploadPayload::Parsed(elements) => elements,
            UploadPayload::File(bytes) => {
                let parsed = self.parser.parse(filename, bytes).await?;
                validate_parsed(&parsed)?;
                parsed
            }
        };
        let names = material_names(&parsed);

        let db = self.pool.connection();
        let persist = async {
            let ids = materials::find_or_create_by_names(db, project_id, &names).await?;
            elements::insert_parsed(db, project_id, Some(upload_id), &parsed, &ids).await
        };
        let propose = async {
            let catalog = catalog_entries::load_all(db).await?;
            let proposals = auto_match_names(&names, &catalog, self.threshold);
            Ok::<_, AppError>((proposals, catalog))
        };

        // No rollback: partial writes of the succeeding branch are kept
        let (persisted, proposed) = tokio::join!(persist, propose);
        let element_count = persisted?;
        let (proposals, catalog) = proposed?;

        let applied = apply_proposals(db, project_id, &proposals, &catalog).await?;
        recalculation::recompute_all(db, project_id).await?;

        Ok(ProcessingSummary {
            element_count,
            material_count: names.len() as u64,
            auto_matched: applied.proposals.len() as u64,
        })
    }

    /// Default threshold for automatic matching.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Distinct non-empty layer material names, sorted.
pub fn material_names(parsed: &[ParsedElement]) -> Vec<String> {
    parsed
        .iter()
        .flat_map(|e| e.materials.iter())
        .map(|layer| layer.name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn clamp_count(n: u64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Column limits of `elements.global_id` and `elements.ifc_type`.
const MAX_GLOBAL_ID_LEN: usize = 64;
const MAX_IFC_TYPE_LEN: usize = 100;

/// Reject parsed payloads the pipeline cannot store.
pub fn validate_parsed(parsed: &[ParsedElement]) -> AppResult<()> {
    for e in parsed {
        if e.global_id.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "element of type {} has an empty globalId",
                e.ifc_type
            )));
        }
        if e.global_id.chars().count() > MAX_GLOBAL_ID_LEN {
            return Err(AppError::InvalidInput(format!(
                "globalId {} exceeds {} characters",
                e.global_id, MAX_GLOBAL_ID_LEN
            )));
        }
        if e.ifc_type.chars().count() > MAX_IFC_TYPE_LEN {
            return Err(AppError::InvalidInput(format!(
                "type of element {} exceeds {} characters",
                e.global_id, MAX_IFC_TYPE_LEN
            )));
        }
    }
    Ok(())
}
