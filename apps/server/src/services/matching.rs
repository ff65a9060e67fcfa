//! Material matching engine.
//!
//! Manual matches (single, bulk, individual) and automatic name matching of
//! project materials against the reference catalogs. Every database mutation
//! runs in one transaction together with the recalculation it triggers.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::catalog_entries;
use crate::db::materials::{self, MatchAssignment};
use crate::entity::material;
use crate::error::{AppError, AppResult};
use crate::models::{
    AutoMatchProposal, AutoMatchResponse, CatalogEntry, ImpactSource, MatchResultResponse,
    MaterialMatch,
};
use crate::services::recalculation;

/// Density used when neither the request nor the catalog provides one, kg/m³.
pub const FALLBACK_DENSITY: f64 = 1000.0;

/// Lowercase, trim and collapse every run of non-alphanumeric characters
/// into a single space.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance similarity in [0, 1].
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Dice coefficient over the whitespace-separated token sets.
pub fn token_dice(a: &str, b: &str) -> f64 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let shared = ta.intersection(&tb).count();
    2.0 * shared as f64 / (ta.len() + tb.len()) as f64
}

/// Similarity of two normalized names.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    levenshtein_ratio(a, b).max(token_dice(a, b))
}

/// Density to store with a match: positive override, else catalog default,
/// else [`FALLBACK_DENSITY`].
pub fn resolve_density(requested: Option<f64>, entry: &impl ImpactSource) -> f64 {
    requested
        .filter(|d| d.is_finite() && *d > 0.0)
        .or_else(|| entry.default_density())
        .unwrap_or(FALLBACK_DENSITY)
}

/// Best catalog candidate for a material name at or above `threshold`.
///
/// Highest score wins. Ties go to the smallest external id, then the
/// smallest entry id.
pub fn best_match<'a>(
    name: &str,
    catalog: &'a [CatalogEntry],
    threshold: f64,
) -> Option<(&'a CatalogEntry, f64)> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return None;
    }

    catalog
        .iter()
        .map(|entry| (entry, similarity(&normalized, &entry.name_normalized)))
        .filter(|(_, score)| *score >= threshold)
        .min_by(|(ea, sa), (eb, sb)| {
            sb.total_cmp(sa)
                .then_with(|| ea.external_id.cmp(&eb.external_id))
                .then_with(|| ea.id.cmp(&eb.id))
        })
}

/// Propose catalog matches for material names without touching the database.
///
/// Names are deduplicated; the result is ordered by name.
pub fn auto_match_names(
    names: &[String],
    catalog: &[CatalogEntry],
    threshold: f64,
) -> Vec<AutoMatchProposal> {
    names
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|name| {
            best_match(name, catalog, threshold).map(|(entry, score)| AutoMatchProposal {
                material_name: name.clone(),
                catalog_entry_id: entry.id,
                catalog_name: entry.name.clone(),
                score,
            })
        })
        .collect()
}

/// Reject thresholds outside [0, 1].
pub fn validate_threshold(threshold: f64) -> AppResult<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(AppError::InvalidInput(format!(
            "threshold must be between 0 and 1, got {}",
            threshold
        )))
    }
}

async fn load_catalog_entry<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<CatalogEntry> {
    let model = catalog_entries::get_entry(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Catalog entry {}", id)))?;

    CatalogEntry::from_model(&model)
        .ok_or_else(|| AppError::InvalidInput(format!("Catalog entry {} has unknown source", id)))
}

/// Every requested id must belong to the project.
fn ensure_all_found(ids: &[Uuid], found: &[material::Model]) -> AppResult<()> {
    let known: BTreeSet<Uuid> = found.iter().map(|m| m.id).collect();
    match ids.iter().find(|id| !known.contains(*id)) {
        Some(missing) => Err(AppError::NotFound(format!("Material {}", missing))),
        None => Ok(()),
    }
}

/// Match several materials to the same catalog entry.
pub async fn apply_match(
    db: &DatabaseConnection,
    project_id: Uuid,
    material_ids: &[Uuid],
    catalog_entry_id: Uuid,
    density: Option<f64>,
) -> AppResult<MatchResultResponse> {
    if material_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "material_ids must not be empty".to_string(),
        ));
    }
    let ids: Vec<Uuid> = material_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let txn = db.begin().await?;

    let entry = load_catalog_entry(&txn, catalog_entry_id).await?;
    let found = materials::find_in_project(&txn, project_id, &ids).await?;
    ensure_all_found(&ids, &found)?;

    let assignment = MatchAssignment {
        catalog_entry_id,
        density: resolve_density(density, &entry),
        score: None,
        matched_at: Utc::now(),
    };
    let materials_updated = materials::assign_match(&txn, project_id, &ids, assignment).await?;
    let elements_recomputed = recalculation::recompute_elements_for_materials(&txn, &ids).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    info!(
        project_id = %project_id,
        catalog_entry_id = %catalog_entry_id,
        materials_updated,
        elements_recomputed,
        "Materials matched"
    );

    Ok(MatchResultResponse {
        materials_updated,
        elements_recomputed,
    })
}

/// Match each material to its own catalog entry.
///
/// A material listed twice keeps the last pair.
pub async fn apply_individual_matches(
    db: &DatabaseConnection,
    project_id: Uuid,
    matches: &[MaterialMatch],
) -> AppResult<MatchResultResponse> {
    if matches.is_empty() {
        return Err(AppError::InvalidInput("matches must not be empty".to_string()));
    }

    let mut latest: HashMap<Uuid, &MaterialMatch> = HashMap::with_capacity(matches.len());
    for m in matches {
        latest.insert(m.material_id, m);
    }
    let ids: Vec<Uuid> = latest.keys().copied().collect::<BTreeSet<_>>().into_iter().collect();

    let txn = db.begin().await?;

    let found = materials::find_in_project(&txn, project_id, &ids).await?;
    ensure_all_found(&ids, &found)?;

    let mut entries: HashMap<Uuid, CatalogEntry> = HashMap::new();
    let now = Utc::now();
    let mut materials_updated = 0;
    for id in &ids {
        let m = latest[id];
        if !entries.contains_key(&m.catalog_entry_id) {
            let entry = load_catalog_entry(&txn, m.catalog_entry_id).await?;
            entries.insert(m.catalog_entry_id, entry);
        }
        let entry = &entries[&m.catalog_entry_id];

        let assignment = MatchAssignment {
            catalog_entry_id: m.catalog_entry_id,
            density: resolve_density(m.density, entry),
            score: None,
            matched_at: now,
        };
        materials_updated +=
            materials::assign_match(&txn, project_id, std::slice::from_ref(id), assignment).await?;
    }

    let elements_recomputed = recalculation::recompute_elements_for_materials(&txn, &ids).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    info!(
        project_id = %project_id,
        materials_updated,
        elements_recomputed,
        "Individual matches applied"
    );

    Ok(MatchResultResponse {
        materials_updated,
        elements_recomputed,
    })
}

/// Clear the catalog match of a material and recompute its elements.
pub async fn remove_match(
    db: &DatabaseConnection,
    project_id: Uuid,
    material_id: Uuid,
) -> AppResult<MatchResultResponse> {
    let txn = db.begin().await?;

    let materials_updated = materials::clear_match(&txn, project_id, material_id).await?;
    if materials_updated == 0 {
        return Err(AppError::NotFound(format!("Material {}", material_id)));
    }
    let elements_recomputed =
        recalculation::recompute_elements_for_materials(&txn, &[material_id]).await?;
    recalculation::recompute_project(&txn, project_id).await?;

    txn.commit().await?;

    Ok(MatchResultResponse {
        materials_updated,
        elements_recomputed,
    })
}

/// Automatically match every unmatched material of a project.
pub async fn auto_match(
    db: &DatabaseConnection,
    project_id: Uuid,
    threshold: f64,
) -> AppResult<AutoMatchResponse> {
    let threshold = validate_threshold(threshold)?;

    let unmatched = materials::list_materials(db, project_id, true).await?;
    let names: Vec<String> = unmatched.iter().map(|m| m.name.clone()).collect();
    let catalog = catalog_entries::load_all(db).await?;
    let proposals = auto_match_names(&names, &catalog, threshold);

    let txn = db.begin().await?;
    let applied = apply_proposals(&txn, project_id, &proposals, &catalog).await?;
    recalculation::recompute_project(&txn, project_id).await?;
    txn.commit().await?;

    let matched_names: BTreeSet<&str> = applied
        .proposals
        .iter()
        .map(|p| p.material_name.as_str())
        .collect();
    let still_unmatched = names
        .iter()
        .filter(|n| !matched_names.contains(n.as_str()))
        .cloned()
        .collect();

    info!(
        project_id = %project_id,
        threshold,
        matched = applied.proposals.len(),
        "Automatic matching finished"
    );

    Ok(AutoMatchResponse {
        threshold,
        matched: applied.proposals,
        unmatched: still_unmatched,
        elements_recomputed: applied.elements_recomputed,
    })
}

/// Proposals written to the database.
#[derive(Debug, Default)]
pub struct AppliedProposals {
    pub proposals: Vec<AutoMatchProposal>,
    pub elements_recomputed: u64,
}

/// Write proposals to materials that are still unmatched and recompute the
/// affected elements. The project aggregate is left to the caller.
pub async fn apply_proposals<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    proposals: &[AutoMatchProposal],
    catalog: &[CatalogEntry],
) -> AppResult<AppliedProposals> {
    if proposals.is_empty() {
        return Ok(AppliedProposals::default());
    }

    let by_id: HashMap<Uuid, &CatalogEntry> = catalog.iter().map(|e| (e.id, e)).collect();
    let names: Vec<String> = proposals.iter().map(|p| p.material_name.clone()).collect();
    let current = materials::list_materials(conn, project_id, true).await?;
    let ids_by_name: HashMap<&str, Uuid> = current
        .iter()
        .filter(|m| names.contains(&m.name))
        .map(|m| (m.name.as_str(), m.id))
        .collect();

    let now = Utc::now();
    let mut applied = AppliedProposals::default();
    let mut touched = Vec::new();
    for proposal in proposals {
        let Some(&material_id) = ids_by_name.get(proposal.material_name.as_str()) else {
            continue;
        };
        let Some(entry) = by_id.get(&proposal.catalog_entry_id) else {
            warn!(
                catalog_entry_id = %proposal.catalog_entry_id,
                "Proposed catalog entry disappeared, skipping"
            );
            continue;
        };

        let assignment = MatchAssignment {
            catalog_entry_id: entry.id,
            density: resolve_density(None, *entry),
            score: Some(proposal.score),
            matched_at: now,
        };
        if materials::assign_if_unmatched(conn, material_id, assignment).await? {
            touched.push(material_id);
            applied.proposals.push(proposal.clone());
        }
    }

    applied.elements_recomputed =
        recalculation::recompute_elements_for_materials(conn, &touched).await?;
    Ok(applied)
}
