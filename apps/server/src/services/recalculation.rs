//! Recalculation of stored element and project indicators.
//!
//! Every mutation of elements or materials ends here: affected elements are
//! recomputed from their layers and written back, then the project aggregate
//! is reduced from the stored element values.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sea_orm::ConnectionTrait;
use tracing::debug;
use uuid::Uuid;

use crate::db::{catalog_entries, elements, projects};
use crate::entity::{element_material, material};
use crate::error::AppResult;
use crate::models::{Coefficients, ImpactSource, Indicators, MaterialEmission};
use crate::services::calculator::{self, LayerInput};

type LayerRow = (element_material::Model, Option<material::Model>);

/// Coefficients of the catalog entries the layers' materials are matched to.
async fn coefficients_for<C: ConnectionTrait>(
    conn: &C,
    rows: &[LayerRow],
) -> AppResult<HashMap<Uuid, Coefficients>> {
    let entry_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|(_, m)| m.as_ref().and_then(|m| m.catalog_entry_id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let entries = catalog_entries::find_by_ids(conn, &entry_ids).await?;
    Ok(entries
        .into_iter()
        .filter_map(|e| e.coefficients().map(|c| (e.id, c)))
        .collect())
}

fn layer_input(
    layer: &element_material::Model,
    material: Option<&material::Model>,
    coefficients: &HashMap<Uuid, Coefficients>,
) -> LayerInput {
    LayerInput {
        volume: layer.volume,
        density: material.and_then(|m| m.density),
        coefficients: material
            .and_then(|m| m.catalog_entry_id)
            .and_then(|id| coefficients.get(&id).copied()),
    }
}

/// Recompute and store the indicators of the given elements.
///
/// Elements without layers are reset to zero. Returns the number of
/// elements written.
pub async fn recompute_elements<C: ConnectionTrait>(
    conn: &C,
    element_ids: &[Uuid],
) -> AppResult<u64> {
    if element_ids.is_empty() {
        return Ok(0);
    }

    let rows = elements::layers_of_elements(conn, element_ids).await?;
    let coefficients = coefficients_for(conn, &rows).await?;

    let mut per_element: HashMap<Uuid, Indicators> = HashMap::with_capacity(element_ids.len());
    for (layer, material) in &rows {
        let input = layer_input(layer, material.as_ref(), &coefficients);
        *per_element.entry(layer.element_id).or_default() += input.indicators();
    }

    for id in element_ids {
        let indicators = per_element.get(id).copied().unwrap_or_default();
        elements::store_indicators(conn, *id, indicators).await?;
    }

    debug!(count = element_ids.len(), "Recomputed element indicators");
    Ok(element_ids.len() as u64)
}

/// Recompute and store a single element.
pub async fn recompute_element<C: ConnectionTrait>(
    conn: &C,
    element_id: Uuid,
) -> AppResult<Indicators> {
    let rows = elements::layers_of_element(conn, element_id).await?;
    let coefficients = coefficients_for(conn, &rows).await?;

    let inputs: Vec<LayerInput> = rows
        .iter()
        .map(|(layer, material)| layer_input(layer, material.as_ref(), &coefficients))
        .collect();
    let indicators = calculator::element_indicators(&inputs);

    elements::store_indicators(conn, element_id, indicators).await?;
    Ok(indicators)
}

/// Recompute every element with a layer of any of the materials.
pub async fn recompute_elements_for_materials<C: ConnectionTrait>(
    conn: &C,
    material_ids: &[Uuid],
) -> AppResult<u64> {
    let element_ids = elements::ids_referencing_materials(conn, material_ids).await?;
    recompute_elements(conn, &element_ids).await
}

/// Reduce the project aggregate from its non-archived elements and store it.
pub async fn recompute_project<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<Indicators> {
    let totals = projects::sum_element_indicators(conn, project_id).await?;
    projects::store_totals(conn, project_id, totals).await?;

    debug!(
        project_id = %project_id,
        gwp = totals.gwp,
        ubp = totals.ubp,
        penre = totals.penre,
        "Project totals updated"
    );
    Ok(totals)
}

/// Recompute every element of a project, then the project aggregate.
pub async fn recompute_all<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<(u64, Indicators)> {
    let element_ids = elements::ids_of_project(conn, project_id).await?;
    let count = recompute_elements(conn, &element_ids).await?;
    let totals = recompute_project(conn, project_id).await?;
    Ok((count, totals))
}

/// Per-material contribution over the project's non-archived elements.
///
/// Computed from the stored layers at read time, ordered by descending GWP.
pub async fn material_breakdown<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<Vec<MaterialEmission>> {
    let rows = elements::active_layers_of_project(conn, project_id).await?;
    let coefficients = coefficients_for(conn, &rows).await?;

    let mut by_material: BTreeMap<Uuid, MaterialEmission> = BTreeMap::new();
    for (layer, material) in &rows {
        let Some(material) = material else {
            continue;
        };
        let input = layer_input(layer, Some(material), &coefficients);
        let entry = by_material
            .entry(material.id)
            .or_insert_with(|| MaterialEmission {
                material_id: material.id,
                name: material.name.clone(),
                catalog_entry_id: material.catalog_entry_id,
                volume: 0.0,
                mass: 0.0,
                indicators: Indicators::ZERO,
            });
        entry.volume += layer.volume;
        entry.mass += calculator::mass(layer.volume, material.density);
        entry.indicators += input.indicators();
    }

    let mut breakdown: Vec<MaterialEmission> = by_material.into_values().collect();
    breakdown.sort_by(|a, b| b.indicators.gwp.total_cmp(&a.indicators.gwp));
    Ok(breakdown)
}
