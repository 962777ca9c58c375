// Per-row emissions: tonne-km transport, per-kg material intensity and
// grid-average manufacturing energy, split into GHG Protocol scopes.
use crate::factors::FactorTable;
use crate::types::{ComputedRow, InputRow};

const OWNED_MARKERS: &[&str] = &["owned", "company", "company_owned", "own"];
const OWNED_STAGE_FRAGMENTS: &[&str] = &["owned", "on_site"];

/// Transport is a direct (Scope 1) emission when the company runs the leg.
pub fn is_direct_operation(row: &InputRow) -> bool {
    let owner = row.ownership.trim().to_lowercase();
    if OWNED_MARKERS.contains(&owner.as_str()) {
        return true;
    }
    let stage = row.stage.to_lowercase();
    OWNED_STAGE_FRAGMENTS.iter().any(|f| stage.contains(f))
}

pub fn compute(index: usize, row: &InputRow, factors: &FactorTable) -> ComputedRow {
    let mode = row.mode.trim().to_lowercase();
    let material_type = factors
        .resolve_material(&row.material_type.trim().to_lowercase())
        .to_string();

    // Inputs are coerced upstream, but rows built by hand must not yield negatives.
    let distance_km = row.distance_km.max(0.0);
    let weight_kg = row.weight_kg.max(0.0);
    let energy_kwh = row.manufacturing_energy_kwh.max(0.0);

    let tonnes = weight_kg / 1000.0;
    let transport_kg = distance_km * tonnes * factors.transport_factor(&mode) / 1000.0;
    let material_kg = weight_kg * factors.material_factor(&material_type);
    let manufacturing_kg = energy_kwh * factors.grid_kg_per_kwh;
    let total_kg = transport_kg + material_kg + manufacturing_kg;

    let (scope1_kg, transport_scope3) = if is_direct_operation(row) {
        (transport_kg, 0.0)
    } else {
        (0.0, transport_kg)
    };

    ComputedRow {
        index,
        stage: row.stage.clone(),
        mode,
        material_type,
        ownership: row.ownership.trim().to_lowercase(),
        distance_km,
        weight_kg,
        manufacturing_energy_kwh: energy_kwh,
        transport_kg,
        material_kg,
        manufacturing_kg,
        total_kg,
        scope1_kg,
        scope2_kg: manufacturing_kg,
        scope3_kg: transport_scope3 + material_kg,
    }
}

/// Compute every row, keeping input order and origin indices.
pub fn compute_all(rows: &[InputRow], factors: &FactorTable) -> Vec<ComputedRow> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| compute(i, r, factors))
        .collect()
}
