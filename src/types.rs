use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// One normalized input row. Numeric fields have already been coerced by
/// the loader, so they are finite and non-negative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRow {
    pub stage: String,
    pub mode: String,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub material_type: String,
    pub manufacturing_energy_kwh: f64,
    pub ownership: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedRow {
    /// Position of the row in the original input.
    pub index: usize,
    pub stage: String,
    pub mode: String,
    pub material_type: String,
    pub ownership: String,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub manufacturing_energy_kwh: f64,
    pub transport_kg: f64,
    pub material_kg: f64,
    pub manufacturing_kg: f64,
    pub total_kg: f64,
    pub scope1_kg: f64,
    pub scope2_kg: f64,
    pub scope3_kg: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScopeTotals {
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
}

impl ScopeTotals {
    pub fn sum(&self) -> f64 {
        self.scope1 + self.scope2 + self.scope3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTotal {
    pub stage: String,
    pub kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub grand_total_kg: f64,
    /// Sorted by `kg` descending.
    pub stage_totals: Vec<StageTotal>,
    pub scope_totals: ScopeTotals,
    pub hotspots: Vec<ComputedRow>,
}

/// Share of the grand total held by one row. `NoData` covers an empty or
/// all-zero input, which has no meaningful percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contribution {
    Percent(f64),
    NoData,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Percent(p) => write!(f, "{:.2}%", p),
            Contribution::NoData => f.write_str("no data"),
        }
    }
}

impl Serialize for Contribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Contribution::Percent(p) => serializer.serialize_f64(*p),
            Contribution::NoData => serializer.serialize_str("no data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ShiftAirFreight,
    ShiftLongTruckLegs,
    RecycledPackaging,
    ReduceMaterial,
    ConsolidateShipments,
    RenewableElectricity,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
    pub estimated_reduction_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityEntry {
    pub preset: String,
    #[serde(rename = "scope1_kgCO2")]
    pub scope1_kg: f64,
    #[serde(rename = "scope2_kgCO2")]
    pub scope2_kg: f64,
    #[serde(rename = "scope3_kgCO2")]
    pub scope3_kg: f64,
    #[serde(rename = "total_kgCO2")]
    pub total_kg: f64,
}

/// Full result of one computation request, serialized as the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionsReport {
    pub generated_at: String,
    pub preset: String,
    pub row_count: usize,
    #[serde(rename = "total_kgCO2")]
    pub total_kg: f64,
    pub scope: ScopeTotals,
    pub stage_breakdown: Vec<StageTotal>,
    pub hotspots: Vec<ComputedRow>,
    pub hotspot: Option<ComputedRow>,
    pub contribution: Contribution,
    pub suggestion: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Vec<SensitivityEntry>>,
}

/// Per-row CSV export layout, values rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowExport {
    pub index: usize,
    pub stage: String,
    pub mode: String,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub transport_kg: f64,
    pub material_kg: f64,
    pub manufacturing_kg: f64,
    pub total_kg: f64,
}

#[derive(Debug, Tabled, Clone)]
pub struct HotspotTableRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Row")]
    pub index: usize,
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "TotalKg")]
    pub total_kg: String,
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct StageTableRow {
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Kg")]
    pub kg: String,
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct SensitivityTableRow {
    #[tabled(rename = "Preset")]
    pub preset: String,
    #[tabled(rename = "Scope1")]
    pub scope1: String,
    #[tabled(rename = "Scope2")]
    pub scope2: String,
    #[tabled(rename = "Scope3")]
    pub scope3: String,
    #[tabled(rename = "Total")]
    pub total: String,
}
