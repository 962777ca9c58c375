use crate::calculator::compute_all;
use crate::factors::{preset_names, FactorError, FactorTable, BASELINE_PRESET};
use crate::suggest::suggest;
use crate::types::{
    AggregateResult, ComputedRow, Contribution, EmissionsReport, HotspotTableRow, InputRow,
    ScopeTotals, SensitivityEntry, SensitivityTableRow, StageTableRow, StageTotal,
};
use crate::util::{format_number, now_utc_string};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub preset: Option<String>,
    pub top_n: usize,
    /// Rank (0-based) of the hotspot to analyse; out of range means no selection.
    pub select: usize,
    pub compare_all: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            preset: None,
            top_n: DEFAULT_TOP_N,
            select: 0,
            compare_all: false,
        }
    }
}

/// Computed rows plus the report derived from them.
#[derive(Debug, Clone)]
pub struct Computation {
    pub rows: Vec<ComputedRow>,
    pub report: EmissionsReport,
}

/// Top `n` rows by total, descending. Ties keep input order.
pub fn rank(rows: &[ComputedRow], n: usize) -> Vec<ComputedRow> {
    let mut sorted: Vec<&ComputedRow> = rows.iter().collect();
    // `sort_by` is stable, which is what keeps tied rows in input order.
    sorted.sort_by(|a, b| b.total_kg.partial_cmp(&a.total_kg).unwrap_or(Ordering::Equal));
    sorted.into_iter().take(n).cloned().collect()
}

pub fn aggregate(rows: &[ComputedRow], top_n: usize) -> AggregateResult {
    let mut grand_total_kg = 0.0;
    let mut scope_totals = ScopeTotals::default();
    let mut stage_totals: Vec<StageTotal> = Vec::new();
    let mut stage_pos: HashMap<&str, usize> = HashMap::new();

    for r in rows {
        grand_total_kg += r.total_kg;
        scope_totals.scope1 += r.scope1_kg;
        scope_totals.scope2 += r.scope2_kg;
        scope_totals.scope3 += r.scope3_kg;

        let pos = *stage_pos.entry(r.stage.as_str()).or_insert_with(|| {
            stage_totals.push(StageTotal {
                stage: r.stage.clone(),
                kg: 0.0,
            });
            stage_totals.len() - 1
        });
        stage_totals[pos].kg += r.total_kg;
    }

    stage_totals.sort_by(|a, b| b.kg.partial_cmp(&a.kg).unwrap_or(Ordering::Equal));

    AggregateResult {
        grand_total_kg,
        stage_totals,
        scope_totals,
        hotspots: rank(rows, top_n),
    }
}

/// Percentage of `whole` held by `part`. An empty, zero or overflowed total
/// has no meaningful share.
fn share_of(part: f64, whole: f64) -> Contribution {
    let pct = 100.0 * part / whole;
    if whole.is_finite() && whole > 0.0 && pct.is_finite() {
        Contribution::Percent(pct)
    } else {
        Contribution::NoData
    }
}

pub fn contribution_pct(row: &ComputedRow, grand_total_kg: f64) -> Contribution {
    share_of(row.total_kg, grand_total_kg)
}

pub fn select_hotspot(hotspots: &[ComputedRow], rank: usize) -> Option<&ComputedRow> {
    hotspots.get(rank)
}

fn preset_label(preset: Option<&str>) -> String {
    preset
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_else(|| BASELINE_PRESET.to_string())
}

/// Scope and total figures for every material preset on top of `base`.
pub fn compare_presets(
    rows: &[InputRow],
    base: &FactorTable,
) -> Result<Vec<SensitivityEntry>, FactorError> {
    let mut out = Vec::new();
    for name in preset_names() {
        let factors = base.clone().with_material_preset(name)?;
        let agg = aggregate(&compute_all(rows, &factors), 0);
        out.push(SensitivityEntry {
            preset: name.to_string(),
            scope1_kg: agg.scope_totals.scope1,
            scope2_kg: agg.scope_totals.scope2,
            scope3_kg: agg.scope_totals.scope3,
            total_kg: agg.grand_total_kg,
        });
    }
    Ok(out)
}

/// Run one full computation request from scratch.
pub fn build_report(
    rows: &[InputRow],
    base: &FactorTable,
    opts: &ReportOptions,
) -> Result<Computation, FactorError> {
    let factors = match opts.preset.as_deref() {
        Some(p) => base.clone().with_material_preset(p)?,
        None => base.clone(),
    };

    let computed = compute_all(rows, &factors);
    let agg = aggregate(&computed, opts.top_n);
    debug!(
        rows = computed.len(),
        total_kg = agg.grand_total_kg,
        scope_sum_kg = agg.scope_totals.sum(),
        stages = agg.stage_totals.len(),
        "aggregated emissions"
    );

    let hotspot = select_hotspot(&agg.hotspots, opts.select).cloned();
    let contribution = hotspot
        .as_ref()
        .map(|h| contribution_pct(h, agg.grand_total_kg))
        .unwrap_or(Contribution::NoData);
    let suggestion = hotspot.as_ref().map(suggest).unwrap_or_default();

    let sensitivity = if opts.compare_all {
        Some(compare_presets(rows, base)?)
    } else {
        None
    };

    let report = EmissionsReport {
        generated_at: now_utc_string(),
        preset: preset_label(opts.preset.as_deref()),
        row_count: computed.len(),
        total_kg: agg.grand_total_kg,
        scope: agg.scope_totals,
        stage_breakdown: agg.stage_totals,
        hotspots: agg.hotspots,
        hotspot,
        contribution,
        suggestion,
        sensitivity,
    };
    Ok(Computation {
        rows: computed,
        report,
    })
}

pub fn hotspot_table(report: &EmissionsReport) -> Vec<HotspotTableRow> {
    report
        .hotspots
        .iter()
        .enumerate()
        .map(|(i, h)| HotspotTableRow {
            rank: i + 1,
            index: h.index,
            stage: h.stage.clone(),
            mode: if h.mode.is_empty() {
                "n/a".to_string()
            } else {
                h.mode.clone()
            },
            total_kg: format_number(h.total_kg, 2),
            share: contribution_pct(h, report.total_kg).to_string(),
        })
        .collect()
}

pub fn stage_table(report: &EmissionsReport) -> Vec<StageTableRow> {
    report
        .stage_breakdown
        .iter()
        .map(|s| StageTableRow {
            stage: s.stage.clone(),
            kg: format_number(s.kg, 2),
            share: share_of(s.kg, report.total_kg).to_string(),
        })
        .collect()
}

pub fn sensitivity_table(entries: &[SensitivityEntry]) -> Vec<SensitivityTableRow> {
    entries
        .iter()
        .map(|e| SensitivityTableRow {
            preset: e.preset.clone(),
            scope1: format_number(e.scope1_kg, 2),
            scope2: format_number(e.scope2_kg, 2),
            scope3: format_number(e.scope3_kg, 2),
            total: format_number(e.total_kg, 2),
        })
        .collect()
}
