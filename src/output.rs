use crate::reports::Computation;
use crate::types::{ComputedRow, RowExport};
use crate::util::round2;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;
    write_csv_to(file, rows).with_context(|| format!("failed to write csv file: {}", path.display()))
}

pub fn write_csv_to<W: Write, T: Serialize>(sink: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(sink);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;
    std::fs::write(path, s).with_context(|| format!("failed to write json file: {}", path.display()))?;
    Ok(())
}

pub fn export_row(row: &ComputedRow) -> RowExport {
    RowExport {
        index: row.index,
        stage: row.stage.clone(),
        mode: row.mode.clone(),
        distance_km: round2(row.distance_km),
        weight_kg: round2(row.weight_kg),
        transport_kg: round2(row.transport_kg),
        material_kg: round2(row.material_kg),
        manufacturing_kg: round2(row.manufacturing_kg),
        total_kg: round2(row.total_kg),
    }
}

pub fn export_rows(rows: &[ComputedRow]) -> Vec<RowExport> {
    rows.iter().map(export_row).collect()
}

/// Write the per-row CSV and the JSON report. Both writes are attempted;
/// any failure is returned.
pub fn export_computation(computation: &Computation, csv_path: &Path, json_path: &Path) -> Result<()> {
    let csv_result = write_csv(csv_path, &export_rows(&computation.rows));
    let json_result = write_json(json_path, &computation.report);
    match (csv_result, json_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(csv_err), Err(json_err)) => {
            Err(csv_err.context(format!("json export also failed: {:#}", json_err)))
        }
    }
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no data)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
