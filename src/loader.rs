use crate::types::InputRow;
use crate::util::parse_f64_lenient;
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// Accepted header spellings per field, in lookup priority order.
const STAGE_KEYS: &[&str] = &["stage", "stage_name"];
const MODE_KEYS: &[&str] = &["mode"];
const DISTANCE_KEYS: &[&str] = &["distance_km", "distance", "km", "distance (km)"];
const WEIGHT_KEYS: &[&str] = &["weight_kg", "weight", "qty", "quantity"];
const MATERIAL_KEYS: &[&str] = &["material_type", "material"];
const ENERGY_KEYS: &[&str] = &["manufacturing_energy_kwh", "manufacturing", "manufacturing (kwh)"];
const OWNERSHIP_KEYS: &[&str] = &["ownership"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
    /// Rows kept after replacing invalid UTF-8 in one or more cells.
    pub lossy_rows: usize,
    /// Fields with no matching column at all; they load as defaults.
    pub missing_fields: Vec<&'static str>,
}

/// Column positions for one logical field, ordered by synonym priority.
struct FieldColumns(Vec<usize>);

impl FieldColumns {
    fn locate(headers: &[String], keys: &[&str]) -> Self {
        let cols = keys
            .iter()
            .filter_map(|k| headers.iter().position(|h| h == k))
            .collect();
        FieldColumns(cols)
    }

    /// First non-empty cell among the synonym columns.
    fn get<'r>(&self, record: &'r StringRecord) -> Option<&'r str> {
        self.0
            .iter()
            .filter_map(|&i| record.get(i))
            .find(|v| !v.trim().is_empty())
    }
}

struct Columns {
    stage: FieldColumns,
    mode: FieldColumns,
    distance: FieldColumns,
    weight: FieldColumns,
    material: FieldColumns,
    energy: FieldColumns,
    ownership: FieldColumns,
}

impl Columns {
    fn from_headers(raw: &StringRecord) -> Self {
        let headers: Vec<String> = raw
            .iter()
            .map(|h| h.trim().trim_matches('"').to_lowercase())
            .collect();
        Columns {
            stage: FieldColumns::locate(&headers, STAGE_KEYS),
            mode: FieldColumns::locate(&headers, MODE_KEYS),
            distance: FieldColumns::locate(&headers, DISTANCE_KEYS),
            weight: FieldColumns::locate(&headers, WEIGHT_KEYS),
            material: FieldColumns::locate(&headers, MATERIAL_KEYS),
            energy: FieldColumns::locate(&headers, ENERGY_KEYS),
            ownership: FieldColumns::locate(&headers, OWNERSHIP_KEYS),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            ("stage", &self.stage),
            ("mode", &self.mode),
            ("distance_km", &self.distance),
            ("weight_kg", &self.weight),
            ("material_type", &self.material),
            ("manufacturing_energy_kwh", &self.energy),
            ("ownership", &self.ownership),
        ]
        .into_iter()
        .filter(|(_, cols)| cols.0.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    fn row(&self, record: &StringRecord) -> InputRow {
        let text = |cols: &FieldColumns| cols.get(record).map(|s| s.trim().to_string());
        InputRow {
            stage: text(&self.stage).unwrap_or_else(|| "unknown".to_string()),
            mode: text(&self.mode).unwrap_or_default().to_lowercase(),
            distance_km: parse_f64_lenient(self.distance.get(record)),
            weight_kg: parse_f64_lenient(self.weight.get(record)),
            material_type: text(&self.material)
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| "other".to_string()),
            manufacturing_energy_kwh: parse_f64_lenient(self.energy.get(record)),
            ownership: text(&self.ownership).unwrap_or_default().to_lowercase(),
        }
    }
}

pub fn load_rows(path: &Path) -> Result<(Vec<InputRow>, LoadReport)> {
    let file =
        File::open(path).with_context(|| format!("failed to open input table: {}", path.display()))?;
    read_rows(file).with_context(|| format!("failed to read input table: {}", path.display()))
}

/// Decode a raw record, replacing invalid UTF-8 with U+FFFD. Returns the
/// record and whether any replacement happened.
fn decode_lossy(raw: &ByteRecord) -> (StringRecord, bool) {
    let mut lossy = false;
    let fields: Vec<String> = raw
        .iter()
        .map(|field| {
            let text = String::from_utf8_lossy(field);
            if matches!(text, std::borrow::Cow::Owned(_)) {
                lossy = true;
            }
            text.into_owned()
        })
        .collect();
    (StringRecord::from(fields), lossy)
}

pub fn read_rows<R: Read>(source: R) -> Result<(Vec<InputRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);
    let raw_headers = rdr.byte_headers().context("failed to read header row")?.clone();
    let (headers, _) = decode_lossy(&raw_headers);
    let columns = Columns::from_headers(&headers);

    let mut report = LoadReport {
        missing_fields: columns.missing(),
        ..LoadReport::default()
    };
    if !report.missing_fields.is_empty() {
        debug!(fields = ?report.missing_fields, "columns not present, using defaults");
    }

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        report.total_rows += 1;
        match result {
            Ok(raw) => {
                let (record, lossy) = decode_lossy(&raw);
                if lossy {
                    debug!(row = report.total_rows, "replaced invalid UTF-8 in record");
                    report.lossy_rows += 1;
                }
                rows.push(columns.row(&record));
            }
            Err(err) => {
                warn!(row = report.total_rows, error = %err, "skipping unreadable record");
                report.skipped_rows += 1;
            }
        }
    }
    Ok((rows, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> (Vec<InputRow>, LoadReport) {
        read_rows(csv.as_bytes()).unwrap()
    }

    #[test]
    fn reads_canonical_columns() {
        let (rows, report) = load(
            "stage,mode,distance_km,weight_kg,material_type,manufacturing_energy_kwh,ownership\n\
             supplier_to_factory,Truck,100,1000,Metal,0,\n",
        );
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.skipped_rows, 0);
        assert!(report.missing_fields.is_empty());
        assert_eq!(
            rows[0],
            InputRow {
                stage: "supplier_to_factory".to_string(),
                mode: "truck".to_string(),
                distance_km: 100.0,
                weight_kg: 1000.0,
                material_type: "metal".to_string(),
                manufacturing_energy_kwh: 0.0,
                ownership: String::new(),
            }
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive_with_synonyms() {
        let (rows, _) = load(
            "Stage_Name,MODE,Distance (km),Quantity,Material,Manufacturing (kWh),Ownership\n\
             warehouse,rail,250,40,plastic,12.5,Owned\n",
        );
        let r = &rows[0];
        assert_eq!(r.stage, "warehouse");
        assert_eq!(r.mode, "rail");
        assert_eq!(r.distance_km, 250.0);
        assert_eq!(r.weight_kg, 40.0);
        assert_eq!(r.material_type, "plastic");
        assert_eq!(r.manufacturing_energy_kwh, 12.5);
        assert_eq!(r.ownership, "owned");
    }

    #[test]
    fn first_non_empty_synonym_wins() {
        let (rows, _) = load("distance_km,distance,weight,qty\n,300,,7\n");
        assert_eq!(rows[0].distance_km, 300.0);
        assert_eq!(rows[0].weight_kg, 7.0);
    }

    #[test]
    fn missing_columns_load_as_defaults() {
        let (rows, report) = load("mode\nair\n");
        let r = &rows[0];
        assert_eq!(r.stage, "unknown");
        assert_eq!(r.material_type, "other");
        assert_eq!(r.distance_km, 0.0);
        assert!(report.missing_fields.contains(&"distance_km"));
        assert!(!report.missing_fields.contains(&"mode"));
    }

    #[test]
    fn unparsable_numbers_become_zero() {
        let (rows, _) = load(
            "stage,mode,distance_km,weight_kg,material_type,manufacturing_energy_kwh\n\
             x,truck,abc,abc,metal,abc\n",
        );
        assert_eq!(rows[0].distance_km, 0.0);
        assert_eq!(rows[0].weight_kg, 0.0);
        assert_eq!(rows[0].manufacturing_energy_kwh, 0.0);
    }

    #[test]
    fn short_records_are_tolerated() {
        let (rows, report) = load("stage,mode,distance_km\na,truck\nb,rail,10\n");
        assert_eq!(report.total_rows, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].distance_km, 0.0);
        assert_eq!(rows[1].distance_km, 10.0);
    }

    #[test]
    fn invalid_utf8_cell_keeps_the_row() {
        let (rows, report) = read_rows(
            &b"stage,mode,distance_km,weight_kg\nfa\xffctory,truck,100,1000\nb,rail,10,10\n"[..],
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.lossy_rows, 1);
        assert_eq!(rows[0].stage, "fa\u{FFFD}ctory");
        assert_eq!(rows[0].mode, "truck");
        assert_eq!(rows[0].distance_km, 100.0);
        assert_eq!(rows[0].weight_kg, 1000.0);
        assert_eq!(rows[1].distance_km, 10.0);
    }

    #[test]
    fn header_only_table_is_empty() {
        let (rows, report) = load("stage,mode\n");
        assert!(rows.is_empty());
        assert_eq!(report.total_rows, 0);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_rows(Path::new("/nonexistent/shipments.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/shipments.csv"));
    }
}
