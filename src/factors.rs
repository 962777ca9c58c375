// Emission factor tables and the ways they can be altered per request:
// industry material presets and a JSON overrides file.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Grams CO2 per tonne-km for a mode missing from the transport table.
pub const DEFAULT_TRANSPORT_G_PER_TKM: f64 = 62.0;
/// Kg CO2 per kWh of purchased electricity.
pub const DEFAULT_GRID_KG_PER_KWH: f64 = 0.233;
pub const FALLBACK_MATERIAL: &str = "other";
pub const BASELINE_PRESET: &str = "baseline";

const TRANSPORT_G_PER_TKM: &[(&str, f64)] = &[
    ("truck", 62.0),
    ("road", 62.0),
    ("rail", 22.0),
    ("sea", 15.0),
    ("ship", 15.0),
    ("air", 500.0),
    ("last_mile", 90.0),
];

// Columns: metal, plastic, textile, glass, food, paper, other.
const MATERIAL_KEYS: [&str; 7] = ["metal", "plastic", "textile", "glass", "food", "paper", "other"];

static PRESETS: Lazy<Vec<(&'static str, BTreeMap<String, f64>)>> = Lazy::new(|| {
    let table: [(&str, [f64; 7]); 7] = [
        ("baseline", [6.0, 3.0, 4.0, 1.8, 2.5, 1.5, 1.0]),
        ("electronics", [8.5, 4.5, 1.5, 3.5, 0.5, 0.6, 1.0]),
        ("apparel", [3.0, 2.5, 9.0, 0.8, 3.5, 1.8, 1.0]),
        ("packaging", [5.5, 3.2, 1.0, 2.5, 0.7, 2.2, 1.0]),
        ("food_beverage", [4.0, 2.8, 2.5, 3.8, 12.0, 1.6, 1.0]),
        ("construction", [9.0, 3.5, 2.0, 4.0, 2.0, 1.4, 1.0]),
        ("automotive", [9.5, 4.0, 3.0, 2.8, 1.0, 1.0, 1.0]),
    ];
    table
        .iter()
        .map(|(name, values)| {
            let factors = MATERIAL_KEYS
                .iter()
                .zip(values.iter())
                .map(|(k, v)| (k.to_string(), *v))
                .collect();
            (*name, factors)
        })
        .collect()
});

#[derive(Debug, Error)]
pub enum FactorError {
    #[error("unknown material preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
    #[error("invalid {table} factor for '{key}': {value}")]
    InvalidFactor {
        table: &'static str,
        key: String,
        value: f64,
    },
    #[error("failed to read overrides file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse overrides file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Preset names in declaration order.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

fn find_preset(name: &str) -> Result<(&'static str, &'static BTreeMap<String, f64>), FactorError> {
    let wanted = name.trim().to_lowercase();
    PRESETS
        .iter()
        .find(|(n, _)| *n == wanted)
        .map(|(n, f)| (*n, f))
        .ok_or_else(|| FactorError::UnknownPreset {
            name: name.to_string(),
            available: preset_names().join(", "),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    /// g CO2 per tonne-km, keyed by lowercase mode.
    pub transport: BTreeMap<String, f64>,
    /// kg CO2 per kg, keyed by lowercase material type.
    pub material: BTreeMap<String, f64>,
    pub grid_kg_per_kwh: f64,
}

impl Default for FactorTable {
    fn default() -> Self {
        let transport = TRANSPORT_G_PER_TKM
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        let material = PRESETS
            .iter()
            .find(|(n, _)| *n == BASELINE_PRESET)
            .map(|(_, f)| f.clone())
            .unwrap_or_default();
        FactorTable {
            transport,
            material,
            grid_kg_per_kwh: DEFAULT_GRID_KG_PER_KWH,
        }
    }
}

impl FactorTable {
    pub fn transport_factor(&self, mode: &str) -> f64 {
        self.transport
            .get(mode)
            .copied()
            .unwrap_or(DEFAULT_TRANSPORT_G_PER_TKM)
    }

    /// The material key whose factor will actually be applied.
    pub fn resolve_material<'a>(&self, kind: &'a str) -> &'a str {
        if self.material.contains_key(kind) {
            kind
        } else {
            FALLBACK_MATERIAL
        }
    }

    pub fn material_factor(&self, kind: &str) -> f64 {
        self.material
            .get(kind)
            .or_else(|| self.material.get(FALLBACK_MATERIAL))
            .copied()
            .unwrap_or(1.0)
    }

    /// Replace material factors with those of a named industry preset.
    pub fn with_material_preset(mut self, name: &str) -> Result<Self, FactorError> {
        let (_, preset) = find_preset(name)?;
        for (k, v) in preset {
            self.material.insert(k.clone(), *v);
        }
        Ok(self)
    }

    pub fn with_overrides(mut self, overrides: &FactorOverrides) -> Result<Self, FactorError> {
        for (k, v) in &overrides.emission_factors {
            self.transport
                .insert(k.trim().to_lowercase(), check_factor("transport", k, *v)?);
        }
        for (k, v) in &overrides.material_factors {
            self.material
                .insert(k.trim().to_lowercase(), check_factor("material", k, *v)?);
        }
        if let Some(grid) = overrides.grid_kgco2_per_kwh {
            self.grid_kg_per_kwh = check_factor("grid", "grid_kgco2_per_kwh", grid)?;
        }
        Ok(self)
    }

    pub fn summary(&self) -> FactorSummary {
        FactorSummary {
            transport_factors_g_per_tkm: self.transport.clone(),
            material_factors_kg_per_kg: self.material.clone(),
            grid_kgco2_per_kwh: self.grid_kg_per_kwh,
        }
    }
}

fn check_factor(table: &'static str, key: &str, value: f64) -> Result<f64, FactorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FactorError::InvalidFactor {
            table,
            key: key.to_string(),
            value,
        })
    }
}

/// Shape of the overrides JSON file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactorOverrides {
    #[serde(default)]
    pub emission_factors: BTreeMap<String, f64>,
    #[serde(default)]
    pub material_factors: BTreeMap<String, f64>,
    #[serde(default)]
    pub grid_kgco2_per_kwh: Option<f64>,
}

impl FactorOverrides {
    pub fn load(path: &Path) -> Result<Self, FactorError> {
        let data = std::fs::read_to_string(path).map_err(|source| FactorError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| FactorError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FactorSummary {
    pub transport_factors_g_per_tkm: BTreeMap<String, f64>,
    pub material_factors_kg_per_kg: BTreeMap<String, f64>,
    pub grid_kgco2_per_kwh: f64,
}

/// Baseline factors, then the optional overrides file, then the optional preset.
pub fn resolve_factors(
    preset: Option<&str>,
    overrides: Option<&FactorOverrides>,
) -> Result<FactorTable, FactorError> {
    let mut factors = FactorTable::default();
    if let Some(o) = overrides {
        factors = factors.with_overrides(o)?;
    }
    if let Some(p) = preset {
        factors = factors.with_material_preset(p)?;
    }
    Ok(factors)
}
