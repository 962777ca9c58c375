use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::reports::DEFAULT_TOP_N;

#[derive(Parser, Debug)]
#[command(
    name = "emissions_report",
    version,
    about = "Supply-chain emissions breakdown, hotspots and mitigation suggestions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute emissions for a shipment/manufacturing CSV.
    Compute(ComputeArgs),
    /// List the available industry material presets.
    Presets,
    /// Print the effective factor tables as JSON.
    Factors(FactorArgs),
    /// Menu-driven session: load, compute, pick hotspots, export.
    Interactive(InteractiveArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct FactorArgs {
    /// Industry material preset applied on top of the baseline factors.
    #[arg(long)]
    pub preset: Option<String>,

    /// JSON file with `emission_factors`, `material_factors` and `grid_kgco2_per_kwh`.
    #[arg(long)]
    pub overrides: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ComputeArgs {
    pub input: PathBuf,

    #[command(flatten)]
    pub factors: FactorArgs,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    /// Hotspot rank (0 = largest) to analyse for suggestions.
    #[arg(long, default_value_t = 0)]
    pub select: usize,

    /// Also compute totals under every material preset.
    #[arg(long, default_value_t = false)]
    pub compare_all: bool,

    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Per-row CSV export of every computed row.
    #[arg(long)]
    pub csv_out: Option<PathBuf>,

    /// Per-row CSV export of the selected hotspot only.
    #[arg(long)]
    pub hotspot_csv_out: Option<PathBuf>,

    /// Skip the console previews.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InteractiveArgs {
    #[arg(long, default_value = "shipments.csv")]
    pub input: PathBuf,

    #[command(flatten)]
    pub factors: FactorArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_defaults() {
        let cli = Cli::parse_from(["emissions_report", "compute", "legs.csv"]);
        let Commands::Compute(args) = cli.command else {
            panic!("expected compute");
        };
        assert_eq!(args.input, PathBuf::from("legs.csv"));
        assert_eq!(args.top, 5);
        assert_eq!(args.select, 0);
        assert!(!args.compare_all);
        assert!(args.factors.preset.is_none());
    }

    #[test]
    fn compute_accepts_factor_flags() {
        let cli = Cli::parse_from([
            "emissions_report",
            "compute",
            "legs.csv",
            "--preset",
            "apparel",
            "--overrides",
            "factors.json",
            "--compare-all",
            "--top",
            "3",
        ]);
        let Commands::Compute(args) = cli.command else {
            panic!("expected compute");
        };
        assert_eq!(args.factors.preset.as_deref(), Some("apparel"));
        assert_eq!(args.factors.overrides, Some(PathBuf::from("factors.json")));
        assert!(args.compare_all);
        assert_eq!(args.top, 3);
    }
}
