// Entry point and high-level CLI flow.
//
// `compute` is the one-shot path: load the table, compute, preview, export.
// `interactive` keeps the numbered menu session, holding the loaded rows and
// the latest result in a `Session` value owned by the loop.
mod calculator;
mod cli;
mod factors;
mod loader;
mod output;
mod reports;
mod suggest;
mod types;
mod util;

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ComputeArgs, FactorArgs, InteractiveArgs};
use crate::factors::{preset_names, resolve_factors, FactorOverrides, FactorTable};
use crate::reports::{build_report, Computation, ReportOptions};
use crate::types::{EmissionsReport, InputRow};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compute(args) => run_compute(args),
        Commands::Presets => {
            for name in preset_names() {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Factors(args) => run_factors(&args),
        Commands::Interactive(args) => run_interactive(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_overrides(args: &FactorArgs) -> Result<Option<FactorOverrides>> {
    let Some(path) = &args.overrides else {
        return Ok(None);
    };
    let overrides = FactorOverrides::load(path)?;
    info!(path = %path.display(), "loaded factor overrides");
    Ok(Some(overrides))
}

/// Factors before any preset; presets are applied per computation.
fn base_factors(args: &FactorArgs) -> Result<FactorTable> {
    let overrides = load_overrides(args)?;
    Ok(resolve_factors(None, overrides.as_ref())?)
}

fn run_factors(args: &FactorArgs) -> Result<()> {
    let overrides = load_overrides(args)?;
    let factors = resolve_factors(args.preset.as_deref(), overrides.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&factors.summary())?);
    Ok(())
}

fn load_input(path: &Path) -> Result<Vec<InputRow>> {
    let (rows, load_report) = loader::load_rows(path)?;
    info!(
        path = %path.display(),
        rows = rows.len(),
        records = load_report.total_rows,
        skipped = load_report.skipped_rows,
        lossy = load_report.lossy_rows,
        "loaded input table"
    );
    if !load_report.missing_fields.is_empty() {
        warn!(fields = ?load_report.missing_fields, "input has no column for some fields");
    }
    if rows.is_empty() {
        warn!("input table has no rows; results will be empty");
    }
    Ok(rows)
}

fn run_compute(args: ComputeArgs) -> Result<()> {
    let rows = load_input(&args.input)?;
    let base = base_factors(&args.factors)?;
    let opts = ReportOptions {
        preset: args.factors.preset.clone(),
        top_n: args.top,
        select: args.select,
        compare_all: args.compare_all,
    };
    let computation = build_report(&rows, &base, &opts)?;

    if !args.quiet {
        print_report(&computation.report);
    }
    if let Some(path) = &args.json_out {
        output::write_json(path, &computation.report)?;
        info!(path = %path.display(), "wrote json report");
    }
    if let Some(path) = &args.csv_out {
        output::write_csv(path, &output::export_rows(&computation.rows))?;
        info!(path = %path.display(), "wrote per-row csv");
    }
    if let Some(path) = &args.hotspot_csv_out {
        write_hotspot_csv(path, &computation.report)?;
    }
    Ok(())
}

fn write_hotspot_csv(path: &Path, report: &EmissionsReport) -> Result<()> {
    match &report.hotspot {
        Some(h) => {
            output::write_csv(path, &[output::export_row(h)])?;
            info!(path = %path.display(), row = h.index, "wrote hotspot csv");
        }
        None => warn!("no hotspot selected; hotspot csv not written"),
    }
    Ok(())
}

fn print_report(report: &EmissionsReport) {
    println!("Emissions Summary (preset: {})\n", report.preset);
    println!(
        "Rows: {}   Total: {} kgCO2e",
        util::format_int(report.row_count),
        util::format_number(report.total_kg, 2)
    );
    println!(
        "Scope 1: {}   Scope 2: {}   Scope 3: {}\n",
        util::format_number(report.scope.scope1, 2),
        util::format_number(report.scope.scope2, 2),
        util::format_number(report.scope.scope3, 2)
    );

    output::preview_table(
        "Stage Breakdown",
        Some("sorted by emissions"),
        &reports::stage_table(report),
        10,
    );
    output::preview_table(
        "Top Hotspots",
        Some("rows ranked by total kgCO2e"),
        &reports::hotspot_table(report),
        report.hotspots.len(),
    );
    print_hotspot(report);

    if let Some(sens) = &report.sensitivity {
        output::preview_table(
            "Preset Sensitivity",
            None,
            &reports::sensitivity_table(sens),
            sens.len(),
        );
    }
}

fn print_hotspot(report: &EmissionsReport) {
    let Some(h) = &report.hotspot else {
        println!("No hotspot selected.\n");
        return;
    };
    println!(
        "Selected hotspot: row {} ({}, {}), {} kgCO2e, contribution {}",
        h.index,
        h.stage,
        if h.mode.is_empty() { "n/a" } else { h.mode.as_str() },
        util::format_number(h.total_kg, 2),
        report.contribution
    );
    println!(
        "  transport {} | material {} | manufacturing {}",
        util::format_number(h.transport_kg, 2),
        util::format_number(h.material_kg, 2),
        util::format_number(h.manufacturing_kg, 2)
    );
    println!("Suggestions:");
    for s in &report.suggestion {
        println!(
            "  - {} (est. -{} kgCO2e)",
            s.text,
            util::format_number(s.estimated_reduction_kg, 2)
        );
    }
    println!();
}

struct Session {
    input: PathBuf,
    base: FactorTable,
    preset: Option<String>,
    select: usize,
    rows: Option<Vec<InputRow>>,
    last: Option<Computation>,
}

impl Session {
    fn compute(&mut self) -> Result<Option<&Computation>> {
        let Some(rows) = &self.rows else {
            return Ok(None);
        };
        let opts = ReportOptions {
            preset: self.preset.clone(),
            select: self.select,
            ..ReportOptions::default()
        };
        self.last = Some(build_report(rows, &self.base, &opts)?);
        Ok(self.last.as_ref())
    }
}

/// Read one trimmed line after a prompt. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` for `Y`, `false` for `N` or end of input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to Menu (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(session: &mut Session) {
    match load_input(&session.input) {
        Ok(rows) => {
            println!(
                "Loaded {} rows from {}.\n",
                util::format_int(rows.len()),
                session.input.display()
            );
            session.rows = Some(rows);
            session.last = None;
        }
        Err(e) => error!(error = %format!("{:#}", e), "failed to load file"),
    }
}

fn handle_compute(session: &mut Session) {
    match session.compute() {
        Ok(Some(computation)) => print_report(&computation.report),
        Ok(None) => println!("Error: No data loaded. Please load the CSV file first (option 1).\n"),
        Err(e) => error!(error = %format!("{:#}", e), "computation failed"),
    }
}

fn handle_select(session: &mut Session) {
    let Some(answer) = read_line("Hotspot rank (1 = largest): ") else {
        return;
    };
    // Non-numeric or out-of-range ranks simply leave nothing selected.
    session.select = answer
        .parse::<usize>()
        .ok()
        .and_then(|r| r.checked_sub(1))
        .unwrap_or(usize::MAX);
    match session.compute() {
        Ok(Some(computation)) => print_hotspot(&computation.report),
        Ok(None) => println!("Error: No data loaded. Please load the CSV file first (option 1).\n"),
        Err(e) => error!(error = %format!("{:#}", e), "computation failed"),
    }
}

fn handle_export(session: &Session) {
    let Some(computation) = &session.last else {
        println!("Error: Nothing computed yet (option 2).\n");
        return;
    };
    let csv_path = Path::new("emissions_results.csv");
    let json_path = Path::new("emissions_report.json");
    match output::export_computation(computation, csv_path, json_path) {
        Ok(()) => println!(
            "Exported {} and {}\n",
            csv_path.display(),
            json_path.display()
        ),
        Err(e) => error!(error = %format!("{:#}", e), "export failed"),
    }
}

fn run_interactive(args: InteractiveArgs) -> Result<()> {
    let mut session = Session {
        input: args.input,
        base: base_factors(&args.factors)?,
        preset: args.factors.preset,
        select: 0,
        rows: None,
        last: None,
    };

    loop {
        println!("Supply-chain Emissions:");
        println!("[1] Load the file");
        println!("[2] Compute emissions");
        println!("[3] Select hotspot");
        println!("[4] Export results");
        println!("[5] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session),
            "2" => {
                println!();
                handle_compute(&mut session);
                if !prompt_back_to_menu() {
                    break;
                }
            }
            "3" => handle_select(&mut session),
            "4" => handle_export(&session),
            "5" => break,
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
    println!("Exiting the program.");
    Ok(())
}
