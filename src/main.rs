use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use shipyard_emissions::scenario::primary_quantity;
use shipyard_emissions::sensitivity::CONVENTIONAL_DELTA_RANGE;
use shipyard_emissions::{
    EmissionFactorCatalog, EmissionReport, Phase, Pollutant, Scenario, SensitivityOutcome,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Air-pollutant emission estimates for steel shipbuilding phases."
)]
struct Cli {
    /// Log phase accumulation at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-phase emissions and combined totals for a scenario.
    Report {
        #[arg(long)]
        scenario: PathBuf,

        /// JSON catalog replacing the built-in factor tables.
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Re-run one phase with its primary quantity changed by a percentage.
    Sensitivity {
        #[arg(long)]
        scenario: PathBuf,

        #[arg(long)]
        phase: Phase,

        #[arg(long, allow_negative_numbers = true)]
        delta: f64,

        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the built-in emission factor catalog as JSON.
    Catalog,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Csv,
    Json,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&Path>) -> Result<EmissionFactorCatalog> {
    match path {
        Some(p) => EmissionFactorCatalog::from_file(p)
            .with_context(|| format!("failed to load catalog: {}", p.display())),
        None => Ok(EmissionFactorCatalog::builtin()),
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    Scenario::from_file(path).with_context(|| format!("failed to load scenario: {}", path.display()))
}

/// `1234567.8` -> `"1,234,568"`.
fn thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}

fn print_report(report: &EmissionReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Format::Csv => {
            println!("phase,pollutant,grams");
            for outcome in &report.phases {
                if let Some(emissions) = &outcome.emissions {
                    for (pollutant, grams) in emissions {
                        println!("{},{},{:.6}", outcome.phase.key(), pollutant, grams.0);
                    }
                }
            }
            for (pollutant, grams) in report.totals.iter() {
                println!("total,{},{:.6}", pollutant, grams.0);
            }
        }
        Format::Text => {
            for outcome in &report.phases {
                println!("== {}", outcome.phase);
                match (&outcome.emissions, &outcome.error) {
                    (Some(emissions), _) => {
                        for (pollutant, grams) in emissions {
                            println!("  {:<6} {:>18.2} g", pollutant.label(), grams.0);
                        }
                    }
                    (None, Some(err)) => println!("  rejected: {err}"),
                    (None, None) => {}
                }
            }
            println!("== Combined totals");
            for (pollutant, grams) in report.totals.iter() {
                println!("  {:<6} {:>18.2} g", pollutant.label(), grams.0);
            }
            println!();
            println!("Summary of all emissions");
            for (pollutant, grams) in report.totals.iter() {
                if pollutant == Pollutant::Co2 {
                    println!(
                        "- {}: {} g ({:.2} metric tons)",
                        pollutant,
                        thousands(grams.0),
                        grams.to_metric_tons()
                    );
                } else {
                    println!("- {}: {} g", pollutant, thousands(grams.0));
                }
            }
        }
    }
    Ok(())
}

fn print_sensitivity(phase: Phase, outcome: &SensitivityOutcome, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        Format::Csv => {
            println!("pollutant,baseline_g,adjusted_g,delta_g");
            if let Some(report) = outcome.report() {
                for (pollutant, row) in &report.rows {
                    println!(
                        "{},{:.6},{:.6},{:.6}",
                        pollutant, row.baseline.0, row.adjusted.0, row.delta.0
                    );
                }
            }
        }
        Format::Text => match outcome {
            SensitivityOutcome::Unavailable { .. } => {
                println!(
                    "{} sensitivity unavailable: enter a positive {} first.",
                    phase,
                    primary_quantity(phase)
                );
            }
            SensitivityOutcome::Computed(report) => {
                println!(
                    "{} sensitivity: {} {} -> {} ({:+}%)",
                    phase,
                    primary_quantity(phase),
                    report.baseline_input,
                    report.adjusted_input,
                    report.delta_percent
                );
                println!(
                    "  {:<6} {:>18} {:>18} {:>18}",
                    "", "Baseline (g)", "Adjusted (g)", "Δ (g)"
                );
                for (pollutant, row) in &report.rows {
                    println!(
                        "  {:<6} {:>18.2} {:>18.2} {:>+18.2}",
                        pollutant.label(),
                        row.baseline.0,
                        row.adjusted.0,
                        row.delta.0
                    );
                }
            }
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Report {
            scenario,
            catalog,
            format,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let scenario = load_scenario(&scenario)?;
            let report = EmissionReport::compute(&scenario, &catalog);
            print_report(&report, format)?;
        }
        Command::Sensitivity {
            scenario,
            phase,
            delta,
            catalog,
            format,
        } => {
            let (lo, hi) = CONVENTIONAL_DELTA_RANGE;
            if delta < lo || delta > hi {
                warn!(delta, "delta outside the conventional {}..{} % range", lo, hi);
            }
            let catalog = load_catalog(catalog.as_deref())?;
            let scenario = load_scenario(&scenario)?;
            let outcome = scenario
                .sensitivity(phase, &catalog, delta)
                .with_context(|| format!("{phase} sensitivity failed"))?;
            print_sensitivity(phase, &outcome, format)?;
        }
        Command::Catalog => {
            println!("{}", EmissionFactorCatalog::builtin().to_json()?);
        }
    }

    Ok(())
}
