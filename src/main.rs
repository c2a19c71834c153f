//! Oceansim CLI - synthetic predator-prey occurrence generator.
//!
//! Reads yearly ocean rasters, builds prey and predator suitability, and
//! writes a sampled occurrence table as CSV.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use oceansim::config::{SeedConfig, SimulationConfig, YearRange};
use oceansim::export::{write_report_yaml, write_table_csv};
use oceansim::raster::{expected_file_size, DirectorySource};
use oceansim::simulation::Simulation;

/// Synthetic predator-prey occurrence generator.
#[derive(Parser)]
#[command(name = "oceansim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation over a directory of yearly rasters.
    Simulate {
        /// Directory holding the sst, chlorophyll, mld, and zooplankton folders.
        #[arg(short, long)]
        input: PathBuf,

        /// YAML configuration file. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output CSV path.
        #[arg(short, long, default_value = "occurrences.csv")]
        output: PathBuf,

        /// Master seed; overrides the seeds in the configuration.
        #[arg(short, long)]
        seed: Option<u64>,

        /// First simulated year.
        #[arg(long)]
        start_year: Option<i32>,

        /// Last simulated year (inclusive).
        #[arg(long)]
        end_year: Option<i32>,

        /// Process years one at a time instead of on the thread pool.
        #[arg(long)]
        sequential: bool,

        /// Also write per-year diagnostics as YAML.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write the default configuration as YAML.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "oceansim.yaml")]
        output: PathBuf,
    },
    /// Print a configuration summary and the expected output size.
    Info {
        /// YAML configuration file. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            input,
            config,
            output,
            seed,
            start_year,
            end_year,
            sequential,
            report,
        } => run_simulate(
            &input,
            config.as_deref(),
            &output,
            seed,
            start_year,
            end_year,
            sequential,
            report.as_deref(),
        ),
        Commands::Init { output } => run_init(&output),
        Commands::Info { config } => run_info(config.as_deref()),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            Ok(SimulationConfig::load(path)?)
        }
        None => Ok(SimulationConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    input: &Path,
    config: Option<&Path>,
    output: &Path,
    seed: Option<u64>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    sequential: bool,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config)?;

    if let Some(seed) = seed {
        config.seeds = SeedConfig::from_master(seed);
    }
    if start_year.is_some() || end_year.is_some() {
        config.years = YearRange::new(
            start_year.unwrap_or(config.years.start),
            end_year.unwrap_or(config.years.end),
        );
    }
    if sequential {
        config.parallel = false;
    }

    println!("Oceansim - Predator-Prey Occurrence Generator");
    println!("=============================================");
    println!("Input: {}", input.display());
    println!("Years: {}..={}", config.years.start, config.years.end);
    println!("Output: {}", output.display());

    let start = Instant::now();

    let source = DirectorySource::open(
        input,
        &config.raster.folders,
        config.raster.geometry,
        config.years,
    )?;
    let simulation = Simulation::new(config)?;
    let table = simulation.run(&source)?;

    println!("Simulation completed in {:.2?}", start.elapsed());

    write_table_csv(&table, output)?;
    println!("  Exported {} rows: {}", table.len(), output.display());

    if let Some(report) = report {
        write_report_yaml(&table, report)?;
        println!("  Exported report: {}", report.display());
    }

    let fallbacks = table.fallback_years();
    if !fallbacks.is_empty() {
        println!("  Sampling fallbacks in years: {:?}", fallbacks);
    }
    Ok(())
}

fn run_init(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    SimulationConfig::default().save(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

fn run_info(config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    config.validate()?;

    let g = config.raster.geometry;
    let raw_bytes = expected_file_size(&g);
    let per_year = raw_bytes * 4;
    let total = per_year * config.years.len() as u64;

    println!("Oceansim - Configuration Info");
    println!("=============================");
    println!();
    println!(
        "Years: {}..={} ({} years)",
        config.years.start,
        config.years.end,
        config.years.len()
    );
    println!(
        "Grid: {} rows x {} cols, west {}, north {}, cell {}x{} deg",
        g.rows, g.cols, g.west, g.north, g.cell_width, g.cell_height
    );
    println!(
        "Folders: sst={}, chla={}, mld={}, zoo={}",
        config.raster.folders.sst,
        config.raster.folders.chla_surface,
        config.raster.folders.mld,
        config.raster.folders.zoo
    );
    println!();
    println!("Sampling:");
    println!("  Samples per year: {:>8}", config.sampling.samples_per_year);
    println!("  Prevalence:       {:>8.3}", config.sampling.prevalence);
    println!("  Expected rows:    {:>8}", config.expected_rows());
    println!();
    println!("Input size:");
    println!(
        "  Per raster:  {:>12} bytes ({:.2} MB)",
        raw_bytes,
        raw_bytes as f64 / 1024.0 / 1024.0
    );
    println!(
        "  Total:       {:>12} bytes ({:.2} MB)",
        total,
        total as f64 / 1024.0 / 1024.0
    );
    println!();
    println!(
        "Parallel: {}",
        if config.parallel { "yes (rayon)" } else { "no" }
    );
    Ok(())
}
