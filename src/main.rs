use anyhow::{Context, Result};
use blend_optimizer::{data_loader, report, BlendConfig, BlendOptimizer};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blend_optimizer")]
#[command(about = "Optimize a crude oil blend recipe against quality bounds")]
struct Args {
    /// Path to grade assay data (JSON, or CSV with --csv-assays)
    #[arg(short, long)]
    assays: PathBuf,

    /// Treat the assay file as a CSV table instead of JSON
    #[arg(long)]
    csv_assays: bool,

    /// Path to quality bounds JSON
    #[arg(short, long)]
    bounds: PathBuf,

    /// Tank capacity in barrels
    #[arg(long, default_value = "100000.0")]
    capacity: f64,

    /// Minimum total blend volume in barrels
    #[arg(long, default_value = "0.0")]
    min_volume: f64,

    /// Maximum number of grades in the blend
    #[arg(long, default_value = "3")]
    max_components: usize,

    /// Sale price of the blended product in $/bbl
    #[arg(short, long)]
    sale_price: f64,

    /// Solver time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    output: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Summary,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Loading quality bounds from {}", args.bounds.display());
    let specs = data_loader::load_quality_specs(&args.bounds)?;

    info!("Loading grade assays from {}", args.assays.display());
    let grades = if args.csv_assays {
        data_loader::load_grades_csv(&args.assays)?
    } else {
        data_loader::load_grades(&args.assays)?
    };

    let config = BlendConfig {
        tank_capacity_bbl: args.capacity,
        min_volume_bbl: args.min_volume,
        max_components: args.max_components,
        sale_price_per_bbl: args.sale_price,
        solver_time_limit_secs: args.time_limit,
    };

    info!(
        "Optimizing blend of {} candidate grades against {} quality bounds",
        grades.len(),
        specs.len()
    );
    let optimizer = BlendOptimizer::new(config.clone());
    let solution = optimizer
        .optimize(&grades, &specs)
        .context("blend optimization failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report::render_json(&solution)?),
        OutputFormat::Csv => print!("{}", report::render_csv(&solution)),
        OutputFormat::Summary => print!("{}", report::render_summary(&solution, &config)),
    }

    Ok(())
}
