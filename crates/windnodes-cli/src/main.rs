//! Windnodes - Main entry point
//!
//! Loads a CFD node dataset, groups the nodes by structural component and
//! renders the primary mirror and structure figures.

mod config;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use windnodes_core::{extract, Dataset, DatasetFormat, DisplayGroup, Extraction};
use windnodes_plot::{render, SvgBackend};

#[derive(Parser, Debug)]
#[command(name = "windnodes")]
#[command(about = "Plot CFD wind-load nodes by structural component")]
#[command(version)]
struct Args {
    /// Node dataset (overrides the configuration file)
    dataset: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "windnodes.toml")]
    config: PathBuf,

    /// Dataset encoding (guessed from the extension by default)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Directory receiving the SVG figures
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the per-category summary without rendering
    #[arg(long)]
    summary_only: bool,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    write_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pickle,
    Json,
}

impl From<FormatArg> for DatasetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pickle => DatasetFormat::Pickle,
            FormatArg::Json => DatasetFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Windnodes v{}", env!("CARGO_PKG_VERSION"));

    if args.write_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    config::apply_overrides(&mut config, &args);

    let format = config.dataset.resolved_format();
    info!(
        dataset = %config.dataset.path.display(),
        ?format,
        categories = config.categories.names.len(),
        "Configuration loaded"
    );

    // A malformed dataset or selected location aborts here, before any figure is opened
    let dataset = Dataset::from_file(&config.dataset.path, format)?;
    let extraction = extract(&dataset, &config.categories.names, &config.categories.rule())?;

    print_summary(&extraction);

    if args.summary_only {
        return Ok(());
    }

    let mut backend = SvgBackend::new(config.render.clone())?;
    render(&mut backend, &extraction)?;
    for group in DisplayGroup::ALL {
        println!("{}: {}", group.title(), backend.path_for(group).display());
    }

    Ok(())
}

fn print_summary(extraction: &Extraction) {
    let summaries = extraction.summaries();
    println!("Extracted {} categories:", summaries.len());
    for group in DisplayGroup::ALL {
        println!("  {}", group.title());
        for s in summaries.iter().filter(|s| s.group == group) {
            println!(
                "    - {:<12} {:>6} nodes  centroid [{:.3}, {:.3}, {:.3}]",
                s.category, s.count, s.centroid[0], s.centroid[1], s.centroid[2]
            );
        }
    }
}
