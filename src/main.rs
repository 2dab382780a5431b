//! # Butterfly-graph CLI
//!
//! Command-line interface for the butterfly-graph library.
//! Converts an OpenStreetMap PBF extract into a routable JSON street graph.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use butterfly_graph::{
    resolve_output_filename, run_pipeline, Connectivity, OutputOptions, OutputTarget, OverwriteBehavior,
    PipelineOptions, PipelineReport, WeightFields,
};
use clap::{Parser, ValueEnum};
use log::{error, info};

mod cli;

/// Command-line interface for butterfly-graph
#[derive(Parser)]
#[command(name = "butterfly-graph")]
#[command(about = "Builds a weighted street graph from OpenStreetMap data")]
#[command(long_about = "Builds the largest connected street graph of an OSM extract:
  butterfly-graph monaco-latest.osm.pbf              # Writes monaco-latest.json
  butterfly-graph monaco-latest.osm.pbf graph.json   # Writes graph.json
  butterfly-graph monaco-latest.osm.pbf -            # JSON to stdout

File Overwrite Behavior:
  By default, an existing output file is overwritten with a warning
  --no-clobber                     # Never overwrite, fail if file exists")]
#[command(version = env!("BUTTERFLY_VERSION"))]
struct Cli {
    /// Input OSM PBF extract
    input: PathBuf,

    /// Output file path, or "-" for stdout
    #[arg(default_value = "")]
    output: String,

    /// Weighting fields to write for each edge
    #[arg(long, value_enum, default_value_t = Weights::Both)]
    weights: Weights,

    /// Treat edges as undirected when picking the largest component
    #[arg(long)]
    undirected: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Overwrite existing files (default)
    #[arg(short, long)]
    force: bool,

    /// Never overwrite existing files (fail if destination exists)
    #[arg(long)]
    no_clobber: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Weights {
    Speed,
    Time,
    Both,
}

impl From<Weights> for WeightFields {
    fn from(weights: Weights) -> Self {
        match weights {
            Weights::Speed => WeightFields::Speed,
            Weights::Time => WeightFields::Time,
            Weights::Both => WeightFields::Both,
        }
    }
}

/// Resolve output destination from CLI arguments
fn resolve_output(input: &Path, output: &str) -> OutputTarget {
    if output.is_empty() {
        OutputTarget::File(resolve_output_filename(input))
    } else {
        OutputTarget::from_arg(output)
    }
}

fn main() {
    if let Err(e) = run() {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🦋 Butterfly-graph v{} starting...", env!("BUTTERFLY_VERSION"));
    }

    // Validate conflicting flags
    if cli.force && cli.no_clobber {
        bail!("--force and --no-clobber cannot be used together");
    }

    let output = resolve_output(&cli.input, &cli.output);
    let overwrite = if cli.no_clobber {
        OverwriteBehavior::NeverOverwrite
    } else {
        OverwriteBehavior::Force
    };
    let connectivity = if cli.undirected {
        Connectivity::Undirected
    } else {
        Connectivity::Forward
    };

    let mut options = PipelineOptions {
        connectivity,
        output: OutputOptions {
            fields: cli.weights.into(),
            pretty: cli.pretty,
            overwrite,
        },
        ..Default::default()
    };

    // No spinner when JSON goes to stdout
    let progress = match output {
        OutputTarget::File(ref path) => {
            eprintln!("📁 Saving to: {}", path.display());
            let manager = cli::ProgressManager::new(&format!("🗺️  Processing {}", cli.input.display()));
            options.progress = Some(manager.stage_callback());
            Some(manager)
        }
        OutputTarget::Stdout => None,
    };

    let result = run_pipeline(&cli.input, &output, &options);
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref manager) = progress {
                manager.abandon();
            }
            return Err(e).with_context(|| format!("failed to process {}", cli.input.display()));
        }
    };

    if let Some(ref manager) = progress {
        manager.finish("✅ Graph written");
    }
    print_report(&report);

    Ok(())
}

/// Log the summary of a finished run
fn print_report(report: &PipelineReport) {
    let build = &report.build;
    let extraction = &report.extraction;

    info!("  ✓ {} nodes read ({} duplicate ids)", build.nodes_read, build.duplicate_nodes);
    info!(
        "  ✓ {} ways read, {} kept, {} excluded",
        build.ways_read, build.ways_kept, build.ways_excluded
    );
    info!(
        "  ✓ speeds: {} tagged, {} class default, {} unparseable",
        build.speeds_tagged, build.speeds_class_default, build.speeds_defaulted
    );
    info!(
        "  ✓ {} edges inserted, {} duplicates skipped",
        build.edges_inserted, build.duplicate_edges
    );
    info!("  ✓ {} recoverable issues absorbed", build.recoverable_issues());
    info!(
        "  ✓ largest of {} components: {} nodes, {} edges",
        extraction.components, extraction.nodes, extraction.edges
    );
    info!("  ✓ done in {:.2}s", report.elapsed.as_secs_f64());
}
