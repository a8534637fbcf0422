//! Flowlabel: synthetic flowchart datasets for object detection.
//!
//! Flowlabel draws random flowcharts from a knowledge graph, renders them
//! with an external flowchart renderer and reads the renderer's SVG back to
//! produce bounding-box annotations for the raster, stored as Pascal VOC
//! records.
//!
//! # Modules
//!
//! - [`svg`]: Scanning rendered SVG for nodes, edges and labels
//! - [`geometry`]: Boxes, translations and coordinate spaces
//! - [`raster`]: Renderer padding crop and the debug overlay
//! - [`annotation`]: Assembling and storing annotation records
//! - [`graph`]: Knowledge graph walks and flowchart markup
//! - [`render`]: Driving the external renderer
//! - [`export`]: The output layout and batch generation
//! - [`dataset`]: Syncing, loading and inspecting a generated dataset
//! - [`error`]: Error types for flowlabel operations

pub mod annotation;
pub mod dataset;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod raster;
pub mod render;
pub mod svg;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rand::RngExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::FlowlabelError;

/// Offsets drawn for `--random` stay below this.
const MAX_RANDOM_OFFSET: usize = 1000;

/// The flowlabel CLI application.
#[derive(Parser)]
#[command(name = "flowlabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Annotate an existing SVG/PNG rendering of one diagram.
    Annotate(AnnotateArgs),
    /// Generate random flowcharts from the knowledge graph.
    Generate(GenerateArgs),
    /// Move images and annotations without a counterpart into isolated/.
    Sync(SyncArgs),
    /// Print per-category object counts of a dataset.
    Inspect(InspectArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the annotate subcommand.
#[derive(clap::Args)]
struct AnnotateArgs {
    /// Renderer SVG output.
    #[arg(long)]
    svg: PathBuf,

    /// Renderer PNG output of the same diagram.
    #[arg(long)]
    png: PathBuf,

    /// Dataset root the results are written under.
    #[arg(long, env = "FLOWLABEL_OUTPUT", default_value = export::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// File stem of the written files (defaults to the SVG's stem).
    #[arg(long)]
    stem: Option<String>,

    /// Format of the annotation report.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

/// Arguments for the generate subcommand.
#[derive(clap::Args)]
struct GenerateArgs {
    /// Root entities, as labels or entity codes (e.g. Q64).
    entities: Vec<String>,

    /// Also draw this many random humans.
    #[arg(long, default_value_t = 0)]
    random: usize,

    /// Maximum depth of the breadth-first walk.
    #[arg(long, env = "FLOWLABEL_DEPTH", default_value_t = graph::DEFAULT_MAX_DEPTH)]
    depth: usize,

    /// Upper bound (exclusive) on children sampled per node.
    #[arg(long, env = "FLOWLABEL_MAX_CHILDREN", default_value_t = graph::DEFAULT_MAX_CHILDREN)]
    max_children: usize,

    /// Seed for reproducible batches.
    #[arg(long, env = "FLOWLABEL_SEED")]
    seed: Option<u64>,

    /// Draw flowchart block shapes and label nodes by shape.
    #[arg(long)]
    blocks: bool,

    /// Keep image URLs as image nodes.
    #[arg(long)]
    accept_images: bool,

    /// Diagrams generated in parallel.
    #[arg(long, env = "FLOWLABEL_WORKERS", default_value_t = 1)]
    workers: usize,

    /// Dataset root.
    #[arg(long, env = "FLOWLABEL_OUTPUT", default_value = export::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Path of the Mermaid CLI.
    #[arg(long, env = "FLOWLABEL_MMDC", default_value = render::DEFAULT_MMDC)]
    mmdc: PathBuf,

    /// Raster scale passed to the renderer.
    #[arg(long, env = "FLOWLABEL_SCALE", default_value_t = render::DEFAULT_SCALE)]
    scale: u32,

    /// Seconds each renderer run may take.
    #[arg(long, env = "FLOWLABEL_RENDER_TIMEOUT", default_value_t = render::DEFAULT_RENDER_TIMEOUT.as_secs())]
    render_timeout: u64,

    /// SPARQL endpoint of the knowledge graph.
    #[arg(long, env = "FLOWLABEL_SPARQL_ENDPOINT", default_value = graph::DEFAULT_SPARQL_ENDPOINT)]
    endpoint: String,

    /// Seconds each knowledge graph query may take.
    #[arg(long, env = "FLOWLABEL_QUERY_TIMEOUT", default_value_t = 60)]
    query_timeout: u64,
}

/// Arguments for the sync subcommand.
#[derive(clap::Args)]
struct SyncArgs {
    /// Dataset root holding images/ and annotations/.
    dir: PathBuf,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Dataset root holding annotations/.
    dir: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Run the flowlabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FlowlabelError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Annotate(args)) => run_annotate(args),
        Some(Commands::Generate(args)) => run_generate(args),
        Some(Commands::Sync(args)) => run_sync(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("flowlabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Synthetic flowchart datasets for object detection.");
            println!();
            println!("Run 'flowlabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when run() is called twice.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_annotate(args: AnnotateArgs) -> Result<(), FlowlabelError> {
    let stem = match args.stem {
        Some(stem) => stem,
        None => args
            .svg
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| FlowlabelError::InvalidOption {
                message: format!("cannot derive a stem from {}", args.svg.display()),
            })?,
    };

    let svg = std::fs::read_to_string(&args.svg)?;
    let raster = raster::load_raster(&args.png)?;
    let layout = export::OutputLayout::new(&args.output);
    let annotation = export::annotate_into(&layout, &stem, &svg, &raster, None)?;

    match args.report {
        ReportFormat::Json => {
            let json = serde_json::json!({
                "filename": annotation.record.filename,
                "width": annotation.record.width,
                "height": annotation.record.height,
                "objects": annotation.record.objects.len(),
                "report": annotation.report,
            });
            println!("{}", to_pretty_json(&json)?);
        }
        ReportFormat::Text => {
            println!(
                "Annotated {} ({}x{}): {} object(s)",
                annotation.record.filename,
                annotation.record.width,
                annotation.record.height,
                annotation.record.objects.len()
            );
            print!("{}", annotation.report);
        }
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), FlowlabelError> {
    let knowledge = graph::WikidataClient::new(
        args.endpoint.as_str(),
        Duration::from_secs(args.query_timeout),
    );

    let mut entities = args.entities;
    if args.random > 0 {
        let offset = rand::rng().random_range(0..=MAX_RANDOM_OFFSET);
        info!(count = args.random, offset, "drawing random entities");
        entities.extend(knowledge.humans(args.random, offset)?);
    }
    if entities.is_empty() {
        return Err(FlowlabelError::InvalidOption {
            message: "no entities given; pass ENTITY arguments or --random N".to_string(),
        });
    }

    let renderer = render::MermaidCli {
        program: args.mmdc,
        scale: args.scale,
        timeout: Duration::from_secs(args.render_timeout),
    };
    let options = export::GenerateOptions {
        max_depth: args.depth,
        max_children: args.max_children,
        accept_images: args.accept_images,
        blocks: args.blocks,
        seed: args.seed,
        workers: args.workers,
    };
    let layout = export::OutputLayout::new(args.output);

    let summary = export::generate_batch(&knowledge, &renderer, &layout, &entities, &options)?;
    println!(
        "Generated {} of {} diagram(s) ({} skipped, {} failed) in {}",
        summary.succeeded.len(),
        summary.total(),
        summary.skipped.len(),
        summary.failed.len(),
        layout.root().display()
    );
    for (entity, reason) in &summary.failed {
        println!("  failed {entity}: {reason}");
    }

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(FlowlabelError::BatchFailed {
            failed: summary.failed.len(),
        })
    }
}

fn run_sync(args: SyncArgs) -> Result<(), FlowlabelError> {
    let outcome = dataset::sync_images_and_labels(&args.dir)?;
    println!(
        "Synced {}: {} pair(s), {} image(s) and {} annotation(s) isolated",
        args.dir.display(),
        outcome.matched,
        outcome.isolated_images.len(),
        outcome.isolated_annotations.len()
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), FlowlabelError> {
    let report = dataset::inspect_annotations(&args.dir.join(dataset::ANNOTATIONS_DIR))?;
    match args.output {
        ReportFormat::Json => {
            println!("{}", to_pretty_json(&report)?);
        }
        ReportFormat::Text => print!("{report}"),
    }
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, FlowlabelError> {
    serde_json::to_string_pretty(value).map_err(|source| FlowlabelError::ReportSerialize { source })
}
