//! wrlglb CLI
//!
//! Command-line interface for converting VRML catalogue exports to GLB,
//! one file or a whole directory at a time, and for inspecting results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use wrlglb_core::{ConversionOutcome, ConversionSummary};
use wrlglb_export::{
    convert_file, plan_batch, read_glb_info, BoxDimensions, ConvertSettings, GltfExportOptions,
    JsonExporter, OversizePolicy,
};
use wrlglb_parsers::logging::{install, BatchProgress, LogConfig};
use wrlglb_parsers::{decode_text, ParseOptions, Parser as ParserTrait, VrmlParser};

/// wrlglb - VRML to binary glTF converter
#[derive(Parser)]
#[command(name = "wrlglb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for structured data
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single VRML file
    Convert(ConvertArgs),

    /// Convert every VRML file in a directory
    Batch(BatchArgs),

    /// Show information about a VRML or GLB file
    Info(InfoArgs),
}

/// Options shared by `convert` and `batch`
#[derive(Args)]
struct ExportFlags {
    /// Write .gltf + .bin instead of a single .glb
    #[arg(long)]
    gltf: bool,

    /// Pretty-print the .gltf JSON
    #[arg(long)]
    pretty: bool,

    /// Meshes beyond 16-bit index range: reject or truncate
    #[arg(long, default_value = "reject")]
    oversize: OversizePolicy,

    /// Write a placeholder box (WIDTHxHEIGHTxDEPTH in mm) for files without geometry
    #[arg(long, value_name = "WxHxD")]
    fallback_box: Option<BoxDimensions>,

    /// Fail on malformed numbers instead of skipping them
    #[arg(long)]
    strict: bool,
}

impl ExportFlags {
    fn settings(&self) -> ConvertSettings {
        ConvertSettings {
            parse: ParseOptions {
                strict_validation: self.strict,
            },
            export: GltfExportOptions {
                use_glb: !self.gltf,
                pretty_json: self.pretty,
                oversize: self.oversize,
                ..Default::default()
            },
            fallback_box: self.fallback_box,
        }
    }
}

#[derive(Args)]
struct ConvertArgs {
    /// Path to the VRML file
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    export: ExportFlags,
}

#[derive(Args)]
struct BatchArgs {
    /// Directory containing .wrl files
    #[arg(short = 'd', long)]
    dir: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Number of parallel conversion threads (0 = all cores)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Write a JSON report of every outcome
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    export: ExportFlags,
}

#[derive(Args)]
struct InfoArgs {
    /// Path to a .wrl or .glb file
    #[arg(short, long)]
    input: PathBuf,
}

fn setup_logging(verbosity: u8) {
    install(&LogConfig::for_verbosity(verbosity));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Convert(args) => cmd_convert(args, cli.format),
        Commands::Batch(args) => cmd_batch(args, cli.format),
        Commands::Info(args) => cmd_info(args, cli.format),
    }
}

fn cmd_convert(args: ConvertArgs, format: OutputFormat) -> Result<()> {
    if !args.input.is_file() {
        bail!("Input file not found: {:?}", args.input);
    }

    let output_dir = match args.output {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let outcome = convert_file(&args.input, &output_dir, &args.export.settings());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&outcome),
    }

    if let ConversionOutcome::Failed { error, .. } = &outcome {
        bail!("Conversion of {:?} failed: {}", args.input, error);
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs, format: OutputFormat) -> Result<()> {
    let files = collect_scene_files(&args.dir)?;
    if files.is_empty() {
        warn!("No VRML files found in {:?}", args.dir);
    }
    info!("Converting {} files from {:?}", files.len(), args.dir);

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {:?}", args.output))?;

    let settings = args.export.settings();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()
        .context("Failed to build thread pool")?;

    let plan = plan_batch(&files);
    let progress = BatchProgress::new(plan.len());
    let _entered = progress.span().enter();

    let outcomes: Vec<ConversionOutcome> = pool.install(|| {
        plan.into_par_iter()
            .map(|(file, planned)| {
                let outcome = planned.unwrap_or_else(|| convert_file(file, &args.output, &settings));
                progress.advance();
                outcome
            })
            .collect()
    });

    let summary = ConversionSummary::from_outcomes(&outcomes);

    if let Some(report_path) = &args.report {
        JsonExporter::new()
            .export_report(&outcomes, report_path)
            .with_context(|| format!("Failed to write report {:?}", report_path))?;
        info!("Report written to {:?}", report_path);
    }

    match format {
        OutputFormat::Json => {
            let report = JsonExporter::new().report(&outcomes)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for outcome in outcomes.iter().filter(|o| !o.is_converted()) {
                print_outcome(outcome);
            }
            println!("Batch complete:");
            println!("  Converted:   {}", summary.converted);
            println!("  No geometry: {}", summary.no_geometry);
            println!("  Failed:      {}", summary.failed);
        }
    }

    if summary.failed > 0 {
        bail!("{} of {} conversions failed", summary.failed, summary.total());
    }
    Ok(())
}

/// Scene files directly inside `dir`, sorted by path
fn collect_scene_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let parser = VrmlParser::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory {:?}", dir))? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| parser.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext)));
        if path.is_file() && matches {
            files.push(path);
        }
    }

    files.sort();
    debug!("Found {} scene files", files.len());
    Ok(files)
}

fn print_outcome(outcome: &ConversionOutcome) {
    match outcome {
        ConversionOutcome::Converted {
            name,
            output,
            vertex_count,
            triangle_count,
            bytes,
            fallback,
        } => {
            let marker = if *fallback { " (placeholder box)" } else { "" };
            println!(
                "{}: {} vertices, {} triangles -> {:?} ({}){}",
                name,
                vertex_count,
                triangle_count,
                output,
                format_size(*bytes as u64),
                marker
            );
        }
        ConversionOutcome::NoGeometry { name } => println!("{}: no geometry, skipped", name),
        ConversionOutcome::Failed { name, error } => println!("{}: FAILED: {}", name, error),
    }
}

fn cmd_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let is_glb = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("glb"));

    if is_glb {
        show_glb_info(&args.input, format)
    } else {
        show_scene_info(&args.input, format)
    }
}

fn show_glb_info(path: &Path, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let info = read_glb_info(&bytes).with_context(|| format!("Invalid GLB container {:?}", path))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": info.version,
                "total_length": info.total_length,
                "json_chunk_length": info.json_chunk_length,
                "bin_chunk_length": info.bin_chunk_length,
                "document": serde_json::from_str::<serde_json::Value>(&info.json)?,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("GLB container: {:?}", path);
            println!("  Version:      {}", info.version);
            println!("  Total length: {}", format_size(u64::from(info.total_length)));
            println!("  JSON chunk:   {} bytes", info.json_chunk_length);
            match info.bin_chunk_length {
                Some(len) => println!("  BIN chunk:    {} bytes", len),
                None => println!("  BIN chunk:    none"),
            }
        }
    }

    Ok(())
}

fn show_scene_info(path: &Path, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let decoded = decode_text(&bytes);
    let geometry = VrmlParser::new()
        .parse_str(&decoded.text)
        .with_context(|| format!("Failed to extract geometry from {:?}", path))?;
    let bbox = geometry.bounding_box();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": path,
                "encoding": decoded.encoding.name(),
                "vertex_count": geometry.vertex_count(),
                "triangle_count": geometry.triangle_count(),
                "bounding_box": bbox,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("VRML scene: {:?}", path);
            println!("  Encoding:  {}", decoded.encoding.name());
            println!("  Vertices:  {}", geometry.vertex_count());
            println!("  Triangles: {}", geometry.triangle_count());
            if let Some(bbox) = bbox {
                let size = bbox.size();
                println!("  Min:       {:?}", bbox.min.to_array());
                println!("  Max:       {:?}", bbox.max.to_array());
                println!("  Size:      {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
            }
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_cli_parses_batch() {
        let cli = Cli::try_parse_from([
            "wrlglb", "-vv", "--format", "json", "batch", "-d", "in", "-o", "out", "--threads", "2",
            "--oversize", "truncate", "--fallback-box", "600x720x560",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Batch(args) => {
                let settings = args.export.settings();
                assert_eq!(args.threads, 2);
                assert_eq!(settings.export.oversize, OversizePolicy::Truncate);
                assert!(settings.export.use_glb);
                assert!(settings.fallback_box.is_some());
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn test_collect_scene_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_main.wrl", "a_geo1.WRL", "notes.txt"] {
            fs::write(dir.path().join(name), "#VRML V2.0 utf8").unwrap();
        }

        let files = collect_scene_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a_geo1.WRL", "b_main.wrl"]);
    }
}
