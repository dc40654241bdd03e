//! printorient CLI - pick the best print orientation for STL and 3MF files
//!
//! Reads STL or 3MF files, searches for the build direction with the lowest
//! estimated print cost, and writes the rotated mesh as a Z-up STL next to
//! the input.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use printorient::{
    analyze_faces, load_mesh, orient_mesh, oriented_file_name, save_stl, score_breakdown,
    BakeOutcome, MeshStats, OrientParams, OrientationResult, TriangleSoup,
};
use printorient_math::Vec3;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "printorient")]
#[command(about = "Find the best 3D printing orientation for STL and 3MF files", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Orient mesh files and write the rotated copies as STL
    Orient {
        /// Input STL or 3MF files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output file for a single input, or output directory for several
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML file with orientation parameters
        #[arg(long)]
        config: Option<PathBuf>,
        /// Input files are already Y-up
        #[arg(long)]
        y_up: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display dimensions and triangle count of a mesh file
    Info {
        /// Input STL or 3MF file
        file: PathBuf,
    },
    /// Score one build direction and print the cost terms
    Score {
        /// Input STL or 3MF file
        file: PathBuf,
        /// Build direction as X,Y,Z in the working (Y-up) frame
        #[arg(long, allow_hyphen_values = true)]
        up: Direction,
        /// TOML file with orientation parameters
        #[arg(long)]
        config: Option<PathBuf>,
        /// Input file is already Y-up
        #[arg(long)]
        y_up: bool,
        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },
}

/// A direction given on the command line as `X,Y,Z`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Direction(Vec3);

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid component: {e}"))?;
        let [x, y, z] = parts[..] else {
            return Err(format!("expected 3 components, got {}", parts.len()));
        };
        Vec3::new(x, y, z)
            .try_normalize(1e-12)
            .map(Direction)
            .ok_or_else(|| "direction has zero length".to_string())
    }
}

/// Per-file result of `orient`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    input: PathBuf,
    /// Written file, absent when the mesh was already optimal.
    output: Option<PathBuf>,
    result: OrientationResult,
    stats: MeshStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Orient {
            files,
            output,
            config,
            y_up,
            json,
        } => {
            let params = load_params(config.as_deref())?;
            orient_files(&files, output.as_deref(), &params, y_up, json)?;
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
        Commands::Score {
            file,
            up,
            config,
            y_up,
            json,
        } => {
            let params = load_params(config.as_deref())?;
            show_score(&file, up, &params, y_up, json)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_params(path: Option<&Path>) -> Result<OrientParams> {
    let params = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let params: OrientParams = toml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            debug!(config = %path.display(), "Loaded parameters");
            params
        }
        None => OrientParams::default(),
    };
    params.validate()?;
    Ok(params)
}

/// Load a mesh and bring it into the Y-up working frame unless it is
/// already there.
fn load_working_mesh(path: &Path, y_up: bool) -> Result<TriangleSoup> {
    let (format, mesh) = load_mesh(path).with_context(|| format!("loading {}", path.display()))?;
    debug!(file = %path.display(), ?format, "Loaded mesh");
    if y_up {
        Ok(mesh)
    } else {
        Ok(format.to_working_frame(&mesh)?)
    }
}

/// Where the oriented copy of `input` goes.
fn output_path(input: &Path, output: Option<&Path>, batch: bool) -> PathBuf {
    let name = oriented_file_name(input.file_name().and_then(|n| n.to_str()));
    match output {
        Some(out) if batch => out.join(name),
        Some(out) => out.to_path_buf(),
        None => input.with_file_name(name),
    }
}

fn orient_files(
    files: &[PathBuf],
    output: Option<&Path>,
    params: &OrientParams,
    y_up: bool,
    json: bool,
) -> Result<()> {
    let batch = files.len() > 1;
    if batch {
        if let Some(dir) = output {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }
    }

    let results: Vec<(&PathBuf, Result<FileReport>)> = files
        .par_iter()
        .map(|input| {
            let target = output_path(input, output, batch);
            (input, orient_file(input, &target, params, y_up))
        })
        .collect();

    let mut reports = Vec::new();
    let mut failed = 0;
    for (input, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(file = %input.display(), "{e:#}");
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files failed", files.len());
    }
    Ok(())
}

fn orient_file(
    input: &Path,
    target: &Path,
    params: &OrientParams,
    y_up: bool,
) -> Result<FileReport> {
    let mut mesh = load_working_mesh(input, y_up)?;
    let outcome = orient_mesh(&mut mesh, params)?;

    let output = match outcome.bake {
        BakeOutcome::AlreadyOptimal => {
            info!(file = %input.display(), "Already optimal, nothing written");
            None
        }
        BakeOutcome::Rotated(_) => {
            let saved = if y_up { mesh.clone() } else { mesh.y_up_to_z_up()? };
            save_stl(target, &saved).with_context(|| format!("writing {}", target.display()))?;
            Some(target.to_path_buf())
        }
    };

    Ok(FileReport {
        input: input.to_path_buf(),
        output,
        result: outcome.result,
        stats: mesh.stats(),
    })
}

fn print_report(report: &FileReport) {
    let [x, y, z] = report.result.direction;
    println!("{}", report.input.display());
    println!("  Up:         ({x:.3}, {y:.3}, {z:.3})");
    println!("  Cost:       {:.4}", report.result.cost);
    println!("  Candidates: {}", report.result.candidate_count);
    println!("  Time:       {} ms", report.result.time_ms);
    println!("  Size:       {}", report.stats);
    match &report.output {
        Some(path) => println!("  Wrote:      {}", path.display()),
        None => println!("  Already optimal"),
    }
}

fn show_info(file: &Path) -> Result<()> {
    let (_, mesh) = load_mesh(file).with_context(|| format!("loading {}", file.display()))?;
    let stats = mesh.stats();

    println!("File: {}", file.display());
    println!("Triangles: {}", stats.triangle_count);
    println!("Size: {stats}");
    if let Some((min, max)) = mesh.bounds() {
        println!(
            "Bounds: ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    Ok(())
}

fn show_score(
    file: &Path,
    up: Direction,
    params: &OrientParams,
    y_up: bool,
    json: bool,
) -> Result<()> {
    let mesh = load_working_mesh(file, y_up)?;
    let faces = analyze_faces(&mesh);
    let breakdown = score_breakdown(&up.0, &faces, &params.score);

    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        println!("Up: ({:.3}, {:.3}, {:.3})", up.0.x, up.0.y, up.0.z);
        println!("  Bottom:      {:.4}", breakdown.bottom);
        println!("  Overhang:    {:.4}", breakdown.overhang);
        println!("  Contour:     {:.4}", breakdown.contour);
        println!("  Bottom hull: {:.4}", breakdown.bottom_hull);
        println!("  Cost:        {:.4}", breakdown.cost);
    }
    Ok(())
}
