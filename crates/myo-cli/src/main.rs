//! myocsa: muscle volume and maximum cross-sectional area from STL meshes.
//!
//! Walks `<input_root>/<subject>/<mesh_dir>/*.stl`, measures every muscle
//! and writes one `<subject>_muscle_volumes.csv` per subject.
//!
//! # Logging
//!
//! Progress is logged to stderr. `-v` raises the level to debug (per-level
//! areas), `-vv` to trace, `-q` silences everything; `RUST_LOG` overrides
//! the flags.
//!
//! # Example
//!
//! ```bash
//! myocsa batch /data/HYA --output /data/results
//! myocsa --config study.toml batch --plane-mode axis-aligned
//! myocsa measure /data/HYA/HYA01/MRI/HYA01_vasmed_r.stl --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use myo_mesh::{MeshLoader, StlLoader};
use myo_section::{measure, CutProtocol, MuscleMeasurement, PlaneMode};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod batch;
mod config;
mod sink;

use config::{Config, Overrides};
use sink::CsvSink;

#[derive(Parser)]
#[command(name = "myocsa")]
#[command(about = "Muscle volume and maximum CSA from segmented STL meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress all log output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure every muscle of every subject under an input root
    Batch(BatchArgs),
    /// Measure a single mesh and print every level
    Measure {
        /// Input STL file
        file: PathBuf,
        /// Muscle name (default: derived from the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// Directory with one subdirectory per subject
    input_root: Option<PathBuf>,
    /// Directory for the CSV files (default: each subject's mesh directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Mesh directory name inside each subject
    #[arg(long)]
    mesh_dir: Option<String>,
    /// Characters dropped from the file stem to get the muscle name
    #[arg(long)]
    prefix_len: Option<usize>,
    /// Number of cut levels
    #[arg(long)]
    slices: Option<usize>,
    /// Level spacing as a fraction of the axis length
    #[arg(long)]
    increment: Option<f64>,
    /// Cutting plane orientation
    #[arg(long)]
    plane_mode: Option<PlaneModeArg>,
    /// Level layout
    #[arg(long)]
    protocol: Option<ProtocolArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlaneModeArg {
    /// Orthogonal to the origin-insertion line
    AlongAxis,
    /// Orthogonal to the designated coordinate axis
    AxisAligned,
}

impl From<PlaneModeArg> for PlaneMode {
    fn from(arg: PlaneModeArg) -> Self {
        match arg {
            PlaneModeArg::AlongAxis => PlaneMode::AlongAxis,
            PlaneModeArg::AxisAligned => PlaneMode::AxisAligned,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProtocolArg {
    /// Evenly spaced levels between 10 % and 90 %
    Full,
    /// Midpoint and one level either side
    Midbelly,
}

impl From<ProtocolArg> for CutProtocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Full => CutProtocol::Full,
            ProtocolArg::Midbelly => CutProtocol::Midbelly,
        }
    }
}

impl From<BatchArgs> for Overrides {
    fn from(args: BatchArgs) -> Self {
        Overrides {
            input_root: args.input_root,
            output_root: args.output,
            mesh_dir: args.mesh_dir,
            name_prefix_len: args.prefix_len,
            slice_count: args.slices,
            increment: args.increment,
            plane_mode: args.plane_mode.map(Into::into),
            protocol: args.protocol.map(Into::into),
        }
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over the -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn,myocsa=info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Batch(args) => {
            config.apply(args.into());
            batch::run_batch(&config, &StlLoader, &CsvSink)?;
        }
        Commands::Measure { file, name, json } => {
            measure_file(&config, &file, name, json)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LevelInfo {
    index: usize,
    fraction: f64,
    point: [f64; 3],
    area_mm2: f64,
    perimeter_mm: f64,
    loops: usize,
    open_chains: usize,
}

#[derive(Serialize)]
struct MeasureInfo<'a> {
    path: String,
    record: &'a myo_section::MuscleRecord,
    origin: [f64; 3],
    insertion: [f64; 3],
    axis_length_mm: f64,
    levels: Vec<LevelInfo>,
    volume: &'a myo_section::VolumeReport,
}

impl<'a> MeasureInfo<'a> {
    fn new(path: &Path, m: &'a MuscleMeasurement) -> Self {
        let xyz = |p: &myo_math::Point3| [p.x, p.y, p.z];
        Self {
            path: path.display().to_string(),
            record: &m.record,
            origin: xyz(&m.axis.origin),
            insertion: xyz(&m.axis.insertion),
            axis_length_mm: m.axis.length(),
            levels: m
                .levels
                .iter()
                .map(|l| LevelInfo {
                    index: l.level.index,
                    fraction: l.level.fraction,
                    point: xyz(&l.level.point),
                    area_mm2: l.area_mm2,
                    perimeter_mm: l.perimeter_mm,
                    loops: l.loops,
                    open_chains: l.open_chains,
                })
                .collect(),
            volume: &m.volume,
        }
    }
}

fn measure_file(config: &Config, file: &Path, name: Option<String>, json: bool) -> Result<()> {
    let name = name.unwrap_or_else(|| config.muscle_name(file));
    let mesh = StlLoader
        .load(file)
        .with_context(|| format!("Failed to load mesh from {}", file.display()))?;
    let measurement = measure(&name, &mesh, &config.csa)
        .with_context(|| format!("Failed to measure {}", file.display()))?;
    let info = MeasureInfo::new(file, &measurement);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Muscle: {}", info.record.muscle);
    println!("  File: {}", info.path);
    println!(
        "  Origin: ({:.2}, {:.2}, {:.2})",
        info.origin[0], info.origin[1], info.origin[2]
    );
    println!(
        "  Insertion: ({:.2}, {:.2}, {:.2})",
        info.insertion[0], info.insertion[1], info.insertion[2]
    );
    println!("  Axis length: {:.2} mm", info.axis_length_mm);
    println!("\nLevels:");
    for level in &info.levels {
        println!(
            "  {:>2}: {:>5.1} %  {:>10.2} mm²  {:>8.2} mm  ({} loop(s), {} open)",
            level.index,
            level.fraction * 100.0,
            level.area_mm2,
            level.perimeter_mm,
            level.loops,
            level.open_chains
        );
    }
    println!("\nVolume: {:.3} cm³ ({:.1} mm³)", info.volume.volume_cm3, info.volume.volume_mm3);
    if !info.volume.is_closed() {
        println!(
            "  Surface not closed: {} boundary, {} non-manifold edge(s)",
            info.volume.boundary_edges, info.volume.non_manifold_edges
        );
    }
    println!("CSA max: {:.2} mm²", info.record.csa_max_mm2);
    Ok(())
}
