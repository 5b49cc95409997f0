// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per pipeline script, plus project tools:
//
//   scaffold / lint               → naming conventions
//   inspect-raw / clean /
//   inspect-cleaned / grid-compare → scripts p1..p4
//   run-all                       → p1..p4 in order
//   batch                         → parallel inspection of a folder
//   config show                   → print the effective config
//
// Flags override the matching ProjectConfig fields; anything
// not given keeps its config-file or default value.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::scaffold_use_case::ScaffoldRequest;
use crate::infra::config::ProjectConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the folders for a new pipeline
    Scaffold(ScaffoldArgs),

    /// Check that pipeline, script, output and log names follow the conventions
    Lint,

    /// p1: summarise the raw AIS feed
    InspectRaw(InspectArgs),

    /// p2: clean trajectories and write tables and a report
    Clean(CleanArgs),

    /// p3: summarise the cleaned table
    InspectCleaned(InspectArgs),

    /// p4: compare grid density before and after cleaning
    GridCompare(GridArgs),

    /// Run p1, p2, p3 and p4 in order
    RunAll(RunAllArgs),

    /// Inspect every .csv / .feather file in a folder in parallel
    Batch(BatchArgs),

    /// Configuration helpers
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,
}

#[derive(Args, Debug)]
pub struct ScaffoldArgs {
    /// Pipeline folder name, e.g. P2_vessel_statistics
    #[arg(long)]
    pub pipeline: String,

    /// Script name, e.g. p1_load_data (repeatable)
    #[arg(long = "script", required = true)]
    pub scripts: Vec<String>,

    /// Also create p{n}_tables and p{n}_figures folders
    #[arg(long)]
    pub analysis_dirs: bool,
}

impl ScaffoldArgs {
    pub fn into_request(self, root: PathBuf) -> ScaffoldRequest {
        ScaffoldRequest {
            root,
            pipeline:      self.pipeline,
            scripts:       self.scripts,
            analysis_dirs: self.analysis_dirs,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct InspectArgs {
    /// Seed for the sample rows
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of sample rows in the summary
    #[arg(long)]
    pub sample_rows: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    /// Cleaning steps in order, comma separated
    #[arg(long, value_delimiter = ',')]
    pub steps: Option<Vec<String>>,

    /// Reported speed limit in knots
    #[arg(long)]
    pub max_speed_knots: Option<f64>,

    /// Implied speed limit between fixes in knots
    #[arg(long)]
    pub max_implied_speed_knots: Option<f64>,

    /// Per-vessel z-score limit for reported speed
    #[arg(long)]
    pub speed_z_threshold: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub struct GridArgs {
    /// Grid cell size in metres
    #[arg(long)]
    pub resolution: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub struct RunAllArgs {
    #[command(flatten)]
    pub inspect: InspectArgs,

    #[command(flatten)]
    pub clean: CleanArgs,

    #[command(flatten)]
    pub grid: GridArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Folder holding the input files
    #[arg(long)]
    pub input: PathBuf,

    /// Parallel workers (default from config)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Pipeline the batch outputs belong to
    #[arg(long, default_value = "P1")]
    pub pipeline: String,

    /// Script name used for the batch output and log folders
    #[arg(long, default_value = "p5_batch_inspection")]
    pub script: String,

    #[command(flatten)]
    pub inspect: InspectArgs,
}

// ─── Overrides ────────────────────────────────────────────────────────────────
// Each args struct patches only the config fields it carries.

impl InspectArgs {
    pub fn apply(&self, cfg: &mut ProjectConfig) {
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(n) = self.sample_rows {
            cfg.sample_rows = n;
        }
    }
}

impl CleanArgs {
    pub fn apply(&self, cfg: &mut ProjectConfig) {
        let c = &mut cfg.cleaning;
        if let Some(steps) = &self.steps {
            c.steps = steps.iter().map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = self.max_speed_knots {
            c.max_speed_knots = v;
        }
        if let Some(v) = self.max_implied_speed_knots {
            c.max_implied_speed_knots = v;
        }
        if self.speed_z_threshold.is_some() {
            c.speed_z_threshold = self.speed_z_threshold;
        }
    }
}

impl GridArgs {
    pub fn apply(&self, cfg: &mut ProjectConfig) {
        if let Some(res) = self.resolution {
            cfg.grid_resolution_m = res;
        }
    }
}

impl RunAllArgs {
    pub fn apply(&self, cfg: &mut ProjectConfig) {
        self.inspect.apply(cfg);
        self.clean.apply(cfg);
        self.grid.apply(cfg);
    }
}
