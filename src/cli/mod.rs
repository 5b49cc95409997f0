// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Global flags:
//   --config <file.json>  project config (defaults otherwise)
//   --root <dir>          project root, overrides the config
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::domain::layout::{PipelineId, ScriptId};
use crate::infra::config::ProjectConfig;
use commands::{BatchArgs, Commands, ConfigCommand};

#[derive(Parser, Debug)]
#[command(
    name = "ais-traj",
    version = "0.1.0",
    about = "AIS trajectory inspection, cleaning and grid comparison, organised as P{N}/p{n} pipelines."
)]
pub struct Cli {
    /// Project config file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the config, then route to the use case.
    /// The CLI layer only routes, it never computes.
    pub fn run(self) -> Result<()> {
        let mut cfg = ProjectConfig::load_or_default(self.config.as_deref())?;
        if let Some(root) = &self.root {
            cfg.root = root.clone();
        }

        match self.command {
            Commands::Scaffold(args) => {
                use crate::application::scaffold_use_case::ScaffoldUseCase;
                let created = ScaffoldUseCase::new(args.into_request(cfg.root.clone())).execute()?;
                for dir in created {
                    println!("{}", dir.display());
                }
                Ok(())
            }
            Commands::Lint => Self::run_lint(&cfg),
            Commands::InspectRaw(args) => {
                use crate::application::inspect_use_case::{InspectTarget, InspectUseCase};
                args.apply(&mut cfg);
                cfg.validate()?;
                let path = InspectUseCase::new(cfg, InspectTarget::Raw).execute()?;
                println!("Raw data summary saved to {}", path.display());
                Ok(())
            }
            Commands::Clean(args) => {
                use crate::application::clean_use_case::CleanUseCase;
                args.apply(&mut cfg);
                cfg.validate()?;
                let summary = CleanUseCase::new(cfg).execute()?;
                println!(
                    "Cleaned {} -> {} rows ({} removed)",
                    summary.input_rows,
                    summary.cleaned_rows,
                    summary.removed_rows()
                );
                Ok(())
            }
            Commands::InspectCleaned(args) => {
                use crate::application::inspect_use_case::{InspectTarget, InspectUseCase};
                args.apply(&mut cfg);
                cfg.validate()?;
                let path = InspectUseCase::new(cfg, InspectTarget::Cleaned).execute()?;
                println!("Cleaned data summary saved to {}", path.display());
                Ok(())
            }
            Commands::GridCompare(args) => {
                use crate::application::grid_use_case::GridCompareUseCase;
                args.apply(&mut cfg);
                cfg.validate()?;
                let out = GridCompareUseCase::new(cfg).execute()?;
                println!("Figure saved to {} and {}", out.figure_png.display(), out.figure_svg.display());
                Ok(())
            }
            Commands::RunAll(args) => {
                use crate::application::run_all_use_case::RunAllUseCase;
                args.apply(&mut cfg);
                cfg.validate()?;
                let report = RunAllUseCase::new(cfg).execute()?;
                println!(
                    "Pipeline complete: {} -> {} rows, figure at {}",
                    report.clean.input_rows,
                    report.clean.cleaned_rows,
                    report.grids.figure_png.display()
                );
                Ok(())
            }
            Commands::Batch(args) => Self::run_batch(cfg, args),
            Commands::Config(ConfigCommand::Show) => {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
                Ok(())
            }
        }
    }

    /// Print findings; any finding makes the command fail
    fn run_lint(cfg: &ProjectConfig) -> Result<()> {
        use crate::application::lint_use_case::LintUseCase;

        let findings = LintUseCase::new(cfg.root.clone()).execute()?;
        if findings.is_empty() {
            println!("No convention problems found.");
            return Ok(());
        }
        for f in &findings {
            println!("- {f}");
        }
        anyhow::bail!("{} convention problem(s) found", findings.len())
    }

    fn run_batch(mut cfg: ProjectConfig, args: BatchArgs) -> Result<()> {
        use crate::application::batch_use_case::BatchInspectUseCase;

        args.inspect.apply(&mut cfg);
        if let Some(w) = args.workers {
            cfg.workers = w;
        }
        let pipeline: PipelineId = args.pipeline.parse()?;
        let script: ScriptId     = args.script.parse()?;

        let outcomes = BatchInspectUseCase::new(cfg, args.input, pipeline, script).execute()?;
        let mut failed = 0;
        for o in &outcomes {
            match &o.result {
                Ok(summary) => println!("ok     {} -> {}", o.path.display(), summary.display()),
                Err(e) => {
                    failed += 1;
                    println!("FAILED {}: {e:#}", o.path.display());
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {} file(s) failed", outcomes.len());
        }
        Ok(())
    }
}
