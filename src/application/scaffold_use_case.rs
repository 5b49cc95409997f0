// ============================================================
// Layer 2 — ScaffoldUseCase
// ============================================================
// Creates the folders a new pipeline needs:
//
//   <root>/P{N}_<name>/
//   <root>/output/P{N}/p{n}_<script>/   (+ p{n}_tables, p{n}_figures)
//   <root>/logs/P{N}/p{n}_<script>/
//
// Every name is parsed before anything is created, so a typo
// in one script name leaves the project untouched.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::layout::{parse_pipeline_dir, ScriptId, StepLayout};

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub root:          PathBuf,
    /// Pipeline folder name, e.g. `P2_vessel_statistics`
    pub pipeline:      String,
    /// Script names, e.g. `p1_load_data`
    pub scripts:       Vec<String>,
    pub analysis_dirs: bool,
}

pub struct ScaffoldUseCase {
    request: ScaffoldRequest,
}

impl ScaffoldUseCase {
    pub fn new(request: ScaffoldRequest) -> Self {
        Self { request }
    }

    /// Create the directories and return every directory path involved
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let req = &self.request;
        let (pipeline, _) = parse_pipeline_dir(&req.pipeline)?;
        let scripts = req
            .scripts
            .iter()
            .map(|s| s.parse::<ScriptId>())
            .collect::<Result<Vec<_>, _>>()?;

        let pipeline_dir = req.root.join(&req.pipeline);
        fs::create_dir_all(&pipeline_dir)
            .with_context(|| format!("Cannot create '{}'", pipeline_dir.display()))?;
        let mut created = vec![pipeline_dir];

        for script in scripts {
            let layout = StepLayout::new(&req.root, pipeline, script);
            layout
                .ensure_dirs(req.analysis_dirs)
                .with_context(|| format!("Cannot create directories for {}", layout.script()))?;
            created.push(layout.output_dir());
            created.push(layout.log_dir());
            if req.analysis_dirs {
                created.push(layout.tables_dir());
                created.push(layout.figures_dir());
            }
        }

        tracing::info!("Scaffolded {} ({} directories)", req.pipeline, created.len());
        Ok(created)
    }
}
