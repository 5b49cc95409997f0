// ============================================================
// Layer 2 — The P1 Pipeline and Its Scripts
// ============================================================
// P1_data_statistics_traj_cleaning holds four scripts, run in
// this order:
//
//   p1_raw_data_inspection       → summary of the raw feed
//   p2_traj_cleaning             → cleaned table + reports
//   p3_cleaned_data_inspection   → summary of the cleaned table
//   p4_points_before_after_plot  → grid density before/after
//
// Use cases ask this module for their StepLayout instead of
// spelling out directory names.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::layout::{PipelineId, ScriptId, StepLayout};

pub const PIPELINE: PipelineId = PipelineId(1);
pub const PIPELINE_NAME: &str = "data_statistics_traj_cleaning";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    RawInspection,
    Cleaning,
    CleanedInspection,
    GridCompare,
}

impl Script {
    pub const ALL: [Script; 4] = [
        Script::RawInspection,
        Script::Cleaning,
        Script::CleanedInspection,
        Script::GridCompare,
    ];

    pub fn number(&self) -> u32 {
        match self {
            Script::RawInspection     => 1,
            Script::Cleaning          => 2,
            Script::CleanedInspection => 3,
            Script::GridCompare       => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Script::RawInspection     => "raw_data_inspection",
            Script::Cleaning          => "traj_cleaning",
            Script::CleanedInspection => "cleaned_data_inspection",
            Script::GridCompare       => "points_before_after_plot",
        }
    }

    pub fn id(&self) -> ScriptId {
        ScriptId { number: self.number(), name: self.name().to_string() }
    }

    pub fn layout(&self, root: &Path) -> StepLayout {
        StepLayout::new(root, PIPELINE, self.id())
    }
}

/// `P1_data_statistics_traj_cleaning`
pub fn pipeline_dir_name() -> String {
    format!("{PIPELINE}_{PIPELINE_NAME}")
}

/// Layout for a script with its output and log directories created
pub fn prepare(script: Script, root: &Path) -> Result<StepLayout> {
    let layout = script.layout(root);
    layout
        .ensure_dirs(false)
        .with_context(|| format!("Cannot create directories for {}", layout.script()))?;
    Ok(layout)
}
