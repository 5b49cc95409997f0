// ============================================================
// Layer 2 — RunAllUseCase
// ============================================================
// Runs the whole P1 pipeline in script order:
//
//   p1 inspect raw → p2 clean → p3 inspect cleaned → p4 grids
//
// Stops at the first failing script; earlier outputs stay.

use anyhow::{Context, Result};

use crate::application::{
    clean_use_case::{CleanSummary, CleanUseCase},
    grid_use_case::{GridCompareOutput, GridCompareUseCase},
    inspect_use_case::{InspectTarget, InspectUseCase},
    scripts,
};
use crate::infra::config::ProjectConfig;

#[derive(Debug, Clone)]
pub struct RunAllReport {
    pub clean: CleanSummary,
    pub grids: GridCompareOutput,
}

pub struct RunAllUseCase {
    config: ProjectConfig,
}

impl RunAllUseCase {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunAllReport> {
        let cfg = &self.config;
        tracing::info!("Running {} in '{}'", scripts::pipeline_dir_name(), cfg.root.display());

        tracing::info!("[1/4] Raw data inspection");
        InspectUseCase::new(cfg.clone(), InspectTarget::Raw)
            .execute()
            .context("p1_raw_data_inspection failed")?;

        tracing::info!("[2/4] Trajectory cleaning");
        let clean = CleanUseCase::new(cfg.clone())
            .execute()
            .context("p2_traj_cleaning failed")?;

        tracing::info!("[3/4] Cleaned data inspection");
        InspectUseCase::new(cfg.clone(), InspectTarget::Cleaned)
            .execute()
            .context("p3_cleaned_data_inspection failed")?;

        tracing::info!("[4/4] Before/after grid comparison");
        let grids = GridCompareUseCase::new(cfg.clone())
            .execute()
            .context("p4_points_before_after_plot failed")?;

        Ok(RunAllReport { clean, grids })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_all_produces_every_script_output() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("data")).unwrap();
        fs::write(
            tmp.path().join("data/bridge_msg_filtered.csv"),
            "1,111,2024-01-01 00:00:00,10.0000,59.0,5.0,90,90,0,0\n\
             2,111,2024-01-01 00:01:00,10.0005,59.0,5.0,90,90,0,0\n\
             3,222,2024-01-01 00:00:00,10.0002,59.0001,99.0,90,90,0,0\n",
        )
        .unwrap();
        let cfg = ProjectConfig { root: tmp.path().to_path_buf(), ..Default::default() };

        let report = RunAllUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.clean.input_rows, 3);
        assert_eq!(report.clean.cleaned_rows, 2);

        let out = tmp.path().join("output/P1");
        assert!(out.join("p1_raw_data_inspection/P1_p1_raw_data_summary.txt").exists());
        assert!(out.join("p3_cleaned_data_inspection/P1_p3_cleaned_data_summary.txt").exists());
        assert!(report.grids.figure_png.exists());
        assert!(report.grids.figure_svg.exists());
    }

    #[test]
    fn test_run_all_stops_at_missing_raw_data() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ProjectConfig { root: tmp.path().to_path_buf(), ..Default::default() };
        let err = RunAllUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("p1_raw_data_inspection failed"));
        assert!(!tmp.path().join("output/P1/p2_traj_cleaning").exists());
    }
}
