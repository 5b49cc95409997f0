// ============================================================
// Layer 2 — InspectUseCase (scripts p1 and p3)
// ============================================================
// Writes a plain-text summary of an AIS table:
//
//   p1: raw feed       → output/P1/p1_raw_data_inspection/
//                          P1_p1_raw_data_summary.txt
//   p3: cleaned table  → output/P1/p3_cleaned_data_inspection/
//                          P1_p3_cleaned_data_summary.txt
//
// p3 reads the table p2 produced (Feather, else CSV) and fails
// with a clear message when p2 has not been run yet.

use anyhow::Result;
use std::path::PathBuf;

use crate::analysis::report::{build_summary, SummaryOptions};
use crate::application::scripts::{self, Script};
use crate::data::loader::{load_cleaned, CsvRecordSource};
use crate::domain::record::{AisRecord, Column};
use crate::domain::traits::RecordSource;
use crate::infra::{config::ProjectConfig, step_log::StepLog, table_writer::write_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectTarget {
    Raw,
    Cleaned,
}

impl InspectTarget {
    fn script(&self) -> Script {
        match self {
            InspectTarget::Raw     => Script::RawInspection,
            InspectTarget::Cleaned => Script::CleanedInspection,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            InspectTarget::Raw     => "raw",
            InspectTarget::Cleaned => "cleaned",
        }
    }
}

pub struct InspectUseCase {
    config: ProjectConfig,
    target: InspectTarget,
}

impl InspectUseCase {
    pub fn new(config: ProjectConfig, target: InspectTarget) -> Self {
        Self { config, target }
    }

    /// Run the inspection and return the summary path
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg    = &self.config;
        let script = self.target.script();
        let layout = scripts::prepare(script, &cfg.root)?;

        let records = match self.target {
            InspectTarget::Raw     => load_raw(cfg)?,
            InspectTarget::Cleaned => load_cleaned_output(cfg)?,
        };

        let title = match self.target {
            InspectTarget::Raw     => format!("{} Raw Data Inspection", layout.prefix()),
            InspectTarget::Cleaned => format!("{} Cleaned Data Inspection", layout.prefix()),
        };
        let columns = match self.target {
            InspectTarget::Raw     => raw_columns(cfg),
            InspectTarget::Cleaned => Column::ALL.to_vec(),
        };
        let summary = build_summary(&title, &records, &summary_options(cfg, columns));

        let summary_path = layout.output_file(&format!("{}_data_summary.txt", self.target.label()));
        write_text(&summary_path, &summary)?;

        let mut log = StepLog::create(layout.log_file())?;
        log.line(format!(
            "Completed {} inspection. Summary saved to {}",
            match self.target {
                InspectTarget::Raw     => "raw",
                InspectTarget::Cleaned => "cleaned-data",
            },
            summary_path.display()
        ))?;
        log.flush()?;

        tracing::info!("{} summary: '{}'", script.id(), summary_path.display());
        Ok(summary_path)
    }
}

pub fn summary_options(cfg: &ProjectConfig, columns: Vec<Column>) -> SummaryOptions {
    SummaryOptions { sample_rows: cfg.sample_rows, seed: cfg.seed, columns }
}

/// Known columns of the headerless raw feed, in configured order
pub fn raw_columns(cfg: &ProjectConfig) -> Vec<Column> {
    let mut columns = Vec::new();
    for c in cfg.raw_columns.iter().filter_map(|n| Column::from_name(n)) {
        if !columns.contains(&c) {
            columns.push(c);
        }
    }
    columns
}

/// The raw feed named in the config
pub fn load_raw(cfg: &ProjectConfig) -> Result<Vec<AisRecord>> {
    CsvRecordSource::raw(cfg.raw_data_path(), &cfg.raw_columns).load_all()
}

/// The cleaned table written by p2
pub fn load_cleaned_output(cfg: &ProjectConfig) -> Result<Vec<AisRecord>> {
    let p2 = Script::Cleaning.layout(&cfg.root);
    load_cleaned(
        &p2.output_file("cleaned_traj.feather"),
        &p2.output_file("cleaned_traj.csv"),
    )
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> (tempfile::TempDir, ProjectConfig) {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("data")).unwrap();
        fs::write(
            tmp.path().join("data/bridge_msg_filtered.csv"),
            "1,111,2024-01-01 00:00:00,10.0,59.0,3.0,90.0,90,0,0\n\
             2,111,2024-01-01 00:00:10,10.0001,59.0,3.0,90.0,90,0,0\n",
        )
        .unwrap();
        let cfg = ProjectConfig { root: tmp.path().to_path_buf(), ..Default::default() };
        (tmp, cfg)
    }

    #[test]
    fn test_raw_inspection_writes_summary_and_log() {
        let (tmp, cfg) = project();
        let path = InspectUseCase::new(cfg, InspectTarget::Raw).execute().unwrap();

        assert_eq!(
            path,
            tmp.path().join("output/P1/p1_raw_data_inspection/P1_p1_raw_data_summary.txt")
        );
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("P1_p1 Raw Data Inspection"));
        assert!(text.contains("Rows: 2"));

        let log = fs::read_to_string(
            tmp.path().join("logs/P1/p1_raw_data_inspection/p1_raw_data_inspection.log"),
        )
        .unwrap();
        assert!(log.starts_with("Completed raw inspection. Summary saved to"));
    }

    #[test]
    fn test_raw_summary_reports_configured_columns_only() {
        let (tmp, mut cfg) = project();
        fs::write(
            tmp.path().join("data/bridge_msg_filtered.csv"),
            "1,111,2024-01-01 00:00:00,10.0,59.0,3.0\n",
        )
        .unwrap();
        cfg.raw_columns = ["id", "mmsi", "timeUtc", "lon", "lat", "sog"].map(String::from).to_vec();

        let path = InspectUseCase::new(cfg, InspectTarget::Raw).execute().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.lines().any(|l| l == "Columns: 6"));
        assert!(!text.contains("trueHeading"));
        assert!(!text.contains("navigationStatus"));
    }

    #[test]
    fn test_cleaned_inspection_needs_cleaning_first() {
        let (_tmp, cfg) = project();
        let err = InspectUseCase::new(cfg, InspectTarget::Cleaned).execute().unwrap_err();
        assert!(err.to_string().contains("Please run the cleaning step first"));
    }
}
