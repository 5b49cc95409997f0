// ============================================================
// Layer 2 — CleanUseCase (script p2)
// ============================================================
// Orchestrates trajectory cleaning end to end:
//
//   Step 1: Load the raw feed                (Layer 4 - data)
//   Step 2: Run the cleaning step chain      (Layer 4 - data)
//   Step 3: Save the cleaned table           (Feather + CSV)
//   Step 4: Build step / row-change /
//           interval tables                  (Layer 5 - analysis)
//   Step 5: Write tables and the report      (Layer 6 - infra)
//
// Progress lines go to logs/P1/p2_traj_cleaning/p2_traj_cleaning.log.

use anyhow::Result;

use crate::analysis::intervals::{interval_table, mean_of_vessel_means, IntervalRow};
use crate::analysis::report::format_cleaning_report;
use crate::analysis::row_changes::{row_change_table, RowChange};
use crate::analysis::text_table::{fixed, thousands};
use crate::application::inspect_use_case::load_raw;
use crate::application::scripts::{self, Script};
use crate::data::cleaner::{percent, Cleaner, StepRecord};
use crate::data::feather::FeatherStore;
use crate::data::loader::write_records_csv;
use crate::infra::{
    config::ProjectConfig,
    step_log::StepLog,
    table_writer::{write_table, write_text},
};

/// Row counts of one cleaning run
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSummary {
    pub input_rows:   usize,
    pub cleaned_rows: usize,
    pub steps:        Vec<StepRecord>,
}

impl CleanSummary {
    pub fn removed_rows(&self) -> usize {
        self.input_rows - self.cleaned_rows
    }
}

pub struct CleanUseCase {
    config: ProjectConfig,
}

impl CleanUseCase {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CleanSummary> {
        let cfg     = &self.config;
        // Reject unknown step names before loading anything
        let cleaner = Cleaner::from_config(&cfg.cleaning)?;
        let layout  = scripts::prepare(Script::Cleaning, &cfg.root)?;
        let mut log = StepLog::create(layout.log_file())?;

        // ── Step 1: Raw feed ──────────────────────────────────────────────────
        let raw = load_raw(cfg)?;
        log.line(format!("Input rows: {}", thousands(raw.len())))?;

        // ── Step 2: Cleaning chain ────────────────────────────────────────────
        tracing::info!("Cleaning steps: {}", cleaner.step_names().join(" -> "));
        let (cleaned, steps) = cleaner.run(raw.clone());

        // ── Step 3: Cleaned table ─────────────────────────────────────────────
        let feather_path = layout.output_file("cleaned_traj.feather");
        let csv_path     = layout.output_file("cleaned_traj.csv");
        FeatherStore::new(&feather_path).save(&cleaned)?;
        write_records_csv(&csv_path, &cleaned)?;

        // ── Step 4: Tables ────────────────────────────────────────────────────
        let row_changes       = row_change_table(&raw, &cleaned);
        let raw_intervals     = interval_table(&raw);
        let cleaned_intervals = interval_table(&cleaned);

        // ── Step 5: Write tables and report ───────────────────────────────────
        let step_path           = layout.output_file("step_volume_changes.csv");
        let row_change_path     = layout.output_file("mmsi_row_changes.csv");
        let raw_interval_path   = layout.output_file("mmsi_intervals_raw.csv");
        let clean_interval_path = layout.output_file("mmsi_intervals_cleaned.csv");
        let report_path         = layout.output_file("cleaning_report.txt");

        write_table(&step_path, &StepRecord::HEADER, &steps)?;
        write_table(&row_change_path, &RowChange::HEADER, &row_changes)?;
        write_table(&raw_interval_path, &IntervalRow::HEADER, &raw_intervals)?;
        write_table(&clean_interval_path, &IntervalRow::HEADER, &cleaned_intervals)?;
        write_text(
            &report_path,
            &format_cleaning_report(&steps, &row_changes, &raw_intervals, &cleaned_intervals),
        )?;

        let summary = CleanSummary { input_rows: raw.len(), cleaned_rows: cleaned.len(), steps };
        let removed = summary.removed_rows();

        log.line(format!("Cleaned rows: {}", thousands(summary.cleaned_rows)))?;
        log.line(format!("Removed rows: {}", thousands(removed)))?;
        log.line(format!("Removed ratio: {:.2}%", percent(removed, summary.input_rows)))?;
        log.line(format!(
            "Per-MMSI avg interval (seconds, cleaned): {}",
            fixed(mean_of_vessel_means(&cleaned_intervals), 3)
        ))?;
        log.line(format!("Saved feather: {}", feather_path.display()))?;
        log.line(format!("Saved csv: {}", csv_path.display()))?;
        log.line(format!("Saved report: {}", report_path.display()))?;
        log.line(format!("Saved step table: {}", step_path.display()))?;
        log.line(format!("Saved mmsi row-change table: {}", row_change_path.display()))?;
        log.line(format!("Saved mmsi interval table(raw): {}", raw_interval_path.display()))?;
        log.line(format!("Saved mmsi interval table(cleaned): {}", clean_interval_path.display()))?;
        log.flush()?;

        Ok(summary)
    }
}
