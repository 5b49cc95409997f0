// ============================================================
// Layer 6 — Table and Report Writers
// ============================================================
// Writes analysis results to the step's output directory:
//
//   write_table  → any serde-serialisable row type as CSV with a
//                  header row (the header is written even when the
//                  table is empty, so downstream readers never
//                  trip over a zero-byte file)
//   write_text   → UTF-8 text reports
//
// Example CSV output (P1_p2_step_volume_changes.csv):
//   step,rows_before,rows_after,rows_removed,removed_pct_of_previous,removed_pct_of_initial
//   raw_input,1000,1000,0,0.0,0.0
//   basic,1000,964,36,3.6,3.6
//
// Reference: csv crate (Writer::serialize), serde derive

use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};

/// Write rows as CSV. `header` is used only when `rows` is empty.
pub fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create table '{}'", path.display()))?;

    if rows.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Cannot write row to '{}'", path.display()))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} rows to '{}'", rows.len(), path.display());
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote report '{}'", path.display());
    Ok(())
}
