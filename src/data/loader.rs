// ============================================================
// Layer 4 — CSV Record Loader
// ============================================================
// Loads AIS records from CSV files using the csv crate.
//
// Two flavours of CSV exist in a project:
//
//   raw feed      → no header row; column order comes from the
//                   project config (raw_columns)
//   derived table → header row written by the cleaning step;
//                   columns are matched by name
//
// Field values are parsed leniently: a value that cannot be read
// becomes "missing" rather than failing the whole file. Only a
// structurally broken file (I/O error, invalid UTF-8) is an error.
//
// Reference: csv crate documentation (ReaderBuilder, StringRecord)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::feather::FeatherStore;
use crate::domain::record::{AisRecord, Column};
use crate::domain::traits::RecordSource;

/// Whether the file carries its own header row
#[derive(Debug, Clone)]
pub enum CsvHeader {
    /// Headerless; the given names describe the columns in order
    Columns(Vec<String>),
    /// First row names the columns
    FromFile,
}

pub struct CsvRecordSource {
    path:   PathBuf,
    header: CsvHeader,
}

impl CsvRecordSource {
    /// A headerless raw feed with the configured column order
    pub fn raw(path: impl Into<PathBuf>, columns: &[String]) -> Self {
        Self { path: path.into(), header: CsvHeader::Columns(columns.to_vec()) }
    }

    /// A table written with a header row
    pub fn with_header(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), header: CsvHeader::FromFile }
    }
}

impl RecordSource for CsvRecordSource {
    fn load_all(&self) -> Result<Vec<AisRecord>> {
        let has_headers = matches!(self.header, CsvHeader::FromFile);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open CSV '{}'", self.path.display()))?;

        // Map each file position to a known column (None = ignored field)
        let names: Vec<String> = match &self.header {
            CsvHeader::Columns(cols) => cols.clone(),
            CsvHeader::FromFile => reader
                .headers()
                .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
                .iter()
                .map(str::to_string)
                .collect(),
        };
        let positions: Vec<Option<Column>> = names.iter().map(|n| Column::from_name(n)).collect();

        let ignored: Vec<&String> = names
            .iter()
            .zip(&positions)
            .filter(|(_, c)| c.is_none())
            .map(|(n, _)| n)
            .collect();
        if !ignored.is_empty() {
            tracing::debug!("Ignoring unknown columns {:?} in '{}'", ignored, self.path.display());
        }

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.with_context(|| {
                format!("Malformed CSV row {} in '{}'", line + 1, self.path.display())
            })?;

            let mut record = AisRecord::default();
            for (field, column) in row.iter().zip(&positions) {
                if let Some(column) = column {
                    record.set_from_str(*column, field);
                }
            }
            records.push(record);
        }

        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Write records as a CSV table with a header row.
/// Missing values become empty fields; timestamps are RFC 3339.
pub fn write_records_csv(path: &Path, records: &[AisRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create CSV '{}'", path.display()))?;

    if records.is_empty() {
        let header: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        writer.write_record(&header)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} records to '{}'", records.len(), path.display());
    Ok(())
}

/// Load the cleaned table: Feather first, then the CSV copy
pub fn load_cleaned(feather: &Path, csv: &Path) -> Result<Vec<AisRecord>> {
    let store = FeatherStore::new(feather);
    if store.exists() {
        return store.load_all();
    }
    if csv.exists() {
        tracing::warn!("'{}' not found, falling back to '{}'", feather.display(), csv.display());
        return CsvRecordSource::with_header(csv).load_all();
    }
    anyhow::bail!("Cleaned data not found. Please run the cleaning step first.")
}
