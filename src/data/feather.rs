// ============================================================
// Layer 4 — Feather Store
// ============================================================
// Intermediate tables are exchanged as Feather files, which are
// Arrow IPC files on disk. Writing uses a fixed schema:
//
//   id, mmsi, navigationStatus → Int64
//   lon, lat, sog, cog, ...    → Float64
//   timeUtc                    → Timestamp(us, "UTC")
//
// Reading is tolerant of files produced elsewhere: numeric
// columns of any width are cast to the target type and
// timestamps in any unit are converted to microseconds, so
// fractional seconds survive the same way they do in the CSV copy.
// Columns the file does not have are left missing.
//
// Reference: arrow crate (ipc::writer::FileWriter, compute::cast)

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::{
    fs::File,
    path::PathBuf,
    sync::Arc,
};

use crate::domain::record::{AisRecord, Column, ColumnKind};
use crate::domain::traits::RecordSource;

pub struct FeatherStore {
    path: PathBuf,
}

impl FeatherStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write all records as a single record batch
    pub fn save(&self, records: &[AisRecord]) -> Result<()> {
        let schema = Arc::new(ais_schema());

        let columns: Vec<ArrayRef> = Column::ALL
            .iter()
            .map(|c| column_array(*c, records))
            .collect();
        let batch = RecordBatch::try_new(schema.clone(), columns)
            .context("Cannot assemble Arrow record batch")?;

        let file = File::create(&self.path)
            .with_context(|| format!("Cannot create '{}'", self.path.display()))?;
        let mut writer = FileWriter::try_new(file, &schema)?;
        writer.write(&batch)?;
        writer.finish()?;

        tracing::debug!("Wrote {} records to '{}'", records.len(), self.path.display());
        Ok(())
    }
}

impl RecordSource for FeatherStore {
    fn load_all(&self) -> Result<Vec<AisRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;
        let reader = FileReader::try_new(file, None)
            .with_context(|| format!("'{}' is not a Feather/Arrow IPC file", self.path.display()))?;

        let mut records = Vec::new();
        for batch in reader {
            let batch = batch.with_context(|| format!("Corrupt batch in '{}'", self.path.display()))?;
            append_batch(&batch, &mut records)?;
        }

        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("feather:{}", self.path.display())
    }
}

fn ais_schema() -> Schema {
    let fields: Vec<Field> = Column::ALL
        .iter()
        .map(|c| Field::new(c.name(), arrow_type(c.kind()), true))
        .collect();
    Schema::new(fields)
}

fn arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Int       => DataType::Int64,
        ColumnKind::Float     => DataType::Float64,
        ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
    }
}

fn column_array(column: Column, records: &[AisRecord]) -> ArrayRef {
    match column.kind() {
        ColumnKind::Timestamp => {
            let values: Vec<Option<i64>> = records
                .iter()
                .map(|r| r.time_utc.map(|t| t.timestamp_micros()))
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone("UTC"))
        }
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = records
                .iter()
                .map(|r| r.numeric(column).map(|v| v as i64))
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.numeric(column)).collect();
            Arc::new(Float64Array::from(values))
        }
    }
}

/// Convert one batch into records, appending to `out`
fn append_batch(batch: &RecordBatch, out: &mut Vec<AisRecord>) -> Result<()> {
    let start = out.len();
    out.resize(start + batch.num_rows(), AisRecord::default());
    let rows = &mut out[start..];

    for column in Column::ALL {
        let Some(array) = batch.column_by_name(column.name()) else {
            continue;
        };
        match column.kind() {
            ColumnKind::Timestamp => {
                for (row, ts) in rows.iter_mut().zip(timestamps_us(array)?) {
                    row.time_utc = ts;
                }
            }
            ColumnKind::Int => {
                let typed = cast(array, &DataType::Int64)?;
                let ints  = downcast::<Int64Array>(&typed, column)?;
                for (i, row) in rows.iter_mut().enumerate() {
                    if ints.is_valid(i) {
                        set_int(row, column, ints.value(i));
                    }
                }
            }
            ColumnKind::Float => {
                let typed  = cast(array, &DataType::Float64)?;
                let floats = downcast::<Float64Array>(&typed, column)?;
                for (i, row) in rows.iter_mut().enumerate() {
                    if floats.is_valid(i) {
                        set_float(row, column, floats.value(i));
                    }
                }
            }
        }
    }
    Ok(())
}

fn set_int(row: &mut AisRecord, column: Column, value: i64) {
    match column {
        Column::Id               => row.id = Some(value),
        Column::Mmsi             => row.mmsi = Some(value),
        Column::NavigationStatus => row.navigation_status = Some(value),
        _ => {}
    }
}

fn set_float(row: &mut AisRecord, column: Column, value: f64) {
    let value = Some(value).filter(|v| !v.is_nan());
    match column {
        Column::Lon         => row.lon = value,
        Column::Lat         => row.lat = value,
        Column::Sog         => row.sog = value,
        Column::Cog         => row.cog = value,
        Column::TrueHeading => row.true_heading = value,
        Column::Rot         => row.rot = value,
        _ => {}
    }
}

/// Timestamps of any unit / zone, as UTC microseconds
fn timestamps_us(array: &ArrayRef) -> Result<Vec<Option<DateTime<Utc>>>> {
    let typed = cast(array, &DataType::Timestamp(TimeUnit::Microsecond, None))?;
    let us = typed
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .context("timeUtc column could not be read as timestamps")?;

    Ok((0..us.len())
        .map(|i| {
            if us.is_valid(i) {
                DateTime::from_timestamp_micros(us.value(i))
            } else {
                None
            }
        })
        .collect())
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, column: Column) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("Unexpected Arrow type for column '{}'", column.name()))
}
