// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the pipeline:
//   - RecordSource  → anything that yields AIS records
//                     (raw CSV, cleaned CSV, Feather)
//   - CleaningStep  → one named filter in the cleaning chain
//
// Use cases only see these traits, so a new input format or a
// project-specific cleaning rule plugs in without touching them.

use anyhow::Result;

use crate::domain::record::AisRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can load a table of AIS records.
pub trait RecordSource {
    /// Load every record from this source
    fn load_all(&self) -> Result<Vec<AisRecord>>;

    /// Human readable description used in logs
    fn describe(&self) -> String;
}

// ─── CleaningStep ─────────────────────────────────────────────────────────────
/// One named step of trajectory cleaning.
///
/// A step consumes the current table and returns the rows it keeps.
/// Steps must never invent rows: the output is a subset of the input.
pub trait CleaningStep: Send + Sync {
    /// The name used in configs and in the step table
    fn name(&self) -> &'static str;

    fn apply(&self, records: Vec<AisRecord>) -> Vec<AisRecord>;
}
