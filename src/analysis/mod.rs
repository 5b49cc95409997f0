// ============================================================
// Layer 5 — Analysis
// ============================================================
// Turns tables of AIS records into statistics and reports.
// Nothing in this layer reads or writes files; use cases hand
// the results to the infra layer for writing.
//
//   describe.rs     → count / mean / std / percentiles of a column
//   intervals.rs    → per-vessel reporting interval table
//   row_changes.rs  → per-vessel rows before vs. after cleaning
//   text_table.rs   → fixed-width text tables for reports
//   report.rs       → inspection summary and cleaning report

pub mod describe;

pub mod intervals;

pub mod row_changes;

pub mod text_table;

pub mod report;
