// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything that touches AIS tables as data: reading them,
// writing them, cleaning them and binning them onto a grid.
//
// The p1..p4 scripts use it in this order:
//
//   raw CSV (headerless)
//       │
//       ▼
//   CsvRecordSource   → lenient parse into AisRecord rows
//       │
//       ▼
//   Cleaner           → basic → tbd_drift → speed_anomalies
//       │
//       ▼
//   FeatherStore      → cleaned table as an Arrow IPC file
//       │
//       ▼
//   dynamic_extent    → map window from both tables
//       │
//       ▼
//   points_to_grids   → per-cell point counts
//
// Reference: csv crate, arrow crate (ipc)
//            Rust Book §13 (Iterators and Closures)

/// Raw and derived CSV tables
pub mod loader;

/// Arrow IPC (Feather) read/write
pub mod feather;

/// Haversine distance and degree/metre conversions
pub mod geo;

/// Cleaning step chain and built-in steps
pub mod cleaner;

/// Quantile-based plotting extent
pub mod extent;

/// Fixed-resolution grid counting
pub mod grid;
