// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any one script:
//
//   config.rs       — ProjectConfig as JSON, with defaults for
//                     every field and CLI overrides on top.
//
//   step_log.rs     — Per-script log files. Replaces printing
//                     to a redirected stdout.
//
//   table_writer.rs — CSV tables and text reports.
//
//   geojson.rs      — Grid cells as GeoJSON FeatureCollections.
//
//   figure.rs       — Before/after grid density figure, SVG
//                     plus a 300 dpi PNG rasterised from it.
//
//   workers.rs      — rayon pool running one job per input
//                     file, each with its own log.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Project configuration (JSON)
pub mod config;

/// Per-step log files
pub mod step_log;

/// CSV table and text report writers
pub mod table_writer;

/// GeoJSON output for grid cells
pub mod geojson;

/// Density figure (SVG + PNG)
pub mod figure;

/// Parallel per-file processing
pub mod workers;
