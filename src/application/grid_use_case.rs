// ============================================================
// Layer 2 — GridCompareUseCase (script p4)
// ============================================================
// Compares where the fixes were before and after cleaning:
//
//   Step 1: Load raw feed and cleaned table
//   Step 2: Pick a map window from both      (dynamic_extent)
//   Step 3: Count fixes per grid cell         (points_to_grids)
//   Step 4: Save both grids as GeoJSON
//   Step 5: Render the before/after figure    (PNG + SVG)
//   Step 6: Write the run log

use anyhow::Result;
use std::path::PathBuf;

use crate::analysis::text_table::thousands;
use crate::application::inspect_use_case::{load_cleaned_output, load_raw};
use crate::application::scripts::{self, Script};
use crate::data::{extent::dynamic_extent, grid::points_to_grids};
use crate::infra::{
    config::ProjectConfig,
    figure::DensityFigure,
    geojson::write_grid_geojson,
    step_log::StepLog,
};

/// Colour scale percentiles for the density figure
const VMIN_PERCENTILE: f64 = 0.0;
const VMAX_PERCENTILE: f64 = 85.0;

#[derive(Debug, Clone)]
pub struct GridCompareOutput {
    pub figure_png:         PathBuf,
    pub figure_svg:         PathBuf,
    pub raw_grid:           PathBuf,
    pub cleaned_grid:       PathBuf,
    pub raw_cell_count:     usize,
    pub cleaned_cell_count: usize,
}

pub struct GridCompareUseCase {
    config: ProjectConfig,
}

impl GridCompareUseCase {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<GridCompareOutput> {
        let cfg    = &self.config;
        let layout = scripts::prepare(Script::GridCompare, &cfg.root)?;

        // ── Step 1: Both tables ───────────────────────────────────────────────
        let raw     = load_raw(cfg)?;
        let cleaned = load_cleaned_output(cfg)?;

        // ── Step 2: Map window ────────────────────────────────────────────────
        let extent = dynamic_extent(&raw, &cleaned, &cfg.extent)?;

        // ── Step 3: Grid counts ───────────────────────────────────────────────
        let res           = cfg.grid_resolution_m;
        let raw_cells     = points_to_grids(&raw, extent, res)?;
        let cleaned_cells = points_to_grids(&cleaned, extent, res)?;
        tracing::info!(
            "Active cells at {} m: raw {}, cleaned {}",
            res,
            raw_cells.len(),
            cleaned_cells.len()
        );

        // ── Step 4: GeoJSON ───────────────────────────────────────────────────
        let raw_grid_path     = layout.output_file(&format!("raw_grids_res{res}.geojson"));
        let cleaned_grid_path = layout.output_file(&format!("cleaned_grids_res{res}.geojson"));
        write_grid_geojson(&raw_grid_path, &raw_cells)?;
        write_grid_geojson(&cleaned_grid_path, &cleaned_cells)?;

        // ── Step 5: Figure ────────────────────────────────────────────────────
        let figure = DensityFigure {
            raw:      &raw_cells,
            cleaned:  &cleaned_cells,
            extent,
            vmin_pct: VMIN_PERCENTILE,
            vmax_pct: VMAX_PERCENTILE,
        };
        let (png_path, svg_path) = layout.figure_pair(&format!("grid_before_after_res{res}"), false);
        figure.save_pair(&png_path, &svg_path)?;

        // ── Step 6: Log ───────────────────────────────────────────────────────
        let mut log = StepLog::create(layout.log_file())?;
        log.line("Completed before/after grid visualization.")?;
        log.line(format!("Figure: {}", png_path.display()))?;
        log.line(format!("Figure (vector): {}", svg_path.display()))?;
        log.line(format!("Raw grid GeoJSON: {}", raw_grid_path.display()))?;
        log.line(format!("Cleaned grid GeoJSON: {}", cleaned_grid_path.display()))?;
        log.line(format!(
            "Boundary (lon_min, lon_max, lat_min, lat_max): {:?}",
            extent.as_tuple()
        ))?;
        log.line(format!("Grid resolution (meters): {res}"))?;
        log.line(format!("Raw rows: {}", thousands(raw.len())))?;
        log.line(format!("Cleaned rows: {}", thousands(cleaned.len())))?;
        log.line(format!("Raw active grid cells: {}", thousands(raw_cells.len())))?;
        log.line(format!("Cleaned active grid cells: {}", thousands(cleaned_cells.len())))?;
        log.flush()?;

        Ok(GridCompareOutput {
            figure_png:         png_path,
            figure_svg:         svg_path,
            raw_grid:           raw_grid_path,
            cleaned_grid:       cleaned_grid_path,
            raw_cell_count:     raw_cells.len(),
            cleaned_cell_count: cleaned_cells.len(),
        })
    }
}
