// ============================================================
// Layer 4 — Point-to-Grid Counting
// ============================================================
// Bins AIS fixes into square cells of a fixed size in metres
// and counts the fixes per cell.
//
// Projection: local equirectangular, anchored at the extent's
// south-west corner (lon_min, lat_min):
//
//   x = (lon - lon_min) × 111 320 × cos(mid_lat)   metres
//   y = (lat - lat_min) × 110 540                  metres
//
// col = floor(x / resolution), row = floor(y / resolution)
// grid_id = row × n_cols + col
//
// Fixes outside the extent are ignored, and only cells holding
// at least one fix are returned (sorted by grid_id).
//
// A resolution so small that n_rows × n_cols overflows u64 is
// rejected up front, so grid ids are always unique.

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::data::extent::Extent;
use crate::data::geo::{meters_per_deg_lon, METERS_PER_DEG_LAT};
use crate::domain::record::AisRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub grid_id:     u64,
    pub row:         u64,
    pub col:         u64,
    pub point_count: u64,
    /// Closed ring of (lon, lat) corners, counter-clockwise
    pub ring:        [(f64, f64); 5],
}

/// Cell geometry for one extent and resolution
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    extent:       Extent,
    resolution_m: f64,
    m_per_lon:    f64,
    n_cols:       u64,
    n_rows:       u64,
}

impl GridSpec {
    pub fn new(extent: Extent, resolution_m: f64) -> Result<Self> {
        if !resolution_m.is_finite() || resolution_m <= 0.0 {
            bail!("Grid resolution must be a positive number of metres, got {resolution_m}");
        }
        let m_per_lon = meters_per_deg_lon(extent.mid_lat());
        let width_m   = (extent.lon_max - extent.lon_min) * m_per_lon;
        let height_m  = (extent.lat_max - extent.lat_min) * METERS_PER_DEG_LAT;
        let n_cols    = cell_count(width_m, resolution_m)?;
        let n_rows    = cell_count(height_m, resolution_m)?;
        if n_rows.checked_mul(n_cols).is_none() {
            bail!(
                "Grid resolution {resolution_m} m is too fine for the extent: \
                 {n_rows} rows x {n_cols} columns overflows the grid id range"
            );
        }
        Ok(Self { extent, resolution_m, m_per_lon, n_cols, n_rows })
    }

    pub fn n_cols(&self) -> u64 {
        self.n_cols
    }

    pub fn n_rows(&self) -> u64 {
        self.n_rows
    }

    /// Unique id of a cell, row-major
    pub fn grid_id(&self, row: u64, col: u64) -> u64 {
        // bounded by n_rows * n_cols, checked in new()
        row * self.n_cols + col
    }

    /// (row, col) of a point, None outside the extent
    pub fn locate(&self, lon: f64, lat: f64) -> Option<(u64, u64)> {
        if !self.extent.contains(lon, lat) {
            return None;
        }
        let x   = (lon - self.extent.lon_min) * self.m_per_lon;
        let y   = (lat - self.extent.lat_min) * METERS_PER_DEG_LAT;
        // points on the far edge belong to the last cell
        let col = ((x / self.resolution_m).floor() as u64).min(self.n_cols - 1);
        let row = ((y / self.resolution_m).floor() as u64).min(self.n_rows - 1);
        Some((row, col))
    }

    pub fn ring(&self, row: u64, col: u64) -> [(f64, f64); 5] {
        let dlon = self.resolution_m / self.m_per_lon;
        let dlat = self.resolution_m / METERS_PER_DEG_LAT;
        let lon0 = self.extent.lon_min + col as f64 * dlon;
        let lat0 = self.extent.lat_min + row as f64 * dlat;
        [
            (lon0, lat0),
            (lon0 + dlon, lat0),
            (lon0 + dlon, lat0 + dlat),
            (lon0, lat0 + dlat),
            (lon0, lat0),
        ]
    }
}

/// Cells needed to cover `span_m`, at least one
fn cell_count(span_m: f64, resolution_m: f64) -> Result<u64> {
    let n = (span_m / resolution_m).ceil().max(1.0);
    // u64::MAX as f64 rounds up to 2^64, so >= catches every overflow
    if !n.is_finite() || n >= u64::MAX as f64 {
        bail!("Grid resolution {resolution_m} m is too fine for a {span_m:.1} m extent");
    }
    Ok(n as u64)
}

/// Count fixes per cell; only occupied cells are returned
pub fn points_to_grids(records: &[AisRecord], extent: Extent, resolution_m: f64) -> Result<Vec<GridCell>> {
    let spec = GridSpec::new(extent, resolution_m)?;
    tracing::debug!("Grid of {} rows x {} columns at {} m", spec.n_rows(), spec.n_cols(), resolution_m);

    let mut counts: BTreeMap<(u64, u64), u64> = BTreeMap::new();
    let mut outside = 0usize;
    for (lon, lat) in records.iter().filter_map(|r| r.position()) {
        match spec.locate(lon, lat) {
            Some(cell) => *counts.entry(cell).or_insert(0) += 1,
            None       => outside += 1,
        }
    }
    if outside > 0 {
        tracing::debug!("{} fixes fell outside the grid extent", outside);
    }

    Ok(counts
        .into_iter()
        .map(|((row, col), point_count)| GridCell {
            grid_id: spec.grid_id(row, col),
            row,
            col,
            point_count,
            ring: spec.ring(row, col),
        })
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn at(lon: f64, lat: f64) -> AisRecord {
        AisRecord { lon: Some(lon), lat: Some(lat), ..Default::default() }
    }

    fn extent() -> Extent {
        // ~1.1 km tall, ~1.1 km wide at the equator
        Extent { lon_min: 0.0, lon_max: 0.01, lat_min: 0.0, lat_max: 0.01 }
    }

    #[test]
    fn test_counts_points_per_cell() {
        let records = vec![at(0.00001, 0.00001), at(0.00002, 0.00002), at(0.005, 0.005)];
        let cells   = points_to_grids(&records, extent(), 100.0).unwrap();

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].row, 0);
        assert_eq!(cells[0].col, 0);
        assert_eq!(cells[0].point_count, 2);
        assert_eq!(cells[1].point_count, 1);
        let total: u64 = cells.iter().map(|c| c.point_count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_ignores_points_outside_and_missing() {
        let records = vec![at(1.0, 1.0), AisRecord::default(), at(0.01, 0.01)];
        let cells   = points_to_grids(&records, extent(), 100.0).unwrap();
        assert_eq!(cells.len(), 1);
        let spec = GridSpec::new(extent(), 100.0).unwrap();
        assert_eq!(cells[0].col, spec.n_cols() - 1);
        assert_eq!(cells[0].row, spec.n_rows() - 1);
    }

    #[test]
    fn test_ring_is_closed_and_sized() {
        let spec = GridSpec::new(extent(), 100.0).unwrap();
        let ring = spec.ring(2, 3);
        assert_eq!(ring[0], ring[4]);
        let height_deg = ring[2].1 - ring[0].1;
        assert!((height_deg * METERS_PER_DEG_LAT - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_too_fine_resolution_is_rejected() {
        let wide = Extent { lon_min: 0.0, lon_max: 1.0, lat_min: 0.0, lat_max: 1.0 };
        let err  = points_to_grids(&[at(0.999, 0.999)], wide, 1e-6).unwrap_err();
        assert!(err.to_string().contains("too fine"));
        assert!(GridSpec::new(wide, 0.0).is_err());
        assert!(GridSpec::new(wide, f64::NAN).is_err());
    }

    #[test]
    fn test_grid_ids_are_unique() {
        let records: Vec<AisRecord> = (0..10)
            .flat_map(|i| (0..10).map(move |j| at(i as f64 * 0.001, j as f64 * 0.001)))
            .collect();
        let cells = points_to_grids(&records, extent(), 100.0).unwrap();
        let mut ids: Vec<u64> = cells.iter().map(|c| c.grid_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), cells.len());
    }
}
