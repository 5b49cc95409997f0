// ============================================================
// Layer 4 — Dynamic Map Extent
// ============================================================
// Chooses the map window for before/after plots from the data
// itself, ignoring stray fixes far away from the study area:
//
//   1. pool lon and lat of both tables (missing values dropped)
//   2. take the [q_low, q_high] quantiles of each axis
//   3. floor each span at 1e-6 degrees so a single point still
//      gives a non-empty window
//   4. pad both sides by span × pad_ratio

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analysis::describe::quantile;
use crate::domain::record::AisRecord;
use crate::infra::config::ExtentConfig;

const MIN_SPAN_DEG: f64 = 1e-6;

/// (lon_min, lon_max, lat_min, lat_max) in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Extent {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&lon) && (self.lat_min..=self.lat_max).contains(&lat)
    }

    pub fn mid_lat(&self) -> f64 {
        (self.lat_min + self.lat_max) / 2.0
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.lon_min, self.lon_max, self.lat_min, self.lat_max)
    }
}

pub fn dynamic_extent(raw: &[AisRecord], cleaned: &[AisRecord], cfg: &ExtentConfig) -> Result<Extent> {
    let lons: Vec<f64> = raw.iter().chain(cleaned).filter_map(|r| r.lon).collect();
    let lats: Vec<f64> = raw.iter().chain(cleaned).filter_map(|r| r.lat).collect();

    if lons.is_empty() || lats.is_empty() {
        anyhow::bail!("Cannot determine dynamic extent: missing lon/lat values.");
    }

    let (lon_lo, lon_hi) = (quantile(&lons, cfg.q_low), quantile(&lons, cfg.q_high));
    let (lat_lo, lat_hi) = (quantile(&lats, cfg.q_low), quantile(&lats, cfg.q_high));

    let lon_pad = (lon_hi - lon_lo).max(MIN_SPAN_DEG) * cfg.pad_ratio;
    let lat_pad = (lat_hi - lat_lo).max(MIN_SPAN_DEG) * cfg.pad_ratio;

    let extent = Extent {
        lon_min: lon_lo - lon_pad,
        lon_max: lon_hi + lon_pad,
        lat_min: lat_lo - lat_pad,
        lat_max: lat_hi + lat_pad,
    };
    tracing::debug!("Dynamic extent: {:?}", extent.as_tuple());
    Ok(extent)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn at(lon: f64, lat: f64) -> AisRecord {
        AisRecord { lon: Some(lon), lat: Some(lat), ..Default::default() }
    }

    #[test]
    fn test_pads_quantile_window() {
        let cfg = ExtentConfig { q_low: 0.0, q_high: 1.0, pad_ratio: 0.1 };
        let e = dynamic_extent(&[at(10.0, 50.0)], &[at(20.0, 60.0)], &cfg).unwrap();
        assert!((e.lon_min - 9.0).abs() < 1e-12);
        assert!((e.lon_max - 21.0).abs() < 1e-12);
        assert!((e.lat_min - 49.0).abs() < 1e-12);
        assert!((e.lat_max - 61.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_gets_minimum_span() {
        let e = dynamic_extent(&[at(5.0, 5.0)], &[], &ExtentConfig::default()).unwrap();
        assert!(e.lon_max > e.lon_min);
        assert!(e.contains(5.0, 5.0));
    }

    #[test]
    fn test_no_coordinates_is_an_error() {
        let err = dynamic_extent(&[AisRecord::default()], &[], &ExtentConfig::default());
        assert!(err.is_err());
    }
}
