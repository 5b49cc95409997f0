// ============================================================
// Layer 4 — Geodesy Helpers
// ============================================================
// Small set of distance conversions shared by cleaning and
// gridding. Accuracy at the metre level is plenty for AIS fixes.

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Metres per degree of latitude (roughly constant)
pub const METERS_PER_DEG_LAT: f64 = 110_540.0;

/// Metres per degree of longitude at the equator
pub const METERS_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

pub const KNOTS_PER_MPS: f64 = 1.943_844;

/// Great-circle distance between two (lon, lat) points in metres
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Metres per degree of longitude at a given latitude
pub fn meters_per_deg_lon(lat: f64) -> f64 {
    METERS_PER_DEG_LON_EQUATOR * lat.to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_m((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_m((10.0, 59.0), (10.0, 59.0)), 0.0);
    }

    #[test]
    fn test_lon_scale_shrinks_with_latitude() {
        assert!(meters_per_deg_lon(60.0) < meters_per_deg_lon(0.0) / 1.9);
    }
}
