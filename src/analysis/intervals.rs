// ============================================================
// Layer 5 — Per-Vessel Reporting Intervals
// ============================================================
// How often does each vessel report? For every MMSI:
//
//   1. take rows with both mmsi and timeUtc
//   2. sort by (mmsi, timeUtc)
//   3. diff consecutive timestamps within the vessel (seconds)
//   4. keep strictly positive gaps only (duplicates give 0)
//   5. aggregate: count, mean, median, 90th percentile, 1/mean
//
// Vessels with no positive gap do not appear in the table.
// The table is ordered by mean interval, fastest reporters first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::describe::{mean, quantile_sorted};
use crate::domain::record::AisRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRow {
    pub mmsi:                    i64,
    pub interval_count:          usize,
    pub avg_interval_seconds:    f64,
    pub median_interval_seconds: f64,
    pub p90_interval_seconds:    f64,
    pub avg_frequency_hz:        f64,
}

impl IntervalRow {
    /// CSV header, used when the table is empty
    pub const HEADER: [&'static str; 6] = [
        "mmsi",
        "interval_count",
        "avg_interval_seconds",
        "median_interval_seconds",
        "p90_interval_seconds",
        "avg_frequency_hz",
    ];
}

/// Build the interval table for a set of records
pub fn interval_table(records: &[AisRecord]) -> Vec<IntervalRow> {
    let mut tracks: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for r in records {
        if let (Some(mmsi), Some(ts)) = (r.mmsi, r.time_utc) {
            tracks.entry(mmsi).or_default().push(ts.timestamp_millis());
        }
    }

    let mut rows: Vec<IntervalRow> = tracks
        .into_iter()
        .filter_map(|(mmsi, mut times)| {
            times.sort_unstable();
            let mut gaps: Vec<f64> = times
                .windows(2)
                .map(|w| (w[1] - w[0]) as f64 / 1000.0)
                .filter(|&g| g > 0.0)
                .collect();
            if gaps.is_empty() {
                return None;
            }
            gaps.sort_by(f64::total_cmp);

            let avg = mean(&gaps);
            Some(IntervalRow {
                mmsi,
                interval_count:          gaps.len(),
                avg_interval_seconds:    avg,
                median_interval_seconds: quantile_sorted(&gaps, 0.5),
                p90_interval_seconds:    quantile_sorted(&gaps, 0.9),
                avg_frequency_hz:        1.0 / avg,
            })
        })
        .collect();

    // stable: ties keep mmsi order
    rows.sort_by(|a, b| a.avg_interval_seconds.total_cmp(&b.avg_interval_seconds));
    rows
}

/// Mean of the per-vessel mean intervals, NaN for an empty table
pub fn mean_of_vessel_means(rows: &[IntervalRow]) -> f64 {
    let means: Vec<f64> = rows.iter().map(|r| r.avg_interval_seconds).collect();
    mean(&means)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Column;

    fn at(mmsi: i64, ts: &str) -> AisRecord {
        let mut r = AisRecord::default();
        r.mmsi = Some(mmsi);
        r.set_from_str(Column::TimeUtc, ts);
        r
    }

    #[test]
    fn test_intervals_per_vessel() {
        let records = vec![
            at(1, "2024-01-01 00:00:20"),
            at(1, "2024-01-01 00:00:00"),
            at(1, "2024-01-01 00:00:10"),
            at(1, "2024-01-01 00:00:10"), // zero gap, ignored
            at(2, "2024-01-01 00:00:00"),
            at(2, "2024-01-01 00:00:04"),
            at(3, "2024-01-01 00:00:00"), // single fix, no interval
        ];
        let table = interval_table(&records);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].mmsi, 2);
        assert_eq!(table[0].avg_interval_seconds, 4.0);
        assert_eq!(table[0].avg_frequency_hz, 0.25);
        assert_eq!(table[1].mmsi, 1);
        assert_eq!(table[1].interval_count, 2);
        assert_eq!(table[1].median_interval_seconds, 10.0);
        assert_eq!(mean_of_vessel_means(&table), 7.0);
    }

    #[test]
    fn test_missing_keys_and_empty() {
        let mut no_time = at(1, "2024-01-01 00:00:00");
        no_time.time_utc = None;
        assert!(interval_table(&[no_time]).is_empty());
        assert!(mean_of_vessel_means(&[]).is_nan());
    }
}
