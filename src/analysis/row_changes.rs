// ============================================================
// Layer 5 — Per-Vessel Row Changes
// ============================================================
// Compares row counts per MMSI before and after cleaning, so the
// vessels hit hardest by cleaning are easy to find.
//
// Every MMSI present in either table gets a row. Vessels that
// vanished entirely have cleaned_rows = 0. Rows without an MMSI
// cannot be attributed and are not counted.
//
// Ordering: most rows removed first, ties by larger raw count.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::record::AisRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub mmsi:              i64,
    pub raw_rows:          i64,
    pub cleaned_rows:      i64,
    pub rows_removed:      i64,
    pub removed_ratio_pct: f64,
}

impl RowChange {
    pub const HEADER: [&'static str; 5] =
        ["mmsi", "raw_rows", "cleaned_rows", "rows_removed", "removed_ratio_pct"];
}

pub fn row_change_table(raw: &[AisRecord], cleaned: &[AisRecord]) -> Vec<RowChange> {
    let mut counts: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    for mmsi in raw.iter().filter_map(|r| r.mmsi) {
        counts.entry(mmsi).or_default().0 += 1;
    }
    for mmsi in cleaned.iter().filter_map(|r| r.mmsi) {
        counts.entry(mmsi).or_default().1 += 1;
    }

    let mut rows: Vec<RowChange> = counts
        .into_iter()
        .map(|(mmsi, (raw_rows, cleaned_rows))| {
            let rows_removed = raw_rows - cleaned_rows;
            RowChange {
                mmsi,
                raw_rows,
                cleaned_rows,
                rows_removed,
                removed_ratio_pct: if raw_rows == 0 {
                    0.0
                } else {
                    rows_removed as f64 / raw_rows as f64 * 100.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.rows_removed
            .cmp(&a.rows_removed)
            .then(b.raw_rows.cmp(&a.raw_rows))
    });
    rows
}

/// Vessel counts used in the impact summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactSummary {
    pub total:           usize,
    pub fully_removed:   usize,
    pub at_least_50_pct: usize,
    pub at_least_80_pct: usize,
}

impl ImpactSummary {
    pub fn of(rows: &[RowChange]) -> Self {
        Self {
            total:           rows.len(),
            fully_removed:   rows.iter().filter(|r| r.cleaned_rows == 0).count(),
            at_least_50_pct: rows.iter().filter(|r| r.removed_ratio_pct >= 50.0).count(),
            at_least_80_pct: rows.iter().filter(|r| r.removed_ratio_pct >= 80.0).count(),
        }
    }
}
