// ============================================================
// Layer 4 — Trajectory Cleaner
// ============================================================
// Runs a chain of named cleaning steps over the raw table and
// records how many rows each step removed.
//
// Built-in steps (applied in the configured order):
//
//   basic                      → drop rows without mmsi / time /
//                                position, impossible coordinates,
//                                negative speed, duplicate
//                                (mmsi, timeUtc) keeping the first
//   tbd_drift                  → per vessel, drop a fix that would
//                                need an implausible speed to reach
//                                from the last kept fix
//   bidirectional_speed_drift  → per vessel, drop a spike: a fix whose
//                                implied speed is too high both
//                                coming in and going out
//   speed_anomalies            → drop reported speeds above the limit
//                                (optionally a per-vessel z-score cut)
//
// The step chain is just a Vec<Box<dyn CleaningStep>>, so project
// specific rules slot in next to the built-ins.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::data::geo::{haversine_m, KNOTS_PER_MPS};
use crate::domain::record::AisRecord;
use crate::domain::traits::CleaningStep;
use crate::infra::config::CleaningConfig;

/// Names accepted in `cleaning.steps`
pub const BUILTIN_STEPS: [&str; 4] = [
    "basic",
    "tbd_drift",
    "bidirectional_speed_drift",
    "speed_anomalies",
];

/// Spread below this (knots) counts as constant speed; float noise is not a z-score
const MIN_SPEED_STD: f64 = 1e-9;

// ─── Step Record ──────────────────────────────────────────────────────────────
/// Row-count bookkeeping for one step, one row of the step table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step:                    String,
    pub rows_before:             usize,
    pub rows_after:              usize,
    pub rows_removed:            usize,
    pub removed_pct_of_previous: f64,
    pub removed_pct_of_initial:  f64,
}

impl StepRecord {
    pub const HEADER: [&'static str; 6] = [
        "step",
        "rows_before",
        "rows_after",
        "rows_removed",
        "removed_pct_of_previous",
        "removed_pct_of_initial",
    ];

    /// The leading "raw_input" row
    pub fn raw_input(rows: usize) -> Self {
        Self {
            step:                    "raw_input".to_string(),
            rows_before:             rows,
            rows_after:              rows,
            rows_removed:            0,
            removed_pct_of_previous: 0.0,
            removed_pct_of_initial:  0.0,
        }
    }

    pub fn new(step: &str, rows_before: usize, rows_after: usize, initial: usize) -> Self {
        let rows_removed = rows_before.saturating_sub(rows_after);
        Self {
            step: step.to_string(),
            rows_before,
            rows_after,
            rows_removed,
            removed_pct_of_previous: percent(rows_removed, rows_before),
            removed_pct_of_initial:  percent(rows_removed, initial),
        }
    }
}

/// part / whole × 100, or 0 when whole is 0
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// ─── Cleaner ──────────────────────────────────────────────────────────────────
pub struct Cleaner {
    steps: Vec<Box<dyn CleaningStep>>,
}

impl Cleaner {
    pub fn new(steps: Vec<Box<dyn CleaningStep>>) -> Self {
        Self { steps }
    }

    /// Build the configured chain of built-in steps.
    /// Unknown names are rejected up front, before any data is touched.
    pub fn from_config(cfg: &CleaningConfig) -> Result<Self> {
        let steps = cfg
            .steps
            .iter()
            .map(|name| builtin_step(name, cfg))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(steps))
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order.
    /// Returns the cleaned table sorted by (mmsi, timeUtc) and the step table.
    pub fn run(&self, records: Vec<AisRecord>) -> (Vec<AisRecord>, Vec<StepRecord>) {
        let initial     = records.len();
        let mut table   = vec![StepRecord::raw_input(initial)];
        let mut current = records;

        for step in &self.steps {
            let before = current.len();
            current    = step.apply(current);
            let record = StepRecord::new(step.name(), before, current.len(), initial);
            tracing::info!(
                "Step '{}': {} -> {} rows ({:.2}% removed)",
                record.step,
                record.rows_before,
                record.rows_after,
                record.removed_pct_of_previous,
            );
            table.push(record);
        }

        sort_by_vessel_time(&mut current);
        (current, table)
    }
}

fn builtin_step(name: &str, cfg: &CleaningConfig) -> Result<Box<dyn CleaningStep>> {
    let step: Box<dyn CleaningStep> = match name {
        "basic" => Box::new(BasicStep),
        "tbd_drift" => Box::new(DriftStep { max_knots: cfg.max_implied_speed_knots }),
        "bidirectional_speed_drift" => {
            Box::new(BidirectionalDriftStep { max_knots: cfg.max_implied_speed_knots })
        }
        "speed_anomalies" => Box::new(SpeedAnomalyStep {
            max_knots:   cfg.max_speed_knots,
            z_threshold: cfg.speed_z_threshold,
        }),
        other => anyhow::bail!(
            "Unknown cleaning step '{}'. Valid steps: {}",
            other,
            BUILTIN_STEPS.join(", ")
        ),
    };
    Ok(step)
}

/// Stable sort by (mmsi, timeUtc); missing values sort first
pub fn sort_by_vessel_time(records: &mut [AisRecord]) {
    records.sort_by(|a, b| (a.mmsi, a.time_utc).cmp(&(b.mmsi, b.time_utc)));
}

/// Split into per-vessel tracks sorted by time.
/// Rows without mmsi or time cannot be placed on a track and are returned apart.
fn split_tracks(records: Vec<AisRecord>) -> (BTreeMap<i64, Vec<AisRecord>>, Vec<AisRecord>) {
    let mut tracks: BTreeMap<i64, Vec<AisRecord>> = BTreeMap::new();
    let mut loose = Vec::new();
    for r in records {
        match (r.mmsi, r.time_utc) {
            (Some(mmsi), Some(_)) => tracks.entry(mmsi).or_default().push(r),
            _ => loose.push(r),
        }
    }
    for track in tracks.values_mut() {
        track.sort_by_key(|r| r.time_utc);
    }
    (tracks, loose)
}

/// Knots needed to travel from `a` to `b`; None if either lacks time or position
fn implied_knots(a: &AisRecord, b: &AisRecord) -> Option<f64> {
    let (ta, tb) = (a.time_utc?, b.time_utc?);
    let delta = tb - ta;
    let dt = match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None     => delta.num_milliseconds() as f64 / 1e3,
    };
    if dt <= 0.0 {
        return Some(f64::INFINITY);
    }
    let dist = haversine_m(a.position()?, b.position()?);
    Some(dist / dt * KNOTS_PER_MPS)
}

// ─── Built-in Steps ───────────────────────────────────────────────────────────
pub struct BasicStep;

impl CleaningStep for BasicStep {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn apply(&self, records: Vec<AisRecord>) -> Vec<AisRecord> {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| {
                let (Some(mmsi), Some(ts), Some((lon, lat))) = (r.mmsi, r.time_utc, r.position())
                else {
                    return false;
                };
                if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                    return false;
                }
                if r.sog.is_some_and(|s| s < 0.0) {
                    return false;
                }
                seen.insert((mmsi, ts))
            })
            .collect()
    }
}

/// Forward drift filter: compare each fix with the last one kept
pub struct DriftStep {
    pub max_knots: f64,
}

impl CleaningStep for DriftStep {
    fn name(&self) -> &'static str {
        "tbd_drift"
    }

    fn apply(&self, records: Vec<AisRecord>) -> Vec<AisRecord> {
        let (tracks, mut out) = split_tracks(records);
        for track in tracks.into_values() {
            let mut last_kept: Option<usize> = None;
            let mut keep = vec![false; track.len()];
            for (i, r) in track.iter().enumerate() {
                keep[i] = match last_kept {
                    None => true,
                    Some(j) => match implied_knots(&track[j], r) {
                        Some(knots) => knots <= self.max_knots,
                        // no position to judge by
                        None => true,
                    },
                };
                if keep[i] && r.position().is_some() {
                    last_kept = Some(i);
                }
            }
            out.extend(track.into_iter().zip(keep).filter(|(_, k)| *k).map(|(r, _)| r));
        }
        out
    }
}

/// Spike filter: drop a fix only when both neighbours disagree with it
pub struct BidirectionalDriftStep {
    pub max_knots: f64,
}

impl CleaningStep for BidirectionalDriftStep {
    fn name(&self) -> &'static str {
        "bidirectional_speed_drift"
    }

    fn apply(&self, records: Vec<AisRecord>) -> Vec<AisRecord> {
        let (tracks, mut out) = split_tracks(records);
        for track in tracks.into_values() {
            let n = track.len();
            let spikes: HashSet<usize> = (1..n.saturating_sub(1))
                .filter(|&i| {
                    let incoming = implied_knots(&track[i - 1], &track[i]);
                    let outgoing = implied_knots(&track[i], &track[i + 1]);
                    matches!((incoming, outgoing), (Some(a), Some(b)) if a > self.max_knots && b > self.max_knots)
                })
                .collect();
            out.extend(track.into_iter().enumerate().filter(|(i, _)| !spikes.contains(i)).map(|(_, r)| r));
        }
        out
    }
}

pub struct SpeedAnomalyStep {
    pub max_knots:   f64,
    pub z_threshold: Option<f64>,
}

impl CleaningStep for SpeedAnomalyStep {
    fn name(&self) -> &'static str {
        "speed_anomalies"
    }

    fn apply(&self, records: Vec<AisRecord>) -> Vec<AisRecord> {
        let records: Vec<AisRecord> = records
            .into_iter()
            .filter(|r| r.sog.map_or(true, |s| s <= self.max_knots))
            .collect();

        let Some(z_max) = self.z_threshold else {
            return records;
        };

        // Per-vessel mean and sample std of reported speed; vessels
        // with a single fix have no spread and are left alone
        let mut speeds: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for r in &records {
            if let (Some(mmsi), Some(s)) = (r.mmsi, r.sog) {
                speeds.entry(mmsi).or_default().push(s);
            }
        }
        let stats: BTreeMap<i64, (f64, f64)> = speeds
            .into_iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(mmsi, v)| {
                let n    = v.len() as f64;
                let mean = v.iter().sum::<f64>() / n;
                let var  = v.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
                (mmsi, (mean, var.sqrt()))
            })
            .collect();

        records
            .into_iter()
            .filter(|r| match (r.mmsi, r.sog) {
                (Some(mmsi), Some(s)) => match stats.get(&mmsi) {
                    Some(&(mean, std)) if std > MIN_SPEED_STD => ((s - mean) / std).abs() <= z_max,
                    _ => true,
                },
                _ => true,
            })
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Column;

    fn fix(mmsi: i64, ts: &str, lon: f64, lat: f64, sog: f64) -> AisRecord {
        let mut r = AisRecord::default();
        r.mmsi = Some(mmsi);
        r.set_from_str(Column::TimeUtc, ts);
        r.lon = Some(lon);
        r.lat = Some(lat);
        r.sog = Some(sog);
        r
    }

    #[test]
    fn test_basic_drops_incomplete_and_duplicates() {
        let mut missing_pos = fix(1, "2024-01-01 00:00:00", 10.0, 59.0, 5.0);
        missing_pos.lat = None;
        let records = vec![
            fix(1, "2024-01-01 00:00:00", 10.0, 59.0, 5.0),
            fix(1, "2024-01-01 00:00:00", 10.1, 59.0, 5.0), // duplicate key
            fix(2, "2024-01-01 00:00:00", 200.0, 59.0, 5.0), // bad lon
            fix(3, "2024-01-01 00:00:00", 10.0, 59.0, -1.0), // negative speed
            missing_pos,
        ];
        let out = BasicStep.apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lon, Some(10.0));
    }

    #[test]
    fn test_drift_drops_jump() {
        // 0.001 deg lat per 10 s is ~21 knots; 1 deg in 10 s is absurd
        let records = vec![
            fix(1, "2024-01-01 00:00:00", 10.0, 59.000, 10.0),
            fix(1, "2024-01-01 00:00:10", 10.0, 59.001, 10.0),
            fix(1, "2024-01-01 00:00:20", 10.0, 60.000, 10.0),
            fix(1, "2024-01-01 00:00:30", 10.0, 59.002, 10.0),
        ];
        let out = DriftStep { max_knots: 50.0 }.apply(records);
        let lats: Vec<f64> = out.iter().map(|r| r.lat.unwrap()).collect();
        assert_eq!(lats, vec![59.000, 59.001, 59.002]);
    }

    #[test]
    fn test_bidirectional_only_removes_spikes() {
        let records = vec![
            fix(1, "2024-01-01 00:00:00", 10.0, 59.000, 10.0),
            fix(1, "2024-01-01 00:00:10", 10.0, 60.000, 10.0),
            fix(1, "2024-01-01 00:00:20", 10.0, 59.001, 10.0),
        ];
        let out = BidirectionalDriftStep { max_knots: 50.0 }.apply(records);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.lat.unwrap() < 59.5));
    }

    #[test]
    fn test_speed_anomalies_threshold_keeps_missing_speed() {
        let mut no_speed = fix(1, "2024-01-01 00:00:30", 10.0, 59.0, 0.0);
        no_speed.sog = None;
        let records = vec![
            fix(1, "2024-01-01 00:00:00", 10.0, 59.0, 12.0),
            fix(1, "2024-01-01 00:00:10", 10.0, 59.0, 102.3),
            no_speed,
        ];
        let out = SpeedAnomalyStep { max_knots: 40.0, z_threshold: None }.apply(records);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_drift_alone_drops_same_timestamp_fix() {
        let records = vec![
            fix(1, "2024-01-01 00:00:00", 10.0, 59.000, 10.0),
            fix(1, "2024-01-01 00:00:00", 10.0, 59.000, 10.0),
            fix(1, "2024-01-01 00:00:10", 10.0, 59.001, 10.0),
        ];
        let out = DriftStep { max_knots: 50.0 }.apply(records);
        assert_eq!(out.len(), 2);
        assert!(out[0].time_utc < out[1].time_utc);
    }

    fn minute(i: usize) -> String {
        format!("2024-01-01 00:{i:02}:00")
    }

    #[test]
    fn test_speed_z_score_drops_outlier_only() {
        // nine fixes at 5 kn and one at 30 kn: mean 7.5, sample std ~7.9
        let mut records: Vec<AisRecord> =
            (0..9).map(|i| fix(1, &minute(i), 10.0, 59.0, 5.0)).collect();
        records.push(fix(1, &minute(9), 10.0, 59.0, 30.0));

        let out = SpeedAnomalyStep { max_knots: 40.0, z_threshold: Some(2.0) }.apply(records);
        assert_eq!(out.len(), 9);
        assert!(out.iter().all(|r| r.sog == Some(5.0)));
    }

    #[test]
    fn test_speed_z_score_keeps_single_and_constant_vessels() {
        let records = vec![
            // one fix: no spread to judge by
            fix(2, &minute(0), 10.0, 59.0, 39.0),
            // constant speed: std is zero
            fix(3, &minute(0), 10.0, 59.0, 0.1),
            fix(3, &minute(1), 10.0, 59.0, 0.1),
            fix(3, &minute(2), 10.0, 59.0, 0.1),
        ];
        let out = SpeedAnomalyStep { max_knots: 40.0, z_threshold: Some(0.5) }.apply(records);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_step_table_percentages() {
        let cfg = CleaningConfig::default();
        let cleaner = Cleaner::from_config(&cfg).unwrap();
        let records = vec![
            fix(2, "2024-01-01 00:00:10", 10.0, 59.0, 5.0),
            fix(2, "2024-01-01 00:00:00", 10.0, 59.0, 5.0),
            fix(2, "2024-01-01 00:00:00", 10.0, 59.0, 5.0),
            fix(1, "2024-01-01 00:00:00", 10.0, 59.0, 99.0),
        ];
        let (cleaned, table) = cleaner.run(records);

        assert_eq!(table[0], StepRecord::raw_input(4));
        assert_eq!(table[1].step, "basic");
        assert_eq!(table[1].rows_removed, 1);
        assert_eq!(table[1].removed_pct_of_previous, 25.0);
        assert_eq!(table[3].step, "speed_anomalies");
        assert_eq!(table[3].rows_removed, 1);
        assert!((table[3].removed_pct_of_previous - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(cleaned.len(), 2);
        // sorted by time within vessel
        assert!(cleaned[0].time_utc < cleaned[1].time_utc);
    }

    #[test]
    fn test_empty_input_has_zero_percentages() {
        let cleaner = Cleaner::from_config(&CleaningConfig::default()).unwrap();
        let (cleaned, table) = cleaner.run(Vec::new());
        assert!(cleaned.is_empty());
        assert!(table.iter().all(|s| s.removed_pct_of_previous == 0.0));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let cfg = CleaningConfig { steps: vec!["magic".to_string()], ..Default::default() };
        let err = Cleaner::from_config(&cfg).err().unwrap().to_string();
        assert!(err.contains("magic"));
        assert!(err.contains("tbd_drift"));
    }
}
