// ============================================================
// Layer 5 — Text Reports
// ============================================================
// Builds the human readable .txt reports written by the
// inspection and cleaning scripts.
//
// Inspection summary sections:
//   header     → rows, columns, time range, unique MMSI, duplicates
//   Missing Values / Dtypes / Numeric Describe
//   Sample Rows → a reproducible random sample (seeded RNG)
//
// Cleaning report sections:
//   totals, mean reporting interval before/after,
//   step-by-step removal, per-MMSI impact, top 20 MMSI

use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;

use crate::analysis::describe::{Describe, DESCRIBE_PERCENTILES};
use crate::analysis::intervals::{mean_of_vessel_means, IntervalRow};
use crate::analysis::row_changes::{ImpactSummary, RowChange};
use crate::analysis::text_table::{fixed, thousands, TextTable};
use crate::data::cleaner::{percent, StepRecord};
use crate::domain::record::{format_timestamp, AisRecord, Column};

const RULE_WIDTH: usize = 60;

/// Rows listed in the "Top MMSI" section of the cleaning report
const TOP_MMSI: usize = 20;

fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Options for the inspection summary
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub sample_rows: usize,
    pub seed:        u64,
    /// Columns the table actually carries, in display order
    pub columns:     Vec<Column>,
}

/// Rows whose (mmsi, timeUtc) pair already appeared earlier
pub fn count_duplicates(records: &[AisRecord]) -> usize {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !seen.insert((r.mmsi, r.time_utc)))
        .count()
}

// ─── Inspection Summary ───────────────────────────────────────────────────────
pub fn build_summary(title: &str, records: &[AisRecord], opts: &SummaryOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    let time_min = records.iter().filter_map(|r| r.time_utc).min();
    let time_max = records.iter().filter_map(|r| r.time_utc).max();
    let unique_mmsi: HashSet<i64> = records.iter().filter_map(|r| r.mmsi).collect();

    lines.push(title.to_string());
    lines.push(heavy_rule());
    lines.push(format!("Rows: {}", thousands(records.len())));
    lines.push(format!("Columns: {}", opts.columns.len()));
    lines.push(format!(
        "Time range: {} -> {}",
        format_timestamp(time_min),
        format_timestamp(time_max)
    ));
    lines.push(format!("Unique MMSI: {}", thousands(unique_mmsi.len())));
    lines.push(format!(
        "Duplicate records (mmsi + timeUtc): {}",
        thousands(count_duplicates(records))
    ));

    // ── Missing Values ────────────────────────────────────────────────────────
    lines.push(String::new());
    lines.push("Missing Values".to_string());
    lines.push(light_rule());
    let mut missing = TextTable::new(["column", "missing"]);
    for &c in &opts.columns {
        let n = records.iter().filter(|r| r.is_missing(c)).count();
        missing.push_row([c.name().to_string(), n.to_string()]);
    }
    lines.push(missing.render());

    // ── Dtypes ────────────────────────────────────────────────────────────────
    lines.push(String::new());
    lines.push("Dtypes".to_string());
    lines.push(light_rule());
    let mut dtypes = TextTable::new(["column", "dtype"]);
    for c in &opts.columns {
        dtypes.push_row([c.name(), c.kind().label()]);
    }
    lines.push(dtypes.render());

    // ── Numeric Describe ──────────────────────────────────────────────────────
    lines.push(String::new());
    lines.push("Numeric Describe".to_string());
    lines.push(light_rule());
    lines.push(describe_table(records, &opts.columns).render());

    // ── Sample Rows ───────────────────────────────────────────────────────────
    if opts.sample_rows > 0 && !records.is_empty() {
        lines.push(String::new());
        lines.push(format!("Sample Rows (seed {})", opts.seed));
        lines.push(light_rule());
        lines.push(sample_table(records, opts).render());
    }

    lines.join("\n") + "\n"
}

/// Statistics as rows, numeric columns as columns
fn describe_table(records: &[AisRecord], columns: &[Column]) -> TextTable {
    let numeric: Vec<Column> = columns.iter().copied().filter(|c| c.kind().is_numeric()).collect();
    let stats: Vec<Describe> = numeric
        .iter()
        .map(|&c| Describe::of(records.iter().map(|r| r.numeric(c)), &DESCRIBE_PERCENTILES))
        .collect();

    let mut header = vec![String::new()];
    header.extend(numeric.iter().map(|c| c.name().to_string()));
    let mut table = TextTable::new(header);

    let labels = Describe::of(Vec::<Option<f64>>::new(), &DESCRIBE_PERCENTILES).labels();
    for (i, label) in labels.into_iter().enumerate() {
        let mut row = vec![label];
        row.extend(stats.iter().map(|d| fixed(d.values()[i], 6)));
        table.push_row(row);
    }
    table
}

fn sample_table(records: &[AisRecord], opts: &SummaryOptions) -> TextTable {
    let mut rng     = StdRng::seed_from_u64(opts.seed);
    let amount      = opts.sample_rows.min(records.len());
    let mut indices = rand::seq::index::sample(&mut rng, records.len(), amount).into_vec();
    indices.sort_unstable();

    let mut header = vec!["row".to_string()];
    header.extend(opts.columns.iter().map(|c| c.name().to_string()));
    let mut table = TextTable::new(header);

    for i in indices {
        let r = &records[i];
        let mut row = vec![i.to_string()];
        row.extend(opts.columns.iter().map(|&c| match c {
            Column::TimeUtc => format_timestamp(r.time_utc),
            other => r
                .numeric(other)
                .map(|v| if v.fract() == 0.0 { format!("{v:.0}") } else { v.to_string() })
                .unwrap_or_else(|| "NaN".to_string()),
        }));
        table.push_row(row);
    }
    table
}

// ─── Cleaning Report ──────────────────────────────────────────────────────────
pub fn step_table(steps: &[StepRecord]) -> TextTable {
    let mut table = TextTable::new([
        "step",
        "rows_before",
        "rows_after",
        "rows_removed",
        "removed_pct_of_previous",
        "removed_pct_of_initial",
    ]);
    for s in steps {
        table.push_row([
            s.step.clone(),
            s.rows_before.to_string(),
            s.rows_after.to_string(),
            s.rows_removed.to_string(),
            fixed(s.removed_pct_of_previous, 6),
            fixed(s.removed_pct_of_initial, 6),
        ]);
    }
    table
}

fn row_change_text(rows: &[RowChange]) -> TextTable {
    let mut table = TextTable::new([
        "mmsi",
        "raw_rows",
        "cleaned_rows",
        "rows_removed",
        "removed_ratio_pct",
    ]);
    for r in rows {
        table.push_row([
            r.mmsi.to_string(),
            r.raw_rows.to_string(),
            r.cleaned_rows.to_string(),
            r.rows_removed.to_string(),
            fixed(r.removed_ratio_pct, 6),
        ]);
    }
    table
}

pub fn format_cleaning_report(
    steps:             &[StepRecord],
    row_changes:       &[RowChange],
    raw_intervals:     &[IntervalRow],
    cleaned_intervals: &[IntervalRow],
) -> String {
    let total_raw = steps
        .iter()
        .find(|s| s.step == "raw_input")
        .map(|s| s.rows_after)
        .unwrap_or(0);
    let total_cleaned = steps.last().map(|s| s.rows_after).unwrap_or(0);
    let total_removed = total_raw.saturating_sub(total_cleaned);
    let impact        = ImpactSummary::of(row_changes);

    let mut lines: Vec<String> = Vec::new();
    lines.push("P1_p2 Trajectory Cleaning Report".to_string());
    lines.push(heavy_rule());
    lines.push(format!("Raw rows: {}", thousands(total_raw)));
    lines.push(format!("Cleaned rows: {}", thousands(total_cleaned)));
    lines.push(format!(
        "Total rows removed: {} ({:.2}%)",
        thousands(total_removed),
        percent(total_removed, total_raw)
    ));
    lines.push(String::new());
    lines.push("Per-MMSI Average Interval (seconds)".to_string());
    lines.push(light_rule());
    lines.push(format!("Raw (mean of vessel means): {}", fixed(mean_of_vessel_means(raw_intervals), 3)));
    lines.push(format!(
        "Cleaned (mean of vessel means): {}",
        fixed(mean_of_vessel_means(cleaned_intervals), 3)
    ));
    lines.push(String::new());
    lines.push("Step-by-Step Removal".to_string());
    lines.push(light_rule());
    lines.push(step_table(steps).render());
    lines.push(String::new());
    lines.push("Per-MMSI Impact Summary".to_string());
    lines.push(light_rule());
    lines.push(format!("Total MMSI in raw: {}", thousands(impact.total)));
    lines.push(format!("MMSI fully removed (0 rows left): {}", thousands(impact.fully_removed)));
    lines.push(format!("MMSI with >=50% rows removed: {}", thousands(impact.at_least_50_pct)));
    lines.push(format!("MMSI with >=80% rows removed: {}", thousands(impact.at_least_80_pct)));
    lines.push(String::new());
    lines.push(format!("Top {TOP_MMSI} MMSI by rows removed"));
    lines.push(light_rule());
    let top = &row_changes[..row_changes.len().min(TOP_MMSI)];
    lines.push(row_change_text(top).render());

    lines.join("\n") + "\n"
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::row_changes::row_change_table;

    fn rec(mmsi: Option<i64>, ts: &str, lat: Option<f64>) -> AisRecord {
        let mut r = AisRecord::default();
        r.mmsi = mmsi;
        r.set_from_str(Column::TimeUtc, ts);
        r.lat = lat;
        r
    }

    fn sample() -> Vec<AisRecord> {
        vec![
            rec(Some(1), "2024-01-01 00:00:00", Some(59.0)),
            rec(Some(1), "2024-01-01 00:00:00", Some(59.1)),
            rec(Some(2), "2024-01-02 12:30:00", None),
            rec(None, "", Some(58.0)),
        ]
    }

    fn opts(sample_rows: usize, seed: u64) -> SummaryOptions {
        SummaryOptions { sample_rows, seed, columns: Column::ALL.to_vec() }
    }

    #[test]
    fn test_duplicates_count_later_occurrences_only() {
        assert_eq!(count_duplicates(&sample()), 1);
        // missing keys compare equal to each other
        assert_eq!(count_duplicates(&[rec(None, "", None), rec(None, "", None)]), 1);
    }

    #[test]
    fn test_summary_header_lines() {
        let opts    = opts(2, 42);
        let summary = build_summary("P1_p1 Raw Data Inspection", &sample(), &opts);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines[0], "P1_p1 Raw Data Inspection");
        assert_eq!(lines[1], "=".repeat(60));
        assert_eq!(lines[2], "Rows: 4");
        assert_eq!(lines[3], "Columns: 10");
        assert_eq!(lines[4], "Time range: 2024-01-01 00:00:00 -> 2024-01-02 12:30:00");
        assert_eq!(lines[5], "Unique MMSI: 2");
        assert_eq!(lines[6], "Duplicate records (mmsi + timeUtc): 1");
        assert!(summary.contains("Missing Values"));
        assert!(summary.contains("datetime64[UTC]"));
        assert!(summary.contains("Sample Rows (seed 42)"));
        assert!(summary.ends_with('\n'));
    }

    #[test]
    fn test_summary_sample_is_reproducible() {
        let opts = opts(2, 7);
        assert_eq!(build_summary("t", &sample(), &opts), build_summary("t", &sample(), &opts));
    }

    #[test]
    fn test_summary_of_empty_table() {
        let summary = build_summary("t", &[], &opts(5, 1));
        assert!(summary.contains("Time range: NaT -> NaT"));
        assert!(!summary.contains("Sample Rows"));
    }

    #[test]
    fn test_missing_values_section() {
        let summary = build_summary("t", &sample(), &opts(0, 1));
        let mmsi_line = summary
            .lines()
            .skip_while(|l| *l != "Missing Values")
            .find(|l| l.trim_start().starts_with("mmsi"))
            .unwrap();
        assert!(mmsi_line.trim_end().ends_with('1'));
    }

    #[test]
    fn test_summary_lists_only_configured_columns() {
        let columns = vec![Column::Id, Column::Mmsi, Column::TimeUtc, Column::Lon, Column::Lat, Column::Sog];
        let opts    = SummaryOptions { sample_rows: 2, seed: 1, columns };
        let summary = build_summary("t", &sample(), &opts);

        assert!(summary.lines().any(|l| l == "Columns: 6"));
        assert!(summary.contains("sog"));
        assert!(!summary.contains("trueHeading"));
        assert!(!summary.contains("navigationStatus"));
        assert!(!summary.contains("cog"));
    }

    #[test]
    fn test_cleaning_report_totals() {
        let steps = vec![
            StepRecord::raw_input(4),
            StepRecord::new("basic", 4, 3, 4),
        ];
        let raw     = sample();
        let cleaned = raw[..3].to_vec();
        let changes = row_change_table(&raw, &cleaned);
        let report  = format_cleaning_report(&steps, &changes, &[], &[]);

        assert!(report.contains("Raw rows: 4"));
        assert!(report.contains("Cleaned rows: 3"));
        assert!(report.contains("Total rows removed: 1 (25.00%)"));
        assert!(report.contains("Raw (mean of vessel means): nan"));
        assert!(report.contains("Total MMSI in raw: 2"));
        assert!(report.contains("Top 20 MMSI by rows removed"));
    }
}
