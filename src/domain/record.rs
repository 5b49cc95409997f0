// ============================================================
// Layer 3 — AIS Record Domain Type
// ============================================================
// One AIS position report, as it appears in the raw feed.
//
// Every field is optional: the raw CSV is parsed leniently and
// anything that cannot be read becomes "missing" instead of
// aborting the load. Inspection then counts those gaps.
//
// Column names keep the camelCase spelling of the source data
// (timeUtc, trueHeading, navigationStatus) so output tables line
// up with files produced by other tools in the project.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The canonical AIS columns known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Id,
    Mmsi,
    TimeUtc,
    Lon,
    Lat,
    Sog,
    Cog,
    TrueHeading,
    Rot,
    NavigationStatus,
}

/// Storage kind of a column, reported in the "Dtypes" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Timestamp,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Int       => "int64",
            ColumnKind::Float     => "float64",
            ColumnKind::Timestamp => "datetime64[UTC]",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Timestamp)
    }
}

impl Column {
    /// All columns in their default raw-file order
    pub const ALL: [Column; 10] = [
        Column::Id,
        Column::Mmsi,
        Column::TimeUtc,
        Column::Lon,
        Column::Lat,
        Column::Sog,
        Column::Cog,
        Column::TrueHeading,
        Column::Rot,
        Column::NavigationStatus,
    ];

    /// Name as used in file headers
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id               => "id",
            Column::Mmsi             => "mmsi",
            Column::TimeUtc          => "timeUtc",
            Column::Lon              => "lon",
            Column::Lat              => "lat",
            Column::Sog              => "sog",
            Column::Cog              => "cog",
            Column::TrueHeading      => "trueHeading",
            Column::Rot              => "rot",
            Column::NavigationStatus => "navigationStatus",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Id | Column::Mmsi | Column::NavigationStatus => ColumnKind::Int,
            Column::TimeUtc => ColumnKind::Timestamp,
            _ => ColumnKind::Float,
        }
    }

    /// Default raw column order, as a list of names for the config file
    pub fn default_order() -> Vec<String> {
        Column::ALL.iter().map(|c| c.name().to_string()).collect()
    }
}

/// A single AIS position report.
///
/// `sog` doubles as the "speed" column used by the cleaning steps,
/// so no renaming is needed before or after cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AisRecord {
    pub id: Option<i64>,
    pub mmsi: Option<i64>,
    #[serde(rename = "timeUtc")]
    pub time_utc: Option<DateTime<Utc>>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub sog: Option<f64>,
    pub cog: Option<f64>,
    #[serde(rename = "trueHeading")]
    pub true_heading: Option<f64>,
    pub rot: Option<f64>,
    #[serde(rename = "navigationStatus")]
    pub navigation_status: Option<i64>,
}

impl AisRecord {
    /// Numeric value of a column, or None when missing / not numeric
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Id               => self.id.map(|v| v as f64),
            Column::Mmsi             => self.mmsi.map(|v| v as f64),
            Column::TimeUtc          => None,
            Column::Lon              => self.lon,
            Column::Lat              => self.lat,
            Column::Sog              => self.sog,
            Column::Cog              => self.cog,
            Column::TrueHeading      => self.true_heading,
            Column::Rot              => self.rot,
            Column::NavigationStatus => self.navigation_status.map(|v| v as f64),
        }
    }

    pub fn is_missing(&self, column: Column) -> bool {
        match column {
            Column::TimeUtc => self.time_utc.is_none(),
            other           => self.numeric(other).is_none(),
        }
    }

    /// Set a column from its raw text. Unparseable text leaves the field missing.
    pub fn set_from_str(&mut self, column: Column, raw: &str) {
        let raw = raw.trim();
        match column {
            Column::Id               => self.id = parse_int(raw),
            Column::Mmsi             => self.mmsi = parse_int(raw),
            Column::TimeUtc          => self.time_utc = parse_timestamp(raw),
            Column::Lon              => self.lon = parse_float(raw),
            Column::Lat              => self.lat = parse_float(raw),
            Column::Sog              => self.sog = parse_float(raw),
            Column::Cog              => self.cog = parse_float(raw),
            Column::TrueHeading      => self.true_heading = parse_float(raw),
            Column::Rot              => self.rot = parse_float(raw),
            Column::NavigationStatus => self.navigation_status = parse_int(raw),
        }
    }

    /// Both coordinates, if present
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lon?, self.lat?))
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Integers sometimes arrive as "123.0" when a column passed through a float stage
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// Lenient timestamp parsing; naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Format a timestamp the way the reports show it
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None    => "NaT".to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_round_trip() {
        for c in Column::ALL {
            assert_eq!(Column::from_name(c.name()), Some(c));
        }
        assert_eq!(Column::from_name("speed"), None);
    }

    #[test]
    fn test_coerces_bad_values_to_missing() {
        let mut r = AisRecord::default();
        r.set_from_str(Column::Lat, "abc");
        r.set_from_str(Column::Mmsi, "");
        r.set_from_str(Column::TimeUtc, "not a time");
        assert!(r.is_missing(Column::Lat));
        assert!(r.is_missing(Column::Mmsi));
        assert!(r.is_missing(Column::TimeUtc));
    }

    #[test]
    fn test_parses_integer_written_as_float() {
        let mut r = AisRecord::default();
        r.set_from_str(Column::Mmsi, "265547250.0");
        assert_eq!(r.mmsi, Some(265547250));
        r.set_from_str(Column::Mmsi, "1.5");
        assert_eq!(r.mmsi, None);
    }

    #[test]
    fn test_timestamp_formats() {
        let a = parse_timestamp("2024-03-01 12:00:05").unwrap();
        let b = parse_timestamp("2024-03-01T12:00:05Z").unwrap();
        let c = parse_timestamp("2024-03-01T12:00:05.000").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(parse_timestamp("0"), Utc.timestamp_opt(0, 0).single());
        assert_eq!(format_timestamp(Some(a)), "2024-03-01 12:00:05");
        assert_eq!(format_timestamp(None), "NaT");
    }

    #[test]
    fn test_numeric_skips_timestamp() {
        let r = AisRecord { mmsi: Some(7), ..Default::default() };
        assert_eq!(r.numeric(Column::Mmsi), Some(7.0));
        assert_eq!(r.numeric(Column::TimeUtc), None);
        assert!(!Column::TimeUtc.kind().is_numeric());
    }
}
