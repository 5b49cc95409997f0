// ============================================================
// Layer 6 — Project Configuration
// ============================================================
// Everything a project would otherwise hardcode at the top of
// each script: where the project lives, where the raw data is,
// which column order the headerless raw CSV uses, worker count,
// random seed and the cleaning / grid parameters.
//
// Stored as JSON. Every field has a default, so a config file
// only needs the values a project actually changes:
//
//   { "raw_data": "data/other_feed.csv", "workers": 8 }
//
// Reference: serde field defaults, serde_json pretty printing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::domain::record::Column;
use crate::infra::workers::DEFAULT_WORKERS;

/// Thresholds used by the built-in cleaning steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Steps to run, in order
    pub steps: Vec<String>,

    /// Reported speed above this is an anomaly (knots)
    pub max_speed_knots: f64,

    /// Speed implied by two consecutive fixes above this is drift (knots)
    pub max_implied_speed_knots: f64,

    /// Optional per-vessel z-score cut for reported speed
    pub speed_z_threshold: Option<f64>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            steps: vec![
                "basic".to_string(),
                "tbd_drift".to_string(),
                "speed_anomalies".to_string(),
            ],
            max_speed_knots:         40.0,
            max_implied_speed_knots: 50.0,
            speed_z_threshold:       None,
        }
    }
}

/// Quantile window and padding for the plotting extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtentConfig {
    pub q_low:     f64,
    pub q_high:    f64,
    pub pad_ratio: f64,
}

impl Default for ExtentConfig {
    fn default() -> Self {
        Self { q_low: 0.01, q_high: 0.99, pad_ratio: 0.06 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root; every other relative path resolves against it
    pub root: PathBuf,

    /// Raw AIS feed, headerless CSV
    pub raw_data: PathBuf,

    /// Column order of the raw CSV
    pub raw_columns: Vec<String>,

    /// Parallel workers for per-file processing
    pub workers: usize,

    /// Seed for every random choice the pipeline makes
    pub seed: u64,

    /// Rows shown in the "Sample Rows" section of inspections
    pub sample_rows: usize,

    pub cleaning: CleaningConfig,

    /// Grid cell edge length in metres
    pub grid_resolution_m: f64,

    pub extent: ExtentConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root:              PathBuf::from("."),
            raw_data:          PathBuf::from("data/bridge_msg_filtered.csv"),
            raw_columns:       Column::default_order(),
            workers:           DEFAULT_WORKERS,
            seed:              42,
            sample_rows:       5,
            cleaning:          CleaningConfig::default(),
            grid_resolution_m: 10.0,
            extent:            ExtentConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load a config from JSON, or defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        let cfg: ProjectConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config JSON in '{}'", path.display()))?;

        tracing::info!("Loaded config from '{}'", path.display());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make the pipeline misbehave later
    pub fn validate(&self) -> Result<()> {
        if !self.grid_resolution_m.is_finite() || self.grid_resolution_m <= 0.0 {
            anyhow::bail!("grid_resolution_m must be positive, got {}", self.grid_resolution_m);
        }
        let e = &self.extent;
        if !(0.0..=1.0).contains(&e.q_low) || !(0.0..=1.0).contains(&e.q_high) || e.q_low >= e.q_high {
            anyhow::bail!("extent quantiles must satisfy 0 <= q_low < q_high <= 1");
        }
        if self.raw_columns.is_empty() {
            anyhow::bail!("raw_columns must list at least one column");
        }
        Ok(())
    }

    /// Resolve a path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.resolve(&self.raw_data)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ProjectConfig::default();
        assert_eq!(cfg.workers, 24);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.cleaning.steps, vec!["basic", "tbd_drift", "speed_anomalies"]);
        assert_eq!(cfg.raw_columns[1], "mmsi");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.json");
        fs::write(&path, r#"{ "workers": 4, "cleaning": { "max_speed_knots": 30.0 } }"#).unwrap();

        let cfg = ProjectConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.cleaning.max_speed_knots, 30.0);
        assert_eq!(cfg.cleaning.steps.len(), 3);
        assert_eq!(cfg.grid_resolution_m, 10.0);
    }

    #[test]
    fn test_shown_config_loads_back() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.json");
        let mut cfg = ProjectConfig::default();
        cfg.seed = 7;
        fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(ProjectConfig::load_or_default(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let cfg = ProjectConfig { grid_resolution_m: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let cfg = ProjectConfig { root: PathBuf::from("/proj"), ..Default::default() };
        assert_eq!(cfg.raw_data_path(), PathBuf::from("/proj/data/bridge_msg_filtered.csv"));
        assert_eq!(cfg.resolve(Path::new("/abs/x.csv")), PathBuf::from("/abs/x.csv"));
    }
}
