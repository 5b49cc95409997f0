// ============================================================
// Layer 3 — Project Layout Conventions
// ============================================================
// Every analysis project follows the same naming scheme:
//
//   P1_data_statistics_traj_cleaning/     ← pipeline folder  (P{N}_<name>)
//     p2_traj_cleaning.rs                 ← script           (p{n}_<name>)
//
//   output/P1/p2_traj_cleaning/           ← script outputs
//     P1_p2_cleaned_traj.feather          ← P{N}_p{n}_<suffix>
//     p2_tables/  p2_figures/             ← analysis pipelines only
//   logs/P1/p2_traj_cleaning/
//     p2_traj_cleaning.log
//
// These types encode the scheme so no use case ever builds
// one of these paths by string concatenation.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised when a name does not follow the conventions
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid pipeline id '{0}': expected P<number> or P<number>_<name>")]
    BadPipeline(String),

    #[error("invalid script id '{0}': expected p<number>_<name> with a lowercase name")]
    BadScript(String),
}

// ─── PipelineId ───────────────────────────────────────────────────────────────
/// A numbered pipeline, displayed as `P{N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u32);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl FromStr for PipelineId {
    type Err = LayoutError;

    /// Accepts `P3` (output/log folders) and `P3_some_name` (pipeline folders)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LayoutError::BadPipeline(s.to_string());
        let rest = s.strip_prefix('P').ok_or_else(bad)?;
        let (digits, name) = match rest.split_once('_') {
            Some((d, n)) => (d, Some(n)),
            None         => (rest, None),
        };
        if !is_number(digits) {
            return Err(bad());
        }
        if let Some(n) = name {
            if !is_valid_name(n) {
                return Err(bad());
            }
        }
        digits.parse().map(PipelineId).map_err(|_| bad())
    }
}

/// Split a pipeline folder name `P{N}_<name>` into its id and name.
/// Unlike `PipelineId::from_str`, the name part is required.
pub fn parse_pipeline_dir(dir_name: &str) -> Result<(PipelineId, String), LayoutError> {
    let id: PipelineId = dir_name.parse()?;
    match dir_name.split_once('_') {
        Some((_, name)) => Ok((id, name.to_string())),
        None            => Err(LayoutError::BadPipeline(dir_name.to_string())),
    }
}

// ─── ScriptId ─────────────────────────────────────────────────────────────────
/// A script inside a pipeline, displayed as `p{n}_{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId {
    pub number: u32,
    pub name:   String,
}

impl ScriptId {
    pub fn new(number: u32, name: impl Into<String>) -> Result<Self, LayoutError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(LayoutError::BadScript(format!("p{number}_{name}")));
        }
        Ok(Self { number, name })
    }

    /// Short tag used in file prefixes, e.g. `p2`
    pub fn tag(&self) -> String {
        format!("p{}", self.number)
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}_{}", self.number, self.name)
    }
}

impl FromStr for ScriptId {
    type Err = LayoutError;

    /// Accepts `p2_traj_cleaning`, optionally with a file extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad  = || LayoutError::BadScript(s.to_string());
        let stem = s.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(s);
        let rest = stem.strip_prefix('p').ok_or_else(bad)?;
        let (digits, name) = rest.split_once('_').ok_or_else(bad)?;
        if !is_number(digits) {
            return Err(bad());
        }
        let number = digits.parse().map_err(|_| bad())?;
        ScriptId::new(number, name).map_err(|_| bad())
    }
}

/// Plain decimal without leading zeros, so `P02` never aliases `P2`
fn is_number(digits: &str) -> bool {
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

/// Names are lowercase snake case: `[a-z0-9_]+`, not starting with `_`
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('_')
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ─── StepLayout ───────────────────────────────────────────────────────────────
/// Output and log locations owned by one script of one pipeline.
#[derive(Debug, Clone)]
pub struct StepLayout {
    root:     PathBuf,
    pipeline: PipelineId,
    script:   ScriptId,
}

impl StepLayout {
    pub fn new(root: impl Into<PathBuf>, pipeline: PipelineId, script: ScriptId) -> Self {
        Self { root: root.into(), pipeline, script }
    }

    pub fn script(&self) -> &ScriptId {
        &self.script
    }

    /// `root/output/P{N}/p{n}_{name}`
    pub fn output_dir(&self) -> PathBuf {
        self.root
            .join("output")
            .join(self.pipeline.to_string())
            .join(self.script.to_string())
    }

    /// `root/logs/P{N}/p{n}_{name}`
    pub fn log_dir(&self) -> PathBuf {
        self.root
            .join("logs")
            .join(self.pipeline.to_string())
            .join(self.script.to_string())
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.output_dir().join(format!("{}_tables", self.script.tag()))
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.output_dir().join(format!("{}_figures", self.script.tag()))
    }

    /// File prefix shared by all outputs, e.g. `P1_p2`
    pub fn prefix(&self) -> String {
        format!("{}_{}", self.pipeline, self.script.tag())
    }

    /// `output_dir/P{N}_p{n}_{suffix}`
    pub fn output_file(&self, suffix: &str) -> PathBuf {
        self.output_dir().join(format!("{}_{}", self.prefix(), suffix))
    }

    /// `log_dir/p{n}_{name}.log`
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join(format!("{}.log", self.script))
    }

    /// Raster + vector pair for one figure. Analysis scripts keep
    /// figures in `p{n}_figures`, processing scripts in the output dir.
    pub fn figure_pair(&self, stem: &str, in_figures_dir: bool) -> (PathBuf, PathBuf) {
        let dir  = if in_figures_dir { self.figures_dir() } else { self.output_dir() };
        let name = format!("{}_{}", self.prefix(), stem);
        (dir.join(format!("{name}.png")), dir.join(format!("{name}.svg")))
    }

    /// Create the output and log directories (like `mkdir -p`).
    /// Analysis scripts also get their tables/figures subfolders.
    pub fn ensure_dirs(&self, with_analysis_dirs: bool) -> std::io::Result<()> {
        fs::create_dir_all(self.output_dir())?;
        fs::create_dir_all(self.log_dir())?;
        if with_analysis_dirs {
            fs::create_dir_all(self.tables_dir())?;
            fs::create_dir_all(self.figures_dir())?;
        }
        tracing::debug!("Ensured layout for {}/{}", self.pipeline, self.script);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StepLayout {
        StepLayout::new("/proj", PipelineId(1), ScriptId::new(2, "traj_cleaning").unwrap())
    }

    #[test]
    fn test_pipeline_id_parsing() {
        assert_eq!("P1".parse::<PipelineId>(), Ok(PipelineId(1)));
        assert_eq!("P12_data_statistics".parse::<PipelineId>(), Ok(PipelineId(12)));
        assert!("p1".parse::<PipelineId>().is_err());
        assert!("P".parse::<PipelineId>().is_err());
        assert!("P1_Bad-Name".parse::<PipelineId>().is_err());
        assert_eq!("P0".parse::<PipelineId>(), Ok(PipelineId(0)));
    }

    #[test]
    fn test_leading_zeros_rejected() {
        assert!("P02".parse::<PipelineId>().is_err());
        assert!("P02_x".parse::<PipelineId>().is_err());
        assert!(parse_pipeline_dir("P007_data").is_err());
        assert!("p02_x.py".parse::<ScriptId>().is_err());
        assert!("p00_x".parse::<ScriptId>().is_err());
        assert!("p0_x".parse::<ScriptId>().is_ok());
        assert!("p10_x".parse::<ScriptId>().is_ok());
    }

    #[test]
    fn test_pipeline_dir_needs_name() {
        let (id, name) = parse_pipeline_dir("P1_data_statistics_traj_cleaning").unwrap();
        assert_eq!(id, PipelineId(1));
        assert_eq!(name, "data_statistics_traj_cleaning");
        assert!(parse_pipeline_dir("P1").is_err());
        assert!(parse_pipeline_dir("Pipeline_x").is_err());
    }

    #[test]
    fn test_script_id_parsing() {
        let s: ScriptId = "p2_traj_cleaning.py".parse().unwrap();
        assert_eq!(s.number, 2);
        assert_eq!(s.name, "traj_cleaning");
        assert_eq!(s.to_string(), "p2_traj_cleaning");
        assert!("p2".parse::<ScriptId>().is_err());
        assert!("P2_traj".parse::<ScriptId>().is_err());
        assert!("p_x".parse::<ScriptId>().is_err());
    }

    #[test]
    fn test_step_paths() {
        let l = layout();
        assert_eq!(l.output_dir(), PathBuf::from("/proj/output/P1/p2_traj_cleaning"));
        assert_eq!(l.log_dir(), PathBuf::from("/proj/logs/P1/p2_traj_cleaning"));
        assert_eq!(
            l.output_file("cleaned_traj.feather"),
            PathBuf::from("/proj/output/P1/p2_traj_cleaning/P1_p2_cleaned_traj.feather")
        );
        assert_eq!(
            l.log_file(),
            PathBuf::from("/proj/logs/P1/p2_traj_cleaning/p2_traj_cleaning.log")
        );
        assert!(l.tables_dir().ends_with("p2_tables"));
    }

    #[test]
    fn test_figure_pair() {
        let (png, svg) = layout().figure_pair("density", true);
        assert!(png.ends_with("p2_figures/P1_p2_density.png"));
        assert!(svg.ends_with("p2_figures/P1_p2_density.svg"));

        // dots in the stem stay part of the name
        let (png, svg) = layout().figure_pair("grid_res12.5", false);
        assert_eq!(png, PathBuf::from("/proj/output/P1/p2_traj_cleaning/P1_p2_grid_res12.5.png"));
        assert_eq!(svg, PathBuf::from("/proj/output/P1/p2_traj_cleaning/P1_p2_grid_res12.5.svg"));
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let l   = StepLayout::new(tmp.path(), PipelineId(3), ScriptId::new(1, "x").unwrap());
        l.ensure_dirs(true).unwrap();
        l.ensure_dirs(true).unwrap();
        assert!(l.figures_dir().is_dir());
        assert!(l.log_dir().is_dir());
    }
}
