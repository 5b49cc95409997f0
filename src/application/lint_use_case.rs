// ============================================================
// Layer 2 — LintUseCase
// ============================================================
// Checks that a project follows the P{N}/p{n} conventions:
//
//   <root>/P{N}_<name>/             pipeline folders
//       p{n}_<name>.<ext>           scripts
//   <root>/output/P{N}/p{n}_<name>/ one per script
//   <root>/logs/P{N}/p{n}_<name>/   one per script
//
// Lint only reads the tree. Each problem becomes a Finding;
// an empty list means the project is clean.

use anyhow::{Context, Result};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::domain::layout::{parse_pipeline_dir, PipelineId, ScriptId, StepLayout};

/// File extensions treated as pipeline scripts
const SCRIPT_EXTENSIONS: [&str; 2] = ["py", "rs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Root folder starting with `P<digit>` that is not `P{N}_<name>`
    BadPipelineDir(PathBuf),
    /// Script file inside a pipeline folder not named `p{n}_<name>.<ext>`
    BadScriptName(PathBuf),
    /// Script without its output folder
    MissingOutputDir { script: PathBuf, expected: PathBuf },
    /// Script without its log folder
    MissingLogDir { script: PathBuf, expected: PathBuf },
    /// Folder under output/ or logs/ that breaks the convention
    StrayDir(PathBuf),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::BadPipelineDir(p) => {
                write!(f, "pipeline folder '{}' is not named P<N>_<name>", p.display())
            }
            Finding::BadScriptName(p) => {
                write!(f, "script '{}' is not named p<n>_<name>.<ext>", p.display())
            }
            Finding::MissingOutputDir { script, expected } => write!(
                f,
                "script '{}' has no output folder '{}'",
                script.display(),
                expected.display()
            ),
            Finding::MissingLogDir { script, expected } => write!(
                f,
                "script '{}' has no log folder '{}'",
                script.display(),
                expected.display()
            ),
            Finding::StrayDir(p) => {
                write!(f, "folder '{}' does not follow P<N>/p<n>_<name>", p.display())
            }
        }
    }
}

pub struct LintUseCase {
    root: PathBuf,
}

impl LintUseCase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn execute(&self) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for dir in subdirs(&self.root)? {
            let name = file_name(&dir);
            if !looks_like_pipeline(&name) {
                continue;
            }
            match parse_pipeline_dir(&name) {
                Ok((pipeline, _)) => self.lint_pipeline(&dir, pipeline, &mut findings)?,
                Err(_)            => findings.push(Finding::BadPipelineDir(dir)),
            }
        }

        for area in ["output", "logs"] {
            let area_dir = self.root.join(area);
            if area_dir.is_dir() {
                lint_area(&area_dir, &mut findings)?;
            }
        }

        tracing::info!("Lint of '{}': {} finding(s)", self.root.display(), findings.len());
        Ok(findings)
    }

    fn lint_pipeline(&self, dir: &Path, pipeline: PipelineId, findings: &mut Vec<Finding>) -> Result<()> {
        let entries = fs::read_dir(dir).with_context(|| format!("Cannot read '{}'", dir.display()))?;
        let mut scripts: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_script_file(p))
            .collect();
        scripts.sort();

        for path in scripts {
            let Ok(script) = file_name(&path).parse::<ScriptId>() else {
                findings.push(Finding::BadScriptName(path));
                continue;
            };
            let layout = StepLayout::new(&self.root, pipeline, script);
            if !layout.output_dir().is_dir() {
                findings.push(Finding::MissingOutputDir { script: path.clone(), expected: layout.output_dir() });
            }
            if !layout.log_dir().is_dir() {
                findings.push(Finding::MissingLogDir { script: path, expected: layout.log_dir() });
            }
        }
        Ok(())
    }
}

/// output/ and logs/ hold `P{N}` folders, which hold `p{n}_<name>` folders
fn lint_area(area_dir: &Path, findings: &mut Vec<Finding>) -> Result<()> {
    for pipeline_dir in subdirs(area_dir)? {
        let name = file_name(&pipeline_dir);
        let valid = name
            .parse::<PipelineId>()
            .is_ok_and(|id| id.to_string() == name);
        if !valid {
            findings.push(Finding::StrayDir(pipeline_dir));
            continue;
        }
        for script_dir in subdirs(&pipeline_dir)? {
            let name = file_name(&script_dir);
            let valid = name
                .parse::<ScriptId>()
                .is_ok_and(|id| id.to_string() == name);
            if !valid {
                findings.push(Finding::StrayDir(script_dir));
            }
        }
    }
    Ok(())
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Cannot read '{}'", dir.display()))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() && !file_name(p).starts_with('.'))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn looks_like_pipeline(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('P') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn is_script_file(path: &Path) -> bool {
    let name = file_name(path);
    let ext  = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    SCRIPT_EXTENSIONS.contains(&ext) && !name.starts_with('_') && !name.starts_with('.')
}
