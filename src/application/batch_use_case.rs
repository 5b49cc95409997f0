// ============================================================
// Layer 2 — BatchInspectUseCase
// ============================================================
// Inspects every AIS table in a directory in parallel:
//
//   <dir>/*.csv, <dir>/*.feather
//       │   one job per file, up to `workers` at a time
//       ▼
//   output/P{N}/p{n}_<name>/P{N}_p{n}_<file_key>_summary.txt
//   logs/P{N}/p{n}_<name>/<file_name>.log
//
// <file_key> is the file name with '.' replaced by '_', so
// trips.csv and trips.feather never share an output.
//
// CSV files with a header row naming `mmsi` are read by header;
// anything else is treated as a headerless raw feed.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::analysis::report::build_summary;
use crate::analysis::text_table::thousands;
use crate::application::inspect_use_case::{raw_columns, summary_options};
use crate::data::{feather::FeatherStore, loader::CsvRecordSource};
use crate::domain::layout::{PipelineId, ScriptId, StepLayout};
use crate::domain::record::Column;
use crate::domain::traits::RecordSource;
use crate::infra::{
    config::ProjectConfig,
    table_writer::write_text,
    workers::{process_files_parallel, FileOutcome},
};

const INPUT_EXTENSIONS: [&str; 2] = ["csv", "feather"];

pub struct BatchInspectUseCase {
    config:   ProjectConfig,
    input:    PathBuf,
    pipeline: PipelineId,
    script:   ScriptId,
}

impl BatchInspectUseCase {
    pub fn new(config: ProjectConfig, input: PathBuf, pipeline: PipelineId, script: ScriptId) -> Self {
        Self { config, input, pipeline, script }
    }

    /// Inspect every input file; one outcome per file, in name order
    pub fn execute(&self) -> Result<Vec<FileOutcome<PathBuf>>> {
        let cfg    = &self.config;
        let input  = cfg.resolve(&self.input);
        let files  = list_inputs(&input)?;
        let layout = StepLayout::new(&cfg.root, self.pipeline, self.script.clone());
        layout
            .ensure_dirs(false)
            .with_context(|| format!("Cannot create directories for {}", layout.script()))?;

        if files.is_empty() {
            tracing::warn!("No .csv or .feather files in '{}'", input.display());
        }

        let outcomes = process_files_parallel(&files, cfg.workers, &layout.log_dir(), |path, log| {
            let (source, columns) = source_for(path, cfg)?;
            log.line(format!("Loading {}", source.describe()))?;
            let records = source.load_all()?;
            log.line(format!("Rows: {}", thousands(records.len())))?;

            let title   = format!("{} Inspection of {}", layout.prefix(), file_name(path));
            let summary = build_summary(&title, &records, &summary_options(cfg, columns));
            let out     = layout.output_file(&format!("{}_summary.txt", file_key(path)));
            write_text(&out, &summary)?;
            log.line(format!("Summary saved to {}", out.display()))?;
            Ok(out)
        })?;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!("Batch inspection: {} ok, {} failed", outcomes.len() - failed, failed);
        Ok(outcomes)
    }
}

/// `*.csv` and `*.feather` files directly inside `dir`, sorted by name
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Cannot read '{}'", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| INPUT_EXTENSIONS.contains(&e))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Pick the reader for one input file, with the columns it reports on
pub fn source_for(path: &Path, cfg: &ProjectConfig) -> Result<(Box<dyn RecordSource>, Vec<Column>)> {
    if path.extension().is_some_and(|e| e == "feather") {
        return Ok((Box::new(FeatherStore::new(path)), Column::ALL.to_vec()));
    }
    if has_header_row(path)? {
        Ok((Box::new(CsvRecordSource::with_header(path)), Column::ALL.to_vec()))
    } else {
        Ok((Box::new(CsvRecordSource::raw(path, &cfg.raw_columns)), raw_columns(cfg)))
    }
}

fn has_header_row(path: &Path) -> Result<bool> {
    let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    Ok(first.split(',').any(|field| field.trim().trim_matches('"') == "mmsi"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `trips.csv` → `trips_csv`
fn file_key(path: &Path) -> String {
    file_name(path).replace('.', "_")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::write_records_csv;
    use crate::domain::record::AisRecord;

    fn use_case(root: &Path) -> BatchInspectUseCase {
        let cfg = ProjectConfig { root: root.to_path_buf(), workers: 2, ..Default::default() };
        BatchInspectUseCase::new(
            cfg,
            PathBuf::from("inbox"),
            PipelineId(1),
            ScriptId::new(5, "batch_inspection").unwrap(),
        )
    }

    #[test]
    fn test_batch_inspects_each_format() {
        let tmp   = tempfile::tempdir().unwrap();
        let inbox = tmp.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();

        fs::write(inbox.join("a_raw.csv"), "1,111,2024-01-01 00:00:00,10.0,59.0\n").unwrap();
        let r = AisRecord { mmsi: Some(7), ..Default::default() };
        write_records_csv(&inbox.join("b_table.csv"), &[r.clone(), r.clone()]).unwrap();
        FeatherStore::new(inbox.join("c.feather")).save(&[r]).unwrap();
        fs::write(inbox.join("notes.txt"), "ignored").unwrap();

        let outcomes = use_case(tmp.path()).execute().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let out = tmp.path().join("output/P1/p5_batch_inspection");
        let b = fs::read_to_string(out.join("P1_p5_b_table_csv_summary.txt")).unwrap();
        assert!(b.contains("Rows: 2"));
        assert!(out.join("P1_p5_a_raw_csv_summary.txt").exists());
        assert!(out.join("P1_p5_c_feather_summary.txt").exists());
        assert!(tmp.path().join("logs/P1/p5_batch_inspection/c.feather.log").exists());
    }

    #[test]
    fn test_same_stem_files_keep_separate_outputs() {
        let tmp   = tempfile::tempdir().unwrap();
        let inbox = tmp.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();

        let r = AisRecord { mmsi: Some(7), ..Default::default() };
        write_records_csv(&inbox.join("trips.csv"), &[r.clone(), r.clone(), r.clone()]).unwrap();
        FeatherStore::new(inbox.join("trips.feather")).save(&[r]).unwrap();

        let outcomes = use_case(tmp.path()).execute().unwrap();
        assert_eq!(outcomes.len(), 2);
        let summaries: Vec<&PathBuf> =
            outcomes.iter().map(|o| o.result.as_ref().unwrap()).collect();
        assert_ne!(summaries[0], summaries[1]);

        let out = tmp.path().join("output/P1/p5_batch_inspection");
        let csv     = fs::read_to_string(out.join("P1_p5_trips_csv_summary.txt")).unwrap();
        let feather = fs::read_to_string(out.join("P1_p5_trips_feather_summary.txt")).unwrap();
        assert!(csv.contains("Rows: 3"));
        assert!(feather.contains("Rows: 1"));

        let logs = tmp.path().join("logs/P1/p5_batch_inspection");
        assert!(logs.join("trips.csv.log").exists());
        assert!(logs.join("trips.feather.log").exists());
    }

    #[test]
    fn test_broken_file_does_not_stop_batch() {
        let tmp   = tempfile::tempdir().unwrap();
        let inbox = tmp.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        fs::write(inbox.join("bad.feather"), "not arrow").unwrap();
        fs::write(inbox.join("good.csv"), "1,111\n").unwrap();

        let outcomes = use_case(tmp.path()).execute().unwrap();
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].is_ok());
    }
}
