// ============================================================
// Layer 6 — Parallel Per-File Workers
// ============================================================
// Runs the same job over many input files on a rayon pool:
//
//   files ──► ThreadPool(N).install(par_iter) ──► outcomes
//
// Every job gets a StepLog at log_dir/<file_name>.log. While the
// job runs, a tracing subscriber scoped to that thread writes
// every event the job emits into the same file, so nothing a
// worker prints reaches the shared console. The process-wide
// subscriber is back in place as soon as the job returns.
//
// Outcomes come back in input order. A failing or panicking
// job only affects its own file.
//
// Reference: rayon::ThreadPoolBuilder, tracing::subscriber::with_default

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

use crate::infra::step_log::{self, StepLog};

pub const DEFAULT_WORKERS: usize = 24;

/// Result of one file's job
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path:   PathBuf,
    pub result: Result<T>,
}

impl<T> FileOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Clamp the requested worker count to [1, n_files]
pub fn effective_workers(requested: usize, n_files: usize) -> usize {
    requested.max(1).min(n_files.max(1))
}

/// Full file name, extension included, so `a.csv` and `a.feather` never share a log
pub fn log_path_for(log_dir: &Path, file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    log_dir.join(format!("{name}.log"))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_one<T, F>(file: &Path, log_dir: &Path, job: &F) -> Result<T>
where
    F: Fn(&Path, &mut StepLog) -> Result<T>,
{
    let mut log = StepLog::create(log_path_for(log_dir, file))?;

    // StepLog::line already writes its own text; drop its mirror event here
    let capture = tracing_subscriber::fmt()
        .with_writer(log.writer())
        .with_env_filter(EnvFilter::new(format!("info,{}=off", step_log::TARGET)))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();

    let result = tracing::subscriber::with_default(capture, || {
        panic::catch_unwind(AssertUnwindSafe(|| job(file, &mut log)))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!("worker panicked: {}", panic_message(payload.as_ref())))
            })
    });
    if let Err(e) = &result {
        // best effort: the error is still returned in the outcome
        let _ = log.line(format!("ERROR: {e:#}"));
    }
    log.flush()?;
    result
}

/// Run `job` for every file on up to `workers` pool threads
pub fn process_files_parallel<T, F>(
    files:   &[PathBuf],
    workers: usize,
    log_dir: &Path,
    job:     F,
) -> Result<Vec<FileOutcome<T>>>
where
    T: Send,
    F: Fn(&Path, &mut StepLog) -> Result<T> + Sync,
{
    if files.is_empty() {
        return Ok(Vec::new());
    }
    let n_workers = effective_workers(workers, files.len());
    tracing::info!("Processing {} files with {} workers", files.len(), n_workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .thread_name(|i| format!("file-worker-{i}"))
        .build()
        .context("Cannot start the worker pool")?;

    let outcomes: Vec<FileOutcome<T>> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let result = run_one(file, log_dir, &job);
                match &result {
                    Ok(_)  => tracing::debug!("Finished '{}'", file.display()),
                    Err(e) => tracing::warn!("Failed '{}': {:#}", file.display(), e),
                }
                FileOutcome { path: file.clone(), result }
            })
            .collect()
    });
    Ok(outcomes)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("in/file_{i}.csv"))).collect()
    }

    #[test]
    fn test_effective_workers_clamped() {
        assert_eq!(effective_workers(0, 5), 1);
        assert_eq!(effective_workers(24, 3), 3);
        assert_eq!(effective_workers(2, 10), 2);
        assert_eq!(effective_workers(8, 0), 1);
    }

    #[test]
    fn test_outcomes_in_input_order() {
        let tmp   = tempfile::tempdir().unwrap();
        let input = files(10);
        let out = process_files_parallel(&input, 4, tmp.path(), |path, log| {
            log.line(format!("processing {}", path.display()))?;
            Ok(path.file_stem().unwrap().to_string_lossy().into_owned())
        })
        .unwrap();

        assert_eq!(out.len(), 10);
        for (i, o) in out.iter().enumerate() {
            assert_eq!(o.path, input[i]);
            assert_eq!(o.result.as_ref().unwrap(), &format!("file_{i}"));
        }
    }

    #[test]
    fn test_each_file_gets_its_own_log() {
        let tmp = tempfile::tempdir().unwrap();
        process_files_parallel(&files(3), 3, tmp.path(), |path, log| {
            log.line(format!("only {}", path.display()))
        })
        .unwrap();

        for i in 0..3 {
            let text = fs::read_to_string(tmp.path().join(format!("file_{i}.csv.log"))).unwrap();
            assert_eq!(text.lines().count(), 1);
            assert!(text.contains(&format!("file_{i}.csv")));
        }
    }

    #[test]
    fn test_same_stem_different_extension_keeps_two_logs() {
        let tmp   = tempfile::tempdir().unwrap();
        let input = vec![PathBuf::from("in/trips.csv"), PathBuf::from("in/trips.feather")];
        process_files_parallel(&input, 2, tmp.path(), |path, log| {
            log.line(format!("from {}", path.display()))
        })
        .unwrap();

        let csv     = fs::read_to_string(tmp.path().join("trips.csv.log")).unwrap();
        let feather = fs::read_to_string(tmp.path().join("trips.feather.log")).unwrap();
        assert_eq!(csv, "from in/trips.csv\n");
        assert_eq!(feather, "from in/trips.feather\n");
    }

    #[test]
    fn test_job_tracing_events_land_in_its_log() {
        let tmp = tempfile::tempdir().unwrap();
        process_files_parallel(&files(1), 1, tmp.path(), |_path, log| {
            tracing::info!("message from inside the job");
            tracing::debug!("too verbose for the file");
            log.line("explicit line")
        })
        .unwrap();

        let text = fs::read_to_string(tmp.path().join("file_0.csv.log")).unwrap();
        assert!(text.contains("message from inside the job"));
        assert!(!text.contains("too verbose"));
        assert_eq!(text.matches("explicit line").count(), 1);
    }

    #[test]
    fn test_failures_and_panics_are_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let out = process_files_parallel(&files(3), 2, tmp.path(), |path, _log| {
            let name = path.file_stem().unwrap().to_string_lossy().into_owned();
            match name.as_str() {
                "file_0" => anyhow::bail!("bad input"),
                "file_1" => panic!("boom"),
                _        => Ok(1),
            }
        })
        .unwrap();

        assert!(out[0].result.as_ref().unwrap_err().to_string().contains("bad input"));
        assert!(out[1].result.as_ref().unwrap_err().to_string().contains("boom"));
        assert!(out[2].is_ok());

        let log0 = fs::read_to_string(tmp.path().join("file_0.csv.log")).unwrap();
        assert!(log0.contains("ERROR: bad input"));
    }

    #[test]
    fn test_no_files_no_work() {
        let tmp = tempfile::tempdir().unwrap();
        let out: Vec<FileOutcome<()>> =
            process_files_parallel(&[], 4, tmp.path(), |_, _| Ok(())).unwrap();
        assert!(out.is_empty());
    }
}
