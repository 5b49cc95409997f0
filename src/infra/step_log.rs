// ============================================================
// Layer 6 — Step Log
// ============================================================
// Each script keeps a log file under logs/P{N}/p{n}_{name}/ so a
// run can be inspected afterwards. Anything a step would print
// to the console goes through StepLog::line instead:
//
//   - the line is appended to the step's log file
//   - the same line is emitted as a `step_log` tracing event
//
// StepLog::writer hands out a cloneable io::Write handle on the
// same file. The parallel workers install a tracing subscriber
// on it while a job runs, so every event the job emits lands in
// that file too. The `step_log` target is filtered out there,
// otherwise explicit lines would be written twice.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §15 (Drop)

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing_subscriber::fmt::MakeWriter;

pub const TARGET: &str = "step_log";

type Shared = Arc<Mutex<BufWriter<File>>>;

fn lock(shared: &Shared) -> MutexGuard<'_, BufWriter<File>> {
    // a poisoned lock only means a writer panicked mid-line
    shared.lock().unwrap_or_else(|p| p.into_inner())
}

pub struct StepLog {
    path:   PathBuf,
    writer: Shared,
}

impl StepLog {
    /// Start a fresh log, truncating any previous run's file
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create log directory '{}'", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Cannot create log file '{}'", path.display()))?;
        tracing::debug!("Opened step log '{}'", path.display());
        Ok(Self { path, writer: Arc::new(Mutex::new(BufWriter::new(file))) })
    }

    /// Write one line to the file and mirror it to tracing
    pub fn line(&mut self, msg: impl AsRef<str>) -> Result<()> {
        let msg = msg.as_ref();
        writeln!(lock(&self.writer), "{msg}")
            .with_context(|| format!("Cannot write to '{}'", self.path.display()))?;
        tracing::info!(target: TARGET, "{msg}");
        Ok(())
    }

    /// Handle for a tracing fmt layer that should write into this log
    pub fn writer(&self) -> LogWriter {
        LogWriter(Arc::clone(&self.writer))
    }

    pub fn flush(&mut self) -> Result<()> {
        lock(&self.writer)
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.path.display()))
    }
}

impl Drop for StepLog {
    fn drop(&mut self) {
        // Errors here have nowhere to go; explicit flush() reports them
        let _ = lock(&self.writer).flush();
    }
}

// ─── Writer handle ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LogWriter(Shared);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.0).flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
