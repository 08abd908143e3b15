use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::database::LoadResult;

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (e.g. the source vanished before loading).
    Warning,
    /// The load was rejected.
    Error,
    /// Rejected because of an infrastructure failure (I/O, storage, no engine).
    Critical,
}

/// Context about a load attempt.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// The source file path.
    pub path: PathBuf,
    /// Target table.
    pub table: String,
    /// Format from the document, if it resolved.
    pub format: Option<SourceFormat>,
}

/// Minimal stats reported on a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Number of inserted rows.
    pub rows: usize,
}

/// Observer interface for load outcomes.
///
/// The loader itself never prints; attach an observer to record logs, metrics or alerts.
pub trait LoadObserver: Send + Sync {
    /// Called when a file was committed.
    fn on_success(&self, _ctx: &LoadContext, _stats: LoadStats) {}

    /// Called when a load was rejected.
    fn on_rejected(&self, _ctx: &LoadContext, _severity: LoadSeverity, _result: &LoadResult) {}

    /// Called when the source file no longer existed.
    fn on_deleted(&self, _ctx: &LoadContext) {}

    /// Called when a rejection meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_rejected`].
    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        self.on_rejected(ctx, severity, result)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl LoadObserver for CompositeObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_rejected(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        for o in &self.observers {
            o.on_rejected(ctx, severity, result);
        }
    }

    fn on_deleted(&self, ctx: &LoadContext) {
        for o in &self.observers {
            o.on_deleted(ctx);
        }
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        for o in &self.observers {
            o.on_alert(ctx, severity, result);
        }
    }
}

/// Emits load events as structured `tracing` events (target `datafile_loader::load`).
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        tracing::info!(
            target: "datafile_loader::load",
            table = %ctx.table,
            path = %ctx.path.display(),
            rows = stats.rows,
            "file loaded"
        );
    }

    fn on_rejected(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        tracing::warn!(
            target: "datafile_loader::load",
            table = %ctx.table,
            path = %ctx.path.display(),
            severity = ?severity,
            errors = result.errors.len(),
            exceptions = result.exceptions.len(),
            "file rejected"
        );
        for finding in &result.errors {
            tracing::debug!(target: "datafile_loader::load", %finding, "validation finding");
        }
        for error in &result.exceptions {
            tracing::debug!(target: "datafile_loader::load", %error, "load exception");
        }
    }

    fn on_deleted(&self, ctx: &LoadContext) {
        tracing::info!(
            target: "datafile_loader::load",
            table = %ctx.table,
            path = %ctx.path.display(),
            "source file deleted before load"
        );
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        tracing::error!(
            target: "datafile_loader::load",
            table = %ctx.table,
            path = %ctx.path.display(),
            severity = ?severity,
            report = %result.report(&ctx.path),
            "load alert"
        );
    }
}

/// Appends load events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl LoadObserver for FileObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        self.append_line(&format!(
            "{} ok table={} path={} rows={}",
            unix_ts(),
            ctx.table,
            ctx.path.display(),
            stats.rows
        ));
    }

    fn on_rejected(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        self.append_line(&format!(
            "{} rejected severity={:?} table={} path={} errors={} exceptions={}",
            unix_ts(),
            severity,
            ctx.table,
            ctx.path.display(),
            result.errors.len(),
            result.exceptions.len()
        ));
    }

    fn on_deleted(&self, ctx: &LoadContext) {
        self.append_line(&format!(
            "{} deleted table={} path={}",
            unix_ts(),
            ctx.table,
            ctx.path.display()
        ));
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        self.append_line(&format!(
            "{} ALERT severity={:?} table={} path={} errors={} exceptions={}",
            unix_ts(),
            severity,
            ctx.table,
            ctx.path.display(),
            result.errors.len(),
            result.exceptions.len()
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
