use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Severity;

/// Events emitted while a merge runs.
#[derive(Debug, Clone)]
pub enum MergeEvent {
    RunStarted { input_dir: PathBuf },
    TemplateAnalyzed {
        template: PathBuf,
        sources: usize,
        columns: usize,
        cached_styles: usize,
    },
    SourceStarted { index: usize, path: PathBuf },
    SourceFinished { index: usize, rows: u64 },
    PartOpened { part: u32 },
    PartSaved { part: u32, path: PathBuf, rows: u64 },
    RunFailed { severity: Severity, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: MergeMetricsSnapshot,
    },
}

/// Observer hook for merge events.
///
/// Called from producer threads as well as the writer, so implementations must be thread-safe.
pub trait MergeObserver: Send + Sync {
    fn on_event(&self, event: &MergeEvent);
}

/// Logs every event to stderr.
#[derive(Debug, Default)]
pub struct StdErrMergeObserver;

impl MergeObserver for StdErrMergeObserver {
    fn on_event(&self, event: &MergeEvent) {
        match event {
            MergeEvent::RunFailed { severity, error } => {
                eprintln!("[merge][{severity:?}] {error}");
            }
            other => eprintln!("[merge] {other:?}"),
        }
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileMergeObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMergeObserver {
    /// Writes are best-effort; failures to open or write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }
}

impl MergeObserver for FileMergeObserver {
    fn on_event(&self, event: &MergeEvent) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {event:?}", unix_ts());
        }
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Fans events out to several observers.
#[derive(Default)]
pub struct CompositeMergeObserver {
    observers: Vec<Arc<dyn MergeObserver>>,
}

impl CompositeMergeObserver {
    pub fn new(observers: Vec<Arc<dyn MergeObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeMergeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeMergeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl MergeObserver for CompositeMergeObserver {
    fn on_event(&self, event: &MergeEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Real-time counters for a merge run.
///
/// Producers and the writer update these while the run is in flight; callers can snapshot them
/// at any time.
#[derive(Debug)]
pub struct MergeMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_produced: AtomicU64,
    rows_written: AtomicU64,
    sources_started: AtomicU64,
    sources_finished: AtomicU64,
    parts_saved: AtomicU64,
    backpressure_wait_ns: AtomicU64,

    active_producers: AtomicUsize,
    max_active_producers: AtomicUsize,
}

impl MergeMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_produced: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            sources_started: AtomicU64::new(0),
            sources_finished: AtomicU64::new(0),
            parts_saved: AtomicU64::new(0),
            backpressure_wait_ns: AtomicU64::new(0),
            active_producers: AtomicUsize::new(0),
            max_active_producers: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rows_produced.store(0, Ordering::SeqCst);
        self.rows_written.store(0, Ordering::SeqCst);
        self.sources_started.store(0, Ordering::SeqCst);
        self.sources_finished.store(0, Ordering::SeqCst);
        self.parts_saved.store(0, Ordering::SeqCst);
        self.backpressure_wait_ns.store(0, Ordering::SeqCst);
        self.active_producers.store(0, Ordering::SeqCst);
        self.max_active_producers.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_source_start(&self) {
        let _ = self.sources_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_producers.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_producers, now);
    }

    /// Called whenever a producer leaves a source it started, successfully or not.
    pub fn on_source_exit(&self, finished: bool) {
        if finished {
            let _ = self.sources_finished.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.active_producers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_row_produced(&self) {
        let _ = self.rows_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_row_written(&self) {
        let _ = self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_part_saved(&self) {
        let _ = self.parts_saved.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_backpressure_wait(&self, d: Duration) {
        let _ = self
            .backpressure_wait_ns
            .fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MergeMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        MergeMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            rows_produced: self.rows_produced.load(Ordering::SeqCst),
            rows_written: self.rows_written.load(Ordering::SeqCst),
            sources_started: self.sources_started.load(Ordering::SeqCst),
            sources_finished: self.sources_finished.load(Ordering::SeqCst),
            parts_saved: self.parts_saved.load(Ordering::SeqCst),
            backpressure_wait: Duration::from_nanos(self.backpressure_wait_ns.load(Ordering::SeqCst)),
            max_active_producers: self.max_active_producers.load(Ordering::SeqCst),
        }
    }
}

impl Default for MergeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`MergeMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_produced: u64,
    pub rows_written: u64,
    pub sources_started: u64,
    pub sources_finished: u64,
    pub parts_saved: u64,
    pub backpressure_wait: Duration,
    pub max_active_producers: usize,
}

impl fmt::Display for MergeMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows={}/{}, sources={}/{}, parts={}, max_active_producers={}, backpressure_wait={:?}, elapsed={:?}",
            self.run_id,
            self.rows_written,
            self.rows_produced,
            self.sources_finished,
            self.sources_started,
            self.parts_saved,
            self.max_active_producers,
            self.backpressure_wait,
            self.elapsed
        )
    }
}
