//! Merge engine: discovery, template analysis, the parallel producer pool and the sequential
//! writer, wired together around one [`AbortSignal`].
//!
//! - One bounded queue per source connects its producer to the writer.
//! - Producers (a rayon pool of `workers` threads) claim sources in ordinal order.
//! - The writer runs on the calling thread and drains queues strictly in ordinal order, so the
//!   output is source-major, row-order-minor regardless of which producer finishes first.
//! - Real-time metrics and observer hooks report progress.

mod cancel;
mod observer;
mod producer;
mod writer;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded};
use rayon::ThreadPoolBuilder;

use crate::config::MergeOptions;
use crate::discovery::{discover_sources, remove_stale_parts, select_template};
use crate::error::{MergeError, MergeResult};
use crate::schema::{TemplateAnalysis, analyze_template};
use crate::types::Source;
use crate::xlsx::{FormatPalette, XlsxPartFactory};

pub use cancel::AbortSignal;
pub use observer::{
    CompositeMergeObserver, FileMergeObserver, MergeEvent, MergeMetrics, MergeMetricsSnapshot, MergeObserver,
    StdErrMergeObserver,
};
pub use writer::{HeaderRow, PartFactory, PartSink, PartitionSummary, Partitioner, drain_sources};

use producer::{ProducerContext, SourceJob, run_worker};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// Part paths in creation order.
    pub output_files: Vec<PathBuf>,
    /// Data rows written across all parts (header rows excluded).
    pub row_count: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// Runs merges with the given options.
pub struct MergeEngine {
    options: MergeOptions,
    observer: Option<Arc<dyn MergeObserver>>,
    metrics: Arc<MergeMetrics>,
}

impl MergeEngine {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            observer: None,
            metrics: Arc::new(MergeMetrics::new()),
        }
    }

    /// Attach an observer for merge events.
    pub fn with_observer(mut self, observer: Arc<dyn MergeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handle to real-time metrics; stays valid across runs.
    pub fn metrics(&self) -> Arc<MergeMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Run one merge. The first failure anywhere in the pipeline is the error returned.
    pub fn run(&self) -> MergeResult<MergeReport> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(MergeEvent::RunStarted {
            input_dir: self.options.input_dir.clone(),
        });

        let result = self.run_inner();
        let elapsed = start.elapsed();
        self.metrics.end_run(elapsed);

        match result {
            Ok(summary) => {
                self.emit(MergeEvent::RunFinished {
                    elapsed,
                    metrics: self.metrics.snapshot(),
                });
                Ok(MergeReport {
                    output_files: summary.parts,
                    row_count: summary.total_rows,
                    elapsed,
                })
            }
            Err(err) => {
                self.emit(MergeEvent::RunFailed {
                    severity: err.severity(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn run_inner(&self) -> MergeResult<PartitionSummary> {
        let options = self.options.clone().normalized();
        options.validate()?;

        remove_stale_parts(&options.output_path)?;

        let sources = discover_sources(&options.input_dir)?;
        let template = select_template(&sources, options.template_path.as_deref())?;
        let analysis = analyze_template(&template, &options)?;
        self.emit(MergeEvent::TemplateAnalyzed {
            template: analysis.template.clone(),
            sources: sources.len(),
            columns: analysis.schema.len(),
            cached_styles: analysis.style_cache.len(),
        });

        let factory = XlsxPartFactory::new(
            FormatPalette::from_styles(&analysis.styles),
            analysis.column_widths.clone(),
        );
        let header = (options.has_headers && !analysis.schema.is_empty()).then(|| HeaderRow {
            cells: analysis.schema.header_cells(),
            height: analysis.schema.header_height(),
        });
        let partitioner = Partitioner::new(
            factory,
            &options.output_path,
            header,
            options.max_rows_per_part,
        )
        .with_hooks(Arc::clone(&self.metrics), self.observer.clone());

        self.run_pipeline(&options, sources, &analysis, partitioner)
    }

    /// Producers on the rayon pool, the writer on this thread.
    fn run_pipeline<F: PartFactory>(
        &self,
        options: &MergeOptions,
        sources: Vec<Source>,
        analysis: &TemplateAnalysis,
        mut partitioner: Partitioner<F>,
    ) -> MergeResult<PartitionSummary> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|i| format!("xlsx-merge-producer-{i}"))
            .build()
            .map_err(|e| MergeError::Config {
                message: format!("failed to build producer pool: {e}"),
            })?;

        let signal = AbortSignal::new();
        let (jobs_tx, jobs_rx) = unbounded::<SourceJob>();
        let mut queues = Vec::with_capacity(sources.len());
        for source in sources {
            let (queue, rx) = bounded(options.queue_capacity);
            queues.push(rx);
            // the receiver outlives this loop, so sending cannot fail
            let _ = jobs_tx.send(SourceJob { source, queue });
        }
        drop(jobs_tx);

        let ctx = ProducerContext {
            schema: &analysis.schema,
            cache: &analysis.style_cache,
            use_template: options.uses_explicit_template(),
            has_headers: options.has_headers,
            add_source_column: options.add_source_column,
            signal: &signal,
            metrics: &self.metrics,
            observer: self.observer.as_ref(),
        };

        thread::scope(|s| {
            s.spawn(|| {
                pool.scope(|ps| {
                    for _ in 0..options.workers {
                        ps.spawn(|_| run_worker(&ctx, &jobs_rx));
                    }
                });
                // close the queues of sources no producer claimed
                while jobs_rx.try_recv().is_ok() {}
            });

            let written = partitioner
                .open_first_part()
                .and_then(|()| drain_sources(&mut partitioner, queues, &signal));
            if let Err(err) = written {
                signal.fail(err);
            }
        });

        if let Some(err) = signal.take_error() {
            return Err(err);
        }
        if signal.is_cancelled() {
            return Err(MergeError::Cancelled);
        }
        partitioner.finish()
    }

    fn emit(&self, event: MergeEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Merge with `options` and no observer.
pub fn merge_directory(options: &MergeOptions) -> MergeResult<MergeReport> {
    MergeEngine::new(options.clone()).run()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{MergeEngine, MergeEvent, MergeObserver};
    use crate::config::MergeOptions;
    use crate::error::MergeError;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<MergeEvent>>);

    impl MergeObserver for Recorder {
        fn on_event(&self, event: &MergeEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn invalid_options_report_a_failed_run() {
        let recorder = Arc::new(Recorder::default());
        let engine = MergeEngine::new(MergeOptions::new("/definitely/not/here/xlsx-merge"))
            .with_observer(recorder.clone());

        let err = engine.run().unwrap_err();
        assert!(matches!(err, MergeError::Config { .. }));

        let events = recorder.0.lock().unwrap();
        assert!(matches!(events.first(), Some(MergeEvent::RunStarted { .. })));
        assert!(matches!(events.last(), Some(MergeEvent::RunFailed { .. })));
        assert_eq!(engine.metrics().snapshot().run_id, 1);
    }
}
