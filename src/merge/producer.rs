//! Producer side of the pipeline: each worker claims the next unclaimed source, converts its
//! first sheet row by row and pushes the rows into that source's bounded queue.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::cancel::AbortSignal;
use super::observer::{MergeEvent, MergeMetrics, MergeObserver};
use crate::convert::RowConverter;
use crate::error::{MergeError, MergeResult};
use crate::schema::ColumnSchema;
use crate::style_cache::StyleCache;
use crate::types::{RowPayload, Source};
use crate::xlsx::{WorkbookError, WorkbookReader};

/// A claimable unit of work: one source plus the sending half of its queue.
///
/// Dropping the job closes the queue, which is how the writer learns the source is done.
pub(crate) struct SourceJob {
    pub source: Source,
    pub queue: Sender<RowPayload>,
}

/// Read-only state shared by every producer.
pub(crate) struct ProducerContext<'a> {
    pub schema: &'a ColumnSchema,
    pub cache: &'a StyleCache,
    pub use_template: bool,
    pub has_headers: bool,
    pub add_source_column: bool,
    pub signal: &'a AbortSignal,
    pub metrics: &'a MergeMetrics,
    pub observer: Option<&'a Arc<dyn MergeObserver>>,
}

impl ProducerContext<'_> {
    fn emit(&self, event: MergeEvent) {
        if let Some(obs) = self.observer {
            obs.on_event(&event);
        }
    }
}

/// Worker loop: claim jobs until the job queue is empty or the run is cancelled.
pub(crate) fn run_worker(ctx: &ProducerContext<'_>, jobs: &Receiver<SourceJob>) {
    while !ctx.signal.is_cancelled() {
        let Ok(job) = jobs.try_recv() else {
            return;
        };
        if let Err(err) = produce_source(ctx, &job) {
            // record before `job` drops and closes the queue, so the writer sees the failure
            ctx.signal.fail(err);
            return;
        }
    }
}

/// Convert every row of `job.source` and enqueue it. Returns the number of rows enqueued.
pub(crate) fn produce_source(ctx: &ProducerContext<'_>, job: &SourceJob) -> MergeResult<u64> {
    ctx.signal.check()?;
    let source = &job.source;
    ctx.emit(MergeEvent::SourceStarted {
        index: source.index,
        path: source.path.clone(),
    });
    ctx.metrics.on_source_start();

    let result = read_source(ctx, job);
    ctx.metrics.on_source_exit(result.is_ok());
    if let Ok(rows) = result {
        ctx.emit(MergeEvent::SourceFinished {
            index: source.index,
            rows,
        });
    }
    result
}

fn read_source(ctx: &ProducerContext<'_>, job: &SourceJob) -> MergeResult<u64> {
    let source = &job.source;
    let read_err = |err: WorkbookError| MergeError::SourceRead {
        path: source.path.clone(),
        source: err,
    };

    let mut reader = WorkbookReader::open(&source.path).map_err(read_err)?;
    if reader.sheet_count() == 0 {
        return Ok(0);
    }

    let styles = reader.styles();
    let file_name = source.file_name();
    let mut converter = RowConverter::new(ctx.schema, ctx.cache, &styles, ctx.use_template);
    if ctx.add_source_column {
        converter = converter.with_source_tag(&file_name);
    }

    let mut rows = 0u64;
    let stopped = reader
        .for_each_row(0, |row| {
            if ctx.has_headers && row.number == 1 {
                return ControlFlow::Continue(());
            }
            let payload = RowPayload {
                source_index: source.index,
                cells: converter.convert_row(&row),
                height: row.height,
            };
            match enqueue(ctx, &job.queue, payload) {
                Ok(()) => {
                    rows += 1;
                    ControlFlow::Continue(())
                }
                Err(err) => ControlFlow::Break(err),
            }
        })
        .map_err(read_err)?;

    match stopped {
        Some(err) => Err(err),
        None => Ok(rows),
    }
}

/// Push one row, blocking while the queue is full.
///
/// Fails with `Cancelled` once the run is cancelled or the writer has gone away.
fn enqueue(ctx: &ProducerContext<'_>, queue: &Sender<RowPayload>, payload: RowPayload) -> MergeResult<()> {
    ctx.signal.check()?;
    match queue.try_send(payload) {
        Ok(()) => {}
        Err(TrySendError::Full(payload)) => {
            let started = Instant::now();
            queue.send(payload).map_err(|_| MergeError::Cancelled)?;
            ctx.metrics.on_backpressure_wait(started.elapsed());
        }
        Err(TrySendError::Disconnected(_)) => return Err(MergeError::Cancelled),
    }
    ctx.metrics.on_row_produced();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::thread;

    use crossbeam_channel::{bounded, unbounded};

    use super::{ProducerContext, SourceJob, run_worker};
    use crate::error::MergeError;
    use crate::merge::cancel::AbortSignal;
    use crate::merge::observer::MergeMetrics;
    use crate::schema::ColumnSchema;
    use crate::style_cache::StyleCache;
    use crate::types::Source;

    #[test]
    fn unreadable_source_fails_the_run_and_closes_its_queue() {
        let schema = ColumnSchema::new(Vec::new(), None);
        let cache = StyleCache::new();
        let signal = AbortSignal::new();
        let metrics = MergeMetrics::new();
        let ctx = ProducerContext {
            schema: &schema,
            cache: &cache,
            use_template: false,
            has_headers: false,
            add_source_column: false,
            signal: &signal,
            metrics: &metrics,
            observer: None,
        };

        let (jobs_tx, jobs_rx) = unbounded();
        let mut queues = Vec::new();
        for index in 0..2 {
            let (tx, rx) = bounded(4);
            queues.push(rx);
            jobs_tx
                .send(SourceJob {
                    source: Source::new(index, PathBuf::from(format!("/definitely/missing/{index}.xlsx"))),
                    queue: tx,
                })
                .unwrap();
        }
        drop(jobs_tx);

        thread::scope(|s| {
            s.spawn(|| run_worker(&ctx, &jobs_rx));
        });

        assert!(signal.is_cancelled());
        assert!(matches!(signal.take_error(), Some(MergeError::SourceRead { .. })));
        // the failed source's queue is closed; the second job was never claimed
        assert!(queues[0].recv().is_err());
        assert_eq!(jobs_rx.len(), 1);
        assert_eq!(metrics.snapshot().sources_started, 1);
        assert_eq!(metrics.snapshot().sources_finished, 0);
    }
}
