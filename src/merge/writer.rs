//! Sequential writer: drains the per-source queues in ordinal order and splits the output into
//! parts of at most `cap` data rows.
//!
//! All part state (current part, part number, row counters) lives on the [`Partitioner`], which
//! is owned by the single writer; nothing here is shared with producers except the queues.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;

use super::cancel::AbortSignal;
use super::observer::{MergeEvent, MergeMetrics, MergeObserver};
use crate::discovery::part_path;
use crate::error::MergeResult;
use crate::types::{OutputCell, RowPayload};

/// An open output part.
pub trait PartSink {
    /// Write `cells` starting at column A of 0-based sheet row `row`.
    fn write_row(&mut self, row: u32, cells: &[OutputCell], height: Option<f64>) -> MergeResult<()>;

    /// Flush and persist the part to `path`, consuming it.
    fn save(self, path: &Path) -> MergeResult<()>;
}

/// Creates output parts.
pub trait PartFactory {
    type Part: PartSink;

    fn open_part(&mut self, part_number: u32) -> MergeResult<Self::Part>;
}

/// Header row repeated at the top of every part.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    pub cells: Vec<OutputCell>,
    pub height: Option<f64>,
}

/// Outcome of a completed write phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Saved part paths in creation order.
    pub parts: Vec<PathBuf>,
    /// Data rows written across all parts (header rows excluded).
    pub total_rows: u64,
}

pub struct Partitioner<F: PartFactory> {
    factory: F,
    output_path: PathBuf,
    header: Option<HeaderRow>,
    cap: Option<u64>,

    current: Option<F::Part>,
    part_number: u32,
    part_rows: u64,
    next_row: u32,
    total_rows: u64,
    parts: Vec<PathBuf>,

    metrics: Option<Arc<MergeMetrics>>,
    observer: Option<Arc<dyn MergeObserver>>,
}

impl<F: PartFactory> Partitioner<F> {
    /// `cap` limits data rows per part; `None` (or `Some(0)`) writes a single part.
    pub fn new(
        factory: F,
        output_path: impl Into<PathBuf>,
        header: Option<HeaderRow>,
        cap: Option<u64>,
    ) -> Self {
        Self {
            factory,
            output_path: output_path.into(),
            header,
            cap: cap.filter(|&c| c > 0),
            current: None,
            part_number: 0,
            part_rows: 0,
            next_row: 0,
            total_rows: 0,
            parts: Vec::new(),
            metrics: None,
            observer: None,
        }
    }

    pub fn with_hooks(
        mut self,
        metrics: Arc<MergeMetrics>,
        observer: Option<Arc<dyn MergeObserver>>,
    ) -> Self {
        self.metrics = Some(metrics);
        self.observer = observer;
        self
    }

    /// Open part 1 up front, so setup failures surface before any producer starts.
    pub fn open_first_part(&mut self) -> MergeResult<()> {
        if self.current.is_none() {
            self.open_next()?;
        }
        Ok(())
    }

    /// Append one data row, rolling over to a new part first when the current one is full.
    pub fn write(&mut self, payload: &RowPayload) -> MergeResult<()> {
        if self.current.is_none() {
            self.open_next()?;
        } else if self.cap.is_some_and(|cap| self.part_rows >= cap) {
            self.close_current()?;
            self.open_next()?;
        }

        let row = self.next_row;
        if let Some(part) = self.current.as_mut() {
            part.write_row(row, &payload.cells, payload.height)?;
        }
        self.next_row += 1;
        self.part_rows += 1;
        self.total_rows += 1;
        if let Some(m) = &self.metrics {
            m.on_row_written();
        }
        Ok(())
    }

    /// Save the last part (part 1 is saved even when no rows were written).
    pub fn finish(mut self) -> MergeResult<PartitionSummary> {
        if self.current.is_none() {
            self.open_next()?;
        }
        self.close_current()?;
        Ok(PartitionSummary {
            parts: self.parts,
            total_rows: self.total_rows,
        })
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    fn open_next(&mut self) -> MergeResult<()> {
        let number = self.part_number + 1;
        let mut part = self.factory.open_part(number)?;
        self.part_number = number;
        self.part_rows = 0;
        self.next_row = 0;
        self.emit(MergeEvent::PartOpened { part: number });

        if let Some(header) = &self.header {
            part.write_row(0, &header.cells, header.height)?;
            self.next_row = 1;
        }
        self.current = Some(part);
        Ok(())
    }

    fn close_current(&mut self) -> MergeResult<()> {
        let Some(part) = self.current.take() else {
            return Ok(());
        };
        let path = part_path(&self.output_path, self.part_number);
        part.save(&path)?;
        if let Some(m) = &self.metrics {
            m.on_part_saved();
        }
        self.emit(MergeEvent::PartSaved {
            part: self.part_number,
            path: path.clone(),
            rows: self.part_rows,
        });
        self.parts.push(path);
        Ok(())
    }

    fn emit(&self, event: MergeEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Drain `queues` strictly in order, each one until its producer closes it.
///
/// Receivers are dropped on return, which unblocks any producer still waiting on a full queue.
pub fn drain_sources<F: PartFactory>(
    partitioner: &mut Partitioner<F>,
    queues: Vec<Receiver<RowPayload>>,
    signal: &AbortSignal,
) -> MergeResult<()> {
    for queue in queues {
        signal.check()?;
        for payload in queue.iter() {
            signal.check()?;
            partitioner.write(&payload)?;
        }
        // a failed producer closes its queue early
        signal.check()?;
    }
    Ok(())
}
