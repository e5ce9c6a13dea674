//! `xlsx-merge` merges every `.xlsx` workbook in a directory into one or more size-bounded
//! output workbooks ("parts"), reusing the column styles of a template workbook.
//!
//! The primary entrypoint is [`merge::MergeEngine`] (or the [`merge::merge_directory`]
//! shorthand), configured with [`config::MergeOptions`].
//!
//! ## How a merge runs
//!
//! 1. Stale `<stem>_part<N>.<ext>` files from an earlier run are removed.
//! 2. Sources are discovered (non-recursive) and ordered by ascending file size.
//! 3. The template (explicit, or the largest source) is analyzed once: header row, per-column
//!    data styles and value types, column widths, and a `(column, decimals) -> style` cache
//!    sampled from its leading rows.
//! 4. A pool of producers converts source rows into typed, styled cells and pushes them into one
//!    bounded queue per source.
//! 5. A single writer drains the queues in source order and rolls over to a new part whenever the
//!    current one holds `max_rows_per_part` data rows. Each part repeats the header row.
//!
//! The first error anywhere cancels the run and is the error returned.
//!
//! ## Quick example
//!
//! ```no_run
//! use xlsx_merge::config::MergeOptions;
//! use xlsx_merge::merge::MergeEngine;
//!
//! # fn main() -> Result<(), xlsx_merge::MergeError> {
//! let opts = MergeOptions {
//!     has_headers: true,
//!     max_rows_per_part: Some(100_000),
//!     ..MergeOptions::new("./reports")
//! };
//! let report = MergeEngine::new(opts).run()?;
//! println!("rows={} parts={:?}", report.row_count, report.output_files);
//! # Ok(())
//! # }
//! ```
//!
//! ## Observing a run
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use xlsx_merge::config::MergeOptions;
//! use xlsx_merge::merge::{MergeEngine, StdErrMergeObserver};
//!
//! # fn main() -> Result<(), xlsx_merge::MergeError> {
//! let engine = MergeEngine::new(MergeOptions::new("./reports"))
//!     .with_observer(Arc::new(StdErrMergeObserver));
//! let metrics = engine.metrics();
//! engine.run()?;
//! println!("{}", metrics.snapshot());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: merge options and validation
//! - [`discovery`]: source discovery, template selection, part naming and stale-part cleanup
//! - [`schema`]: template analysis
//! - [`convert`]: text-to-value conversion of source cells
//! - [`style_cache`]: concurrent `(column, decimals) -> style` cache
//! - [`xlsx`]: streaming workbook reader and part writer
//! - [`merge`]: the engine, producers, writer, cancellation and observability

pub mod config;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod merge;
pub mod schema;
pub mod style_cache;
pub mod types;
pub mod xlsx;

pub use error::{MergeError, MergeResult};
