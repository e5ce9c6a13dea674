//! Merge configuration.
//!
//! [`MergeOptions`] carries every knob of a merge run. [`Default`] matches the command-line
//! defaults, so most callers only set the input directory:
//!
//! ```
//! use xlsx_merge::config::MergeOptions;
//!
//! let opts = MergeOptions {
//!     has_headers: true,
//!     ..MergeOptions::new("./reports")
//! };
//! assert_eq!(opts.max_rows_per_part, Some(600_000));
//! ```

use std::path::{Component, Path, PathBuf};

use crate::error::{MergeError, MergeResult};

/// Default output path; parts are written next to it as `merged_part<N>.xlsx`.
pub const DEFAULT_OUTPUT_PATH: &str = "./merged.xlsx";
/// Default number of leading template rows sampled for the numeric style cache.
pub const DEFAULT_SAMPLE_ROWS: usize = 1_000;
/// Default data-row cap per output part.
pub const DEFAULT_MAX_ROWS_PER_PART: u64 = 600_000;
/// Default size of the producer pool.
pub const DEFAULT_WORKERS: usize = 4;
/// Default capacity (in rows) of each per-source queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20_000;

/// Options controlling a merge run.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    /// Directory whose `.xlsx` files are merged (not recursive).
    pub input_dir: PathBuf,
    /// Output path; parts are named `<stem>_part<N>.<ext>` next to it.
    pub output_path: PathBuf,
    /// Number of leading template rows sampled for the style cache (fallback mode only).
    pub sample_rows: usize,
    /// Append a trailing column holding each row's source file name.
    pub add_source_column: bool,
    /// Sources start with a header row, which is skipped and re-emitted once per part.
    pub has_headers: bool,
    /// Data rows per part. `None` writes everything into a single part.
    pub max_rows_per_part: Option<u64>,
    /// Explicit template. When `None` the largest source is the template and the style cache
    /// drives numeric formatting.
    pub template_path: Option<PathBuf>,
    /// Number of parallel producers.
    pub workers: usize,
    /// Capacity of each per-source row queue.
    pub queue_capacity: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            add_source_column: false,
            has_headers: false,
            max_rows_per_part: Some(DEFAULT_MAX_ROWS_PER_PART),
            template_path: None,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl MergeOptions {
    /// Options for merging `input_dir` with every other setting at its default.
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Default::default()
        }
    }

    /// Convert a signed cap (as accepted on the command line) into `max_rows_per_part`.
    ///
    /// Any value `<= 0` disables partitioning.
    pub fn cap_from_signed(max_rows: i64) -> Option<u64> {
        u64::try_from(max_rows).ok().filter(|&n| n > 0)
    }

    /// `true` when an explicit template was supplied.
    pub fn uses_explicit_template(&self) -> bool {
        self.template_path.is_some()
    }

    /// Return a copy with lexically cleaned paths.
    pub fn normalized(mut self) -> Self {
        self.input_dir = clean_path(&self.input_dir);
        self.output_path = clean_path(&self.output_path);
        self.template_path = self.template_path.as_deref().map(clean_path);
        self
    }

    /// Validate options before any file is touched.
    pub fn validate(&self) -> MergeResult<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(MergeError::Config {
                message: "an input directory is required".to_string(),
            });
        }
        if !self.input_dir.is_dir() {
            return Err(MergeError::Config {
                message: format!(
                    "input directory does not exist or is not a directory: {}",
                    self.input_dir.display()
                ),
            });
        }
        if self.output_path.file_name().is_none() {
            return Err(MergeError::Config {
                message: format!(
                    "output path must name a file: {}",
                    self.output_path.display()
                ),
            });
        }
        if self.workers == 0 {
            return Err(MergeError::Config {
                message: "workers must be > 0".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(MergeError::Config {
                message: "queue_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Lexical cleanup: drops `.` components and resolves `..` against preceding normal components.
fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
