//! `xlsx-merge` command line: merge a directory of `.xlsx` files and print a JSON report.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;

use xlsx_merge::config::{
    DEFAULT_MAX_ROWS_PER_PART, DEFAULT_OUTPUT_PATH, DEFAULT_QUEUE_CAPACITY, DEFAULT_SAMPLE_ROWS, DEFAULT_WORKERS,
    MergeOptions,
};
use xlsx_merge::merge::{
    CompositeMergeObserver, FileMergeObserver, MergeEngine, MergeObserver, StdErrMergeObserver,
};

#[derive(Parser, Debug)]
#[command(name = "xlsx-merge")]
#[command(version, about = "Merge a directory of .xlsx workbooks into size-bounded parts", long_about = None)]
struct Cli {
    /// Directory with the source .xlsx files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Output path; parts are written as <stem>_part<N>.<ext>
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    out: PathBuf,

    /// Number of template rows sampled for numeric styles
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    sample: usize,

    /// Append a column with each row's source file name
    #[arg(long)]
    add_source: bool,

    /// Source files start with a header row
    #[arg(long)]
    has_headers: bool,

    /// Maximum data rows per output part (<= 0 disables splitting)
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS_PER_PART as i64, allow_negative_numbers = true)]
    max_row: i64,

    /// Template workbook (defaults to the largest source)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Number of parallel producers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Rows buffered per source
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Log merge events to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Append merge events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> MergeOptions {
        MergeOptions {
            input_dir: self.dir.clone().unwrap_or_default(),
            output_path: self.out.clone(),
            sample_rows: self.sample,
            add_source_column: self.add_source,
            has_headers: self.has_headers,
            max_rows_per_part: MergeOptions::cap_from_signed(self.max_row),
            template_path: self.template.clone(),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }

    fn observer(&self) -> Option<Arc<dyn MergeObserver>> {
        let mut observers: Vec<Arc<dyn MergeObserver>> = Vec::new();
        if self.verbose {
            observers.push(Arc::new(StdErrMergeObserver));
        }
        if let Some(path) = &self.log_file {
            observers.push(Arc::new(FileMergeObserver::new(path)));
        }
        match observers.len() {
            0 => None,
            1 => observers.pop(),
            _ => Some(Arc::new(CompositeMergeObserver::new(observers))),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    output_files: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    error: String,
    duration: String,
    #[serde(skip_serializing_if = "is_zero")]
    row_count: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    let mut engine = MergeEngine::new(cli.options());
    if let Some(observer) = cli.observer() {
        engine = engine.with_observer(observer);
    }

    let (output, code) = match engine.run() {
        Ok(report) => (
            Output {
                success: true,
                output_files: report
                    .output_files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
                error: String::new(),
                duration: format!("{:?}", start.elapsed()),
                row_count: report.row_count,
            },
            ExitCode::SUCCESS,
        ),
        Err(err) => (
            Output {
                success: false,
                output_files: Vec::new(),
                error: err.to_string(),
                duration: format!("{:?}", start.elapsed()),
                row_count: 0,
            },
            ExitCode::FAILURE,
        ),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to encode report: {err}");
            return ExitCode::FAILURE;
        }
    }
    code
}
