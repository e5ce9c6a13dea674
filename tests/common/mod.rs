#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Format, Workbook};

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("xlsx-merge-{name}-{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Input and output directories for one test.
pub struct Workspace {
    pub root: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new(name: &str) -> Self {
        let root = temp_dir(name);
        let input = root.join("in");
        let output = root.join("out");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        Self { root, input, output }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.join("merged.xlsx")
    }

    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

/// Write a source workbook: optional header row, then `rows` rows of `[label-i, i]`.
///
/// The number column uses built-in format `0` so it reads back as a number.
pub fn write_source(path: &Path, label: &str, header: Option<[&str; 2]>, rows: u32) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Sheet1").unwrap();
    let integer = Format::new().set_num_format_index(1);
    let bold = Format::new().set_bold();

    let mut r = 0;
    if let Some([a, b]) = header {
        ws.write_string_with_format(0, 0, a, &bold).unwrap();
        ws.write_string_with_format(0, 1, b, &bold).unwrap();
        r = 1;
    }
    for i in 0..rows {
        ws.write_string(r + i, 0, format!("{label}-{i}")).unwrap();
        ws.write_number_with_format(r + i, 1, f64::from(i), &integer).unwrap();
    }
    wb.save(path).unwrap();
}

/// All rows of the `merged` sheet of an output part.
pub fn read_part(path: &Path) -> Vec<Vec<Data>> {
    let mut wb: Xlsx<_> = open_workbook(path).unwrap();
    let range = wb.worksheet_range("merged").unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

pub fn text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
