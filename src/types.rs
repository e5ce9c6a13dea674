//! Core data model shared by the template analyzer, the producers, and the writer.
//!
//! Rows travel from a producer to the writer as [`RowPayload`]s: a list of typed, styled
//! [`OutputCell`]s plus the row height of the source row.

use std::path::{Path, PathBuf};

/// Opaque reference to a cell format (`cellXfs` index) in the template workbook.
///
/// `0` is the workbook's default format.
pub type StyleId = u32;

/// A discovered input workbook.
///
/// `index` is the 0-based ordinal assigned in ascending-file-size order; the writer drains sources
/// strictly by this ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Ordinal of the source in merge order.
    pub index: usize,
    /// Path to the `.xlsx` file.
    pub path: PathBuf,
}

impl Source {
    /// Create a new source.
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Base file name, used for the optional per-row source column.
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Semantic classification of a column's values, governing text-to-value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `"1"` / `"true"` become booleans.
    Bool,
    /// Displayed text is parsed as a floating point number.
    Numeric,
    /// Passed through as literal text.
    Date,
    /// Passed through as literal text.
    String,
}

/// A single typed value in an output row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (styled blank when a style applies).
    Empty,
    /// Boolean.
    Bool(bool),
    /// 64-bit float.
    Number(f64),
    /// Literal text.
    Text(String),
}

/// A value plus the template style it is written with.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputCell {
    /// Typed value.
    pub value: CellValue,
    /// Template style; `None` writes the cell unstyled.
    pub style: Option<StyleId>,
}

impl OutputCell {
    /// A styled cell.
    pub fn styled(value: CellValue, style: StyleId) -> Self {
        Self {
            value,
            style: Some(style),
        }
    }

    /// An unstyled cell (used for the source-file column).
    pub fn plain(value: CellValue) -> Self {
        Self { value, style: None }
    }
}

/// One converted source row, owned by exactly one queue slot until the writer consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPayload {
    /// Ordinal of the source this row came from.
    pub source_index: usize,
    /// Cells in column order starting at column A.
    pub cells: Vec<OutputCell>,
    /// Row height in points, when the source row carries one.
    pub height: Option<f64>,
}
