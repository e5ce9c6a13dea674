//! Template analysis.
//!
//! The template's first sheet decides the output layout: row 1 gives the header texts, header
//! styles and header height, row 2 gives each column's data style and value type. Without an
//! explicit template the leading rows are also sampled into the [`StyleCache`] so producers can
//! pick a numeric style by decimal count.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MergeOptions;
use crate::convert::decimal_places;
use crate::error::{MergeError, MergeResult};
use crate::style_cache::StyleCache;
use crate::types::{CellValue, OutputCell, StyleId, ValueType};
use crate::xlsx::{CellKind, SheetCell, SheetRow, StyleSheet, WorkbookError, WorkbookReader};

/// Built-in number format ids that hold dates and times.
pub const DATE_FORMAT_IDS: [u32; 11] = [14, 15, 16, 17, 22, 27, 30, 36, 45, 46, 47];

/// Built-in number format ids that hold plain numbers.
pub const NUMERIC_FORMAT_IDS: [u32; 9] = [1, 2, 3, 4, 10, 37, 38, 39, 40];

/// Header text of the synthetic source-file column when sources carry headers.
pub const SOURCE_COLUMN_HEADER: &str = "SourceFile";

/// Value type implied by a number format id alone.
pub fn classify_format(num_fmt_id: u32) -> ValueType {
    if DATE_FORMAT_IDS.contains(&num_fmt_id) {
        ValueType::Date
    } else if NUMERIC_FORMAT_IDS.contains(&num_fmt_id) {
        ValueType::Numeric
    } else {
        ValueType::String
    }
}

/// Value type of a cell: its explicit type when it has one, otherwise its number format.
pub fn classify_cell(cell: &SheetCell, styles: &StyleSheet) -> ValueType {
    match cell.kind {
        CellKind::Bool => ValueType::Bool,
        CellKind::Number => ValueType::Numeric,
        CellKind::Date => ValueType::Date,
        CellKind::Unset => classify_format(styles.num_fmt_id(cell.style)),
        CellKind::Error
        | CellKind::SharedString
        | CellKind::InlineString
        | CellKind::FormulaString => ValueType::String,
    }
}

/// Layout of one output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub header: String,
    pub header_style: StyleId,
    pub data_style: StyleId,
    pub value_type: ValueType,
}

/// Output columns in order, built once from the template and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<ColumnSpec>,
    header_height: Option<f64>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnSpec>, header_height: Option<f64>) -> Self {
        Self {
            columns,
            header_height,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Option<&ColumnSpec> {
        self.columns.get(col)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.header.as_str())
    }

    /// Template-decided type of a column; `None` past the template's columns.
    pub fn value_type(&self, col: usize) -> Option<ValueType> {
        self.column(col).map(|c| c.value_type)
    }

    /// Data style of a column; columns past the template use the default style.
    pub fn data_style(&self, col: usize) -> StyleId {
        self.column(col).map_or(0, |c| c.data_style)
    }

    pub fn header_height(&self) -> Option<f64> {
        self.header_height
    }

    /// Header cells, each with its header style.
    pub fn header_cells(&self) -> Vec<OutputCell> {
        self.columns
            .iter()
            .map(|c| {
                let value = if c.header.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(c.header.clone())
                };
                OutputCell::styled(value, c.header_style)
            })
            .collect()
    }
}

/// Everything the pipeline needs from the template.
#[derive(Debug)]
pub struct TemplateAnalysis {
    pub template: PathBuf,
    pub schema: ColumnSchema,
    pub style_cache: StyleCache,
    /// Widths of the template's first-sheet columns, for every schema column that declares one.
    pub column_widths: Vec<(u16, f64)>,
    pub styles: Arc<StyleSheet>,
}

/// Analyze `template` once, before any producer starts.
pub fn analyze_template(template: &Path, options: &MergeOptions) -> MergeResult<TemplateAnalysis> {
    let rows_err = |source: WorkbookError| MergeError::TemplateRows {
        path: template.to_path_buf(),
        source,
    };

    let mut reader = WorkbookReader::open(template).map_err(|source| MergeError::TemplateOpen {
        path: template.to_path_buf(),
        source,
    })?;
    if reader.sheet_count() == 0 {
        return Err(MergeError::EmptyTemplate {
            path: template.to_path_buf(),
        });
    }
    let styles = reader.styles();

    let mut first: Option<SheetRow> = None;
    let mut second: Option<SheetRow> = None;
    reader
        .for_each_row(0, |row| {
            if row.number == 1 {
                first = Some(row);
                ControlFlow::Continue(())
            } else {
                second = Some(row);
                ControlFlow::Break(())
            }
        })
        .map_err(rows_err)?;

    let schema = build_schema(
        first.as_ref(),
        second.as_ref(),
        &styles,
        options.has_headers,
        options.add_source_column,
    );

    let widths = reader.column_widths(0).map_err(rows_err)?;
    let column_widths = (0..schema.len())
        .filter_map(|col| {
            let col = u16::try_from(col).ok()?;
            widths.width(u32::from(col)).map(|w| (col, w))
        })
        .collect();

    let style_cache = StyleCache::new();
    if !options.uses_explicit_template() && options.sample_rows > 0 {
        let limit = u32::try_from(options.sample_rows).unwrap_or(u32::MAX);
        let columns = schema.len();
        reader
            .for_each_row(0, |row| {
                sample_row(&row, columns, &styles, &style_cache);
                if row.number >= limit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .map_err(rows_err)?;
    }

    Ok(TemplateAnalysis {
        template: template.to_path_buf(),
        schema,
        style_cache,
        column_widths,
        styles,
    })
}

fn build_schema(
    first: Option<&SheetRow>,
    second: Option<&SheetRow>,
    styles: &StyleSheet,
    has_headers: bool,
    add_source_column: bool,
) -> ColumnSchema {
    let width = first.map_or(0, |r| r.cells.len());
    let default_cell = SheetCell::default();

    let mut columns: Vec<ColumnSpec> = (0..width)
        .map(|col| {
            let head = first.and_then(|r| r.cell(col)).unwrap_or(&default_cell);
            let data = second.and_then(|r| r.cell(col)).unwrap_or(&default_cell);
            ColumnSpec {
                header: if has_headers {
                    head.text.clone()
                } else {
                    String::new()
                },
                header_style: head.style,
                data_style: data.style,
                value_type: classify_cell(data, styles),
            }
        })
        .collect();

    if add_source_column {
        let col = columns.len();
        columns.push(ColumnSpec {
            header: if has_headers {
                SOURCE_COLUMN_HEADER.to_string()
            } else {
                String::new()
            },
            header_style: first.and_then(|r| r.cell(col)).map_or(0, |c| c.style),
            data_style: second.and_then(|r| r.cell(col)).map_or(0, |c| c.style),
            value_type: ValueType::String,
        });
    }

    ColumnSchema::new(columns, first.and_then(|r| r.height))
}

/// Record `(column, decimals) -> style` for the numeric cells of one template row.
fn sample_row(row: &SheetRow, columns: usize, styles: &StyleSheet, cache: &StyleCache) {
    for (col, cell) in row.cells.iter().enumerate().take(columns) {
        if classify_cell(cell, styles) != ValueType::Numeric || cell.text.is_empty() {
            continue;
        }
        cache.insert_if_absent(col, decimal_places(&cell.text), cell.style);
    }
}
