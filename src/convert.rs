//! Per-cell conversion of source text into typed, styled output cells.

use crate::schema::{ColumnSchema, classify_cell};
use crate::style_cache::StyleCache;
use crate::types::{CellValue, OutputCell, ValueType};
use crate::xlsx::{SheetCell, SheetRow, StyleSheet};

/// Digits after the decimal point in displayed text, counted as written (`"7.250"` → 3).
///
/// Text with no point, or with more than one, counts as 0.
pub fn decimal_places(text: &str) -> usize {
    let mut parts = text.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(fraction), None) => fraction.chars().count(),
        _ => 0,
    }
}

/// `"1"` and any casing of `"true"` are true. Anything else is not a boolean and stays text.
pub fn parse_bool_text(text: &str) -> Option<bool> {
    (text == "1" || text.eq_ignore_ascii_case("true")).then_some(true)
}

/// Finite floating point value of `text`.
pub fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts the rows of one source workbook.
#[derive(Debug, Clone, Copy)]
pub struct RowConverter<'a> {
    schema: &'a ColumnSchema,
    cache: &'a StyleCache,
    source_styles: &'a StyleSheet,
    use_template: bool,
    source_tag: Option<&'a str>,
}

impl<'a> RowConverter<'a> {
    /// `source_styles` is the style table of the workbook the rows come from; it classifies cells
    /// whenever the template does not decide the column type.
    pub fn new(
        schema: &'a ColumnSchema,
        cache: &'a StyleCache,
        source_styles: &'a StyleSheet,
        use_template: bool,
    ) -> Self {
        Self {
            schema,
            cache,
            source_styles,
            use_template,
            source_tag: None,
        }
    }

    /// Append `file_name` as an unstyled text cell in the schema's last column of every row.
    pub fn with_source_tag(mut self, file_name: &'a str) -> Self {
        self.source_tag = Some(file_name);
        self
    }

    pub fn convert_row(&self, row: &SheetRow) -> Vec<OutputCell> {
        let mut cells = Vec::with_capacity(row.cells.len() + usize::from(self.source_tag.is_some()));
        cells.extend(
            row.cells
                .iter()
                .enumerate()
                .map(|(col, cell)| self.convert_cell(col, cell)),
        );
        if let Some(tag) = self.source_tag {
            // the tag goes under the schema's trailing source column, even when the row is short
            let tag_col = self.schema.len().saturating_sub(1);
            while cells.len() < tag_col {
                cells.push(OutputCell::styled(CellValue::Empty, self.schema.data_style(cells.len())));
            }
            cells.push(OutputCell::plain(CellValue::Text(tag.to_string())));
        }
        cells
    }

    pub fn convert_cell(&self, col: usize, cell: &SheetCell) -> OutputCell {
        let base = self.schema.data_style(col);
        let value_type = match self.schema.value_type(col) {
            Some(value_type) if self.use_template => value_type,
            _ => classify_cell(cell, self.source_styles),
        };

        let text = cell.text.as_str();
        if text.is_empty() {
            return OutputCell::styled(CellValue::Empty, base);
        }

        match value_type {
            ValueType::Bool => match parse_bool_text(text) {
                Some(b) => OutputCell::styled(CellValue::Bool(b), base),
                None => OutputCell::styled(CellValue::Text(text.to_string()), base),
            },
            ValueType::Numeric => match parse_number(text) {
                Some(n) => {
                    let style = if self.use_template {
                        base
                    } else {
                        self.cache.resolve(col, decimal_places(text), base)
                    };
                    OutputCell::styled(CellValue::Number(n), style)
                }
                None => OutputCell::styled(CellValue::Text(text.to_string()), base),
            },
            ValueType::Date | ValueType::String => {
                OutputCell::styled(CellValue::Text(text.to_string()), base)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RowConverter, decimal_places, parse_bool_text, parse_number};
    use crate::schema::{ColumnSchema, ColumnSpec};
    use crate::style_cache::StyleCache;
    use crate::types::{CellValue, OutputCell, ValueType};
    use crate::xlsx::{CellKind, SheetCell, SheetRow, StyleSheet};

    fn schema() -> ColumnSchema {
        let spec = |value_type, data_style| ColumnSpec {
            header: String::new(),
            header_style: 0,
            data_style,
            value_type,
        };
        ColumnSchema::new(
            vec![
                spec(ValueType::String, 1),
                spec(ValueType::Numeric, 2),
                spec(ValueType::Bool, 3),
                spec(ValueType::Date, 4),
            ],
            None,
        )
    }

    fn text_cell(text: &str) -> SheetCell {
        SheetCell {
            kind: CellKind::SharedString,
            style: 0,
            text: text.to_string(),
        }
    }

    fn number_cell(text: &str) -> SheetCell {
        SheetCell {
            kind: CellKind::Number,
            style: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn decimals_are_counted_from_displayed_text() {
        assert_eq!(decimal_places("7"), 0);
        assert_eq!(decimal_places("7.250"), 3);
        assert_eq!(decimal_places("12.50"), 2);
        assert_eq!(decimal_places("1.2.3"), 0);
        assert_eq!(parse_number("7"), Some(7.0));
        assert_eq!(parse_number("7.250"), Some(7.25));
        assert_eq!(parse_number("12,5"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn bool_text_only_maps_truthy_values() {
        assert_eq!(parse_bool_text("1"), Some(true));
        assert_eq!(parse_bool_text("TRUE"), Some(true));
        assert_eq!(parse_bool_text("true"), Some(true));
        assert_eq!(parse_bool_text("0"), None);
        assert_eq!(parse_bool_text("no"), None);
    }

    #[test]
    fn template_mode_follows_column_types() {
        let schema = schema();
        let cache = StyleCache::new();
        let styles = StyleSheet::default();
        let conv = RowConverter::new(&schema, &cache, &styles, true);

        assert_eq!(
            conv.convert_cell(1, &text_cell("7.250")),
            OutputCell::styled(CellValue::Number(7.25), 2)
        );
        assert_eq!(
            conv.convert_cell(1, &text_cell("n/a")),
            OutputCell::styled(CellValue::Text("n/a".into()), 2)
        );
        assert_eq!(
            conv.convert_cell(2, &text_cell("TRUE")),
            OutputCell::styled(CellValue::Bool(true), 3)
        );
        assert_eq!(
            conv.convert_cell(2, &text_cell("no")),
            OutputCell::styled(CellValue::Text("no".into()), 3)
        );
        assert_eq!(
            conv.convert_cell(2, &text_cell("0")),
            OutputCell::styled(CellValue::Text("0".into()), 3)
        );
        assert_eq!(
            conv.convert_cell(3, &text_cell("2024-03-01")),
            OutputCell::styled(CellValue::Text("2024-03-01".into()), 4)
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn fallback_mode_resolves_numeric_styles_through_the_cache() {
        let schema = schema();
        let cache = StyleCache::new();
        cache.insert_if_absent(1, 2, 42);
        let styles = StyleSheet::default();
        let conv = RowConverter::new(&schema, &cache, &styles, false);

        assert_eq!(
            conv.convert_cell(1, &number_cell("12.50")),
            OutputCell::styled(CellValue::Number(12.5), 42)
        );
        // first sighting of (1, 3) settles on the column's data style
        assert_eq!(
            conv.convert_cell(1, &number_cell("7.250")),
            OutputCell::styled(CellValue::Number(7.25), 2)
        );
        assert_eq!(cache.get(1, 3), Some(2));
    }

    #[test]
    fn rows_keep_order_and_gain_a_source_tag() {
        let schema = schema();
        let cache = StyleCache::new();
        let styles = StyleSheet::default();
        let conv = RowConverter::new(&schema, &cache, &styles, true).with_source_tag("a.xlsx");
        let row = SheetRow {
            number: 2,
            height: None,
            cells: vec![text_cell("x"), text_cell(""), text_cell("1"), text_cell("d"), number_cell("5")],
        };

        let out = conv.convert_row(&row);
        assert_eq!(out.len(), 6);
        assert_eq!(out[0].value, CellValue::Text("x".into()));
        assert_eq!(out[1], OutputCell::styled(CellValue::Empty, 2));
        assert_eq!(out[2].value, CellValue::Bool(true));
        // past the template's columns: own classification, default style
        assert_eq!(out[4], OutputCell::styled(CellValue::Number(5.0), 0));
        assert_eq!(out[5], OutputCell::plain(CellValue::Text("a.xlsx".into())));
    }

    #[test]
    fn short_rows_are_padded_up_to_the_source_column() {
        let spec = |value_type, data_style| ColumnSpec {
            header: String::new(),
            header_style: 0,
            data_style,
            value_type,
        };
        let schema = ColumnSchema::new(
            vec![
                spec(ValueType::String, 1),
                spec(ValueType::String, 5),
                spec(ValueType::Numeric, 6),
                spec(ValueType::String, 0),
            ],
            None,
        );
        let cache = StyleCache::new();
        let styles = StyleSheet::default();
        let conv = RowConverter::new(&schema, &cache, &styles, true).with_source_tag("small.xlsx");
        let row = SheetRow {
            number: 2,
            height: None,
            cells: vec![text_cell("x")],
        };

        let out = conv.convert_row(&row);
        assert_eq!(
            out,
            vec![
                OutputCell::styled(CellValue::Text("x".into()), 1),
                OutputCell::styled(CellValue::Empty, 5),
                OutputCell::styled(CellValue::Empty, 6),
                OutputCell::plain(CellValue::Text("small.xlsx".into())),
            ]
        );
    }
}
