//! Output parts written with `rust_xlsxwriter` in constant-memory mode.
//!
//! The template's cell formats are translated once into a [`FormatPalette`]; every part
//! indexes into it with the template style ids carried by the row payloads.

use std::path::Path;
use std::sync::Arc;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Workbook,
};

use super::styles::{BorderEdge, CellXf, StyleSheet};
use crate::error::{MergeError, MergeResult};
use crate::merge::{PartFactory, PartSink};
use crate::types::{CellValue, OutputCell, StyleId};

/// Name of the single worksheet in every output part.
pub const OUTPUT_SHEET_NAME: &str = "merged";

/// `rust_xlsxwriter` formats indexed by template style id.
#[derive(Debug, Clone, Default)]
pub struct FormatPalette {
    formats: Vec<Format>,
}

impl FormatPalette {
    pub fn from_styles(styles: &StyleSheet) -> Self {
        let formats = styles
            .cell_xfs()
            .iter()
            .map(|xf| translate(styles, xf))
            .collect();
        Self { formats }
    }

    pub fn format(&self, style: StyleId) -> Option<&Format> {
        self.formats.get(style as usize)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

fn translate(styles: &StyleSheet, xf: &CellXf) -> Format {
    let mut format = Format::new();

    if let Some(code) = styles.custom_format(xf.num_fmt_id) {
        format = format.set_num_format(code);
    } else if let Ok(index) = u8::try_from(xf.num_fmt_id) {
        if index != 0 {
            format = format.set_num_format_index(index);
        }
    }

    if let Some(font) = styles.font(xf.font_id).filter(|_| xf.font_id != 0) {
        if font.bold {
            format = format.set_bold();
        }
        if font.italic {
            format = format.set_italic();
        }
        if font.strike {
            format = format.set_font_strikethrough();
        }
        if let Some(kind) = font.underline.as_deref() {
            format = format.set_underline(underline(kind));
        }
        if let Some(size) = font.size {
            format = format.set_font_size(size);
        }
        if let Some(name) = font.name.as_deref() {
            format = format.set_font_name(name);
        }
        if let Some(color) = font.color.as_deref().and_then(parse_argb) {
            format = format.set_font_color(color);
        }
    }

    if let Some(fill) = styles.fill(xf.fill_id) {
        if fill.pattern.as_deref() == Some("solid") {
            if let Some(color) = fill.fg_color.as_deref().and_then(parse_argb) {
                format = format
                    .set_pattern(FormatPattern::Solid)
                    .set_background_color(color);
            }
        }
    }

    if let Some(border) = styles.border(xf.border_id) {
        if let Some(edge) = &border.left {
            format = format.set_border_left(border_style(edge));
            if let Some(c) = edge_color(edge) {
                format = format.set_border_left_color(c);
            }
        }
        if let Some(edge) = &border.right {
            format = format.set_border_right(border_style(edge));
            if let Some(c) = edge_color(edge) {
                format = format.set_border_right_color(c);
            }
        }
        if let Some(edge) = &border.top {
            format = format.set_border_top(border_style(edge));
            if let Some(c) = edge_color(edge) {
                format = format.set_border_top_color(c);
            }
        }
        if let Some(edge) = &border.bottom {
            format = format.set_border_bottom(border_style(edge));
            if let Some(c) = edge_color(edge) {
                format = format.set_border_bottom_color(c);
            }
        }
    }

    if let Some(h) = xf.horizontal.as_deref().and_then(horizontal) {
        format = format.set_align(h);
    }
    if let Some(v) = xf.vertical.as_deref().and_then(vertical) {
        format = format.set_align(v);
    }
    if xf.wrap_text {
        format = format.set_text_wrap();
    }

    format
}

/// `FFRRGGBB` (or `RRGGBB`) to a color.
fn parse_argb(value: &str) -> Option<Color> {
    let hex = value.trim();
    let rgb = match hex.len() {
        8 => &hex[2..],
        6 => hex,
        _ => return None,
    };
    u32::from_str_radix(rgb, 16).ok().map(Color::RGB)
}

fn edge_color(edge: &BorderEdge) -> Option<Color> {
    edge.color.as_deref().and_then(parse_argb)
}

fn border_style(edge: &BorderEdge) -> FormatBorder {
    match edge.style.as_str() {
        "thin" => FormatBorder::Thin,
        "medium" => FormatBorder::Medium,
        "thick" => FormatBorder::Thick,
        "double" => FormatBorder::Double,
        "dashed" => FormatBorder::Dashed,
        "dotted" => FormatBorder::Dotted,
        "hair" => FormatBorder::Hair,
        "mediumDashed" => FormatBorder::MediumDashed,
        "dashDot" => FormatBorder::DashDot,
        "mediumDashDot" => FormatBorder::MediumDashDot,
        "dashDotDot" => FormatBorder::DashDotDot,
        "mediumDashDotDot" => FormatBorder::MediumDashDotDot,
        "slantDashDot" => FormatBorder::SlantDashDot,
        "none" => FormatBorder::None,
        _ => FormatBorder::Thin,
    }
}

fn underline(kind: &str) -> FormatUnderline {
    match kind {
        "double" => FormatUnderline::Double,
        "singleAccounting" => FormatUnderline::SingleAccounting,
        "doubleAccounting" => FormatUnderline::DoubleAccounting,
        _ => FormatUnderline::Single,
    }
}

fn horizontal(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "left" => FormatAlign::Left,
        "center" => FormatAlign::Center,
        "right" => FormatAlign::Right,
        "fill" => FormatAlign::Fill,
        "justify" => FormatAlign::Justify,
        "centerContinuous" => FormatAlign::CenterAcross,
        "distributed" => FormatAlign::Distributed,
        _ => return None,
    })
}

fn vertical(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "top" => FormatAlign::Top,
        "center" => FormatAlign::VerticalCenter,
        "bottom" => FormatAlign::Bottom,
        "justify" => FormatAlign::VerticalJustify,
        "distributed" => FormatAlign::VerticalDistributed,
        _ => return None,
    })
}

/// Opens output parts: a fresh workbook with one `merged` sheet and the template's column widths.
#[derive(Debug, Clone)]
pub struct XlsxPartFactory {
    palette: Arc<FormatPalette>,
    column_widths: Vec<(u16, f64)>,
}

impl XlsxPartFactory {
    pub fn new(palette: FormatPalette, column_widths: Vec<(u16, f64)>) -> Self {
        Self {
            palette: Arc::new(palette),
            column_widths,
        }
    }
}

impl PartFactory for XlsxPartFactory {
    type Part = XlsxPart;

    fn open_part(&mut self, part_number: u32) -> MergeResult<XlsxPart> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet_with_constant_memory();
        sheet
            .set_name(OUTPUT_SHEET_NAME)
            .map_err(|e| MergeError::write(part_number, e))?;
        for &(col, width) in &self.column_widths {
            sheet
                .set_column_width(col, width)
                .map_err(|e| MergeError::write(part_number, e))?;
        }
        Ok(XlsxPart {
            workbook,
            part_number,
            palette: Arc::clone(&self.palette),
        })
    }
}

/// One open output workbook.
pub struct XlsxPart {
    workbook: Workbook,
    part_number: u32,
    palette: Arc<FormatPalette>,
}

impl PartSink for XlsxPart {
    fn write_row(&mut self, row: u32, cells: &[OutputCell], height: Option<f64>) -> MergeResult<()> {
        let part = self.part_number;
        let sheet = self
            .workbook
            .worksheet_from_index(0)
            .map_err(|e| MergeError::write(part, e))?;

        if let Some(height) = height.filter(|h| *h > 0.0) {
            sheet
                .set_row_height(row, height)
                .map_err(|e| MergeError::write(part, e))?;
        }

        for (col, cell) in cells.iter().enumerate() {
            let col = u16::try_from(col)
                .map_err(|_| MergeError::write(part, format!("column {col} out of range")))?;
            let format = cell.style.and_then(|s| self.palette.format(s));
            let written = match (&cell.value, format) {
                (CellValue::Empty, Some(f)) => sheet.write_blank(row, col, f),
                (CellValue::Empty, None) => continue,
                (CellValue::Bool(b), Some(f)) => sheet.write_boolean_with_format(row, col, *b, f),
                (CellValue::Bool(b), None) => sheet.write_boolean(row, col, *b),
                (CellValue::Number(n), Some(f)) => sheet.write_number_with_format(row, col, *n, f),
                (CellValue::Number(n), None) => sheet.write_number(row, col, *n),
                (CellValue::Text(s), Some(f)) => sheet.write_string_with_format(row, col, s, f),
                (CellValue::Text(s), None) => sheet.write_string(row, col, s),
            };
            written.map_err(|e| MergeError::write(part, e))?;
        }
        Ok(())
    }

    fn save(mut self, path: &Path) -> MergeResult<()> {
        self.workbook
            .save(path)
            .map_err(|e| MergeError::write(self.part_number, e))
    }
}
