//! `xl/styles.xml`: number formats, fonts, fills, borders and the `cellXfs` table that cell
//! `s` attributes index into.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::display::builtin_format_code;
use super::error::WorkbookResult;
use super::xml::{attr, attr_f64, attr_flag, attr_u32};
use crate::types::StyleId;

/// Number format of a cell: the `numFmtId` plus its code when one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat<'a> {
    pub id: u32,
    pub code: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub bold: bool,
    pub italic: bool,
    pub underline: Option<String>,
    pub strike: bool,
    pub size: Option<f64>,
    pub name: Option<String>,
    /// ARGB hex, e.g. `FFFF0000`.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fill {
    pub pattern: Option<String>,
    pub fg_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorderEdge {
    pub style: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
}

/// One `cellXfs/xf` record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellXf {
    pub num_fmt_id: u32,
    pub font_id: usize,
    pub fill_id: usize,
    pub border_id: usize,
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
}

/// Parsed style table of a workbook.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    custom_formats: HashMap<u32, String>,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    cell_xfs: Vec<CellXf>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

impl StyleSheet {
    pub fn parse(xml: &[u8]) -> WorkbookResult<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut sheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut section = Section::Other;
        let mut edge: Option<&'static str> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    sheet.open(e, &mut section, &mut edge)?;
                }
                Event::Empty(ref e) => {
                    sheet.open(e, &mut section, &mut edge)?;
                    if matches!(e.local_name().as_ref(), b"left" | b"right" | b"top" | b"bottom") {
                        edge = None;
                    }
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = Section::Other,
                    b"left" | b"right" | b"top" | b"bottom" => edge = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }

    fn open(
        &mut self,
        e: &BytesStart<'_>,
        section: &mut Section,
        edge: &mut Option<&'static str>,
    ) -> WorkbookResult<()> {
        match (e.local_name().as_ref(), *section) {
            (b"numFmt", _) => {
                if let (Some(id), Some(code)) = (attr_u32(e, b"numFmtId")?, attr(e, b"formatCode")?)
                {
                    self.custom_formats.insert(id, code);
                }
            }
            (b"fonts", _) => *section = Section::Fonts,
            (b"fills", _) => *section = Section::Fills,
            (b"borders", _) => *section = Section::Borders,
            (b"cellXfs", _) => *section = Section::CellXfs,

            (b"font", Section::Fonts) => self.fonts.push(Font::default()),
            (tag, Section::Fonts) => {
                if let Some(font) = self.fonts.last_mut() {
                    match tag {
                        b"b" => font.bold = attr_flag(e, b"val", true)?,
                        b"i" => font.italic = attr_flag(e, b"val", true)?,
                        b"strike" => font.strike = attr_flag(e, b"val", true)?,
                        b"u" => {
                            let kind = attr(e, b"val")?.unwrap_or_else(|| "single".to_string());
                            font.underline = (kind != "none").then_some(kind);
                        }
                        b"sz" => font.size = attr_f64(e, b"val")?,
                        b"name" => font.name = attr(e, b"val")?,
                        b"color" => font.color = attr(e, b"rgb")?,
                        _ => {}
                    }
                }
            }

            (b"fill", Section::Fills) => self.fills.push(Fill::default()),
            (tag, Section::Fills) => {
                if let Some(fill) = self.fills.last_mut() {
                    match tag {
                        b"patternFill" => fill.pattern = attr(e, b"patternType")?,
                        b"fgColor" => fill.fg_color = attr(e, b"rgb")?,
                        _ => {}
                    }
                }
            }

            (b"border", Section::Borders) => self.borders.push(Border::default()),
            (tag @ (b"left" | b"right" | b"top" | b"bottom"), Section::Borders) => {
                let name = match tag {
                    b"left" => "left",
                    b"right" => "right",
                    b"top" => "top",
                    _ => "bottom",
                };
                *edge = Some(name);
                if let (Some(border), Some(style)) = (self.borders.last_mut(), attr(e, b"style")?) {
                    let slot = match name {
                        "left" => &mut border.left,
                        "right" => &mut border.right,
                        "top" => &mut border.top,
                        _ => &mut border.bottom,
                    };
                    *slot = Some(BorderEdge { style, color: None });
                }
            }
            (b"color", Section::Borders) => {
                if let (Some(border), Some(name)) = (self.borders.last_mut(), *edge) {
                    let slot = match name {
                        "left" => &mut border.left,
                        "right" => &mut border.right,
                        "top" => &mut border.top,
                        _ => &mut border.bottom,
                    };
                    if let Some(edge) = slot.as_mut() {
                        edge.color = attr(e, b"rgb")?;
                    }
                }
            }

            (b"xf", Section::CellXfs) => self.cell_xfs.push(CellXf {
                num_fmt_id: attr_u32(e, b"numFmtId")?.unwrap_or(0),
                font_id: attr_u32(e, b"fontId")?.unwrap_or(0) as usize,
                fill_id: attr_u32(e, b"fillId")?.unwrap_or(0) as usize,
                border_id: attr_u32(e, b"borderId")?.unwrap_or(0) as usize,
                ..CellXf::default()
            }),
            (b"alignment", Section::CellXfs) => {
                if let Some(xf) = self.cell_xfs.last_mut() {
                    xf.horizontal = attr(e, b"horizontal")?;
                    xf.vertical = attr(e, b"vertical")?;
                    xf.wrap_text = attr_flag(e, b"wrapText", false)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Number of `cellXfs` records.
    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }

    pub fn cell_xf(&self, style: StyleId) -> Option<&CellXf> {
        self.cell_xfs.get(style as usize)
    }

    pub fn cell_xfs(&self) -> &[CellXf] {
        &self.cell_xfs
    }

    pub fn font(&self, id: usize) -> Option<&Font> {
        self.fonts.get(id)
    }

    pub fn fill(&self, id: usize) -> Option<&Fill> {
        self.fills.get(id)
    }

    pub fn border(&self, id: usize) -> Option<&Border> {
        self.borders.get(id)
    }

    /// `numFmtId` of a style; unknown styles map to `0` (General).
    pub fn num_fmt_id(&self, style: StyleId) -> u32 {
        self.cell_xf(style).map_or(0, |xf| xf.num_fmt_id)
    }

    /// Custom code registered under `id` in `<numFmts>`.
    pub fn custom_format(&self, id: u32) -> Option<&str> {
        self.custom_formats.get(&id).map(String::as_str)
    }

    /// Number format of a style, resolving custom codes first and built-in codes second.
    pub fn number_format(&self, style: StyleId) -> NumberFormat<'_> {
        let id = self.num_fmt_id(style);
        let code = self.custom_format(id).or_else(|| builtin_format_code(id));
        NumberFormat { id, code }
    }
}

#[cfg(test)]
mod tests {
    use super::StyleSheet;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/></border>
    <border><left style="thin"><color rgb="FF000000"/></left><right/><top/><bottom style="double"/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="49" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="2" fontId="1" fillId="1" borderId="1" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0">
      <alignment horizontal="center" wrapText="1"/>
    </xf>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn parses_cell_formats_but_not_style_formats() {
        let sheet = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.num_fmt_id(0), 0);
        assert_eq!(sheet.num_fmt_id(1), 2);
        assert_eq!(sheet.num_fmt_id(2), 164);
        assert_eq!(sheet.num_fmt_id(99), 0);

        let xf = sheet.cell_xf(2).unwrap();
        assert_eq!(xf.horizontal.as_deref(), Some("center"));
        assert!(xf.wrap_text);
    }

    #[test]
    fn resolves_custom_then_builtin_codes() {
        let sheet = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.number_format(1).code, Some("0.00"));
        assert_eq!(sheet.number_format(2).code, Some("0.000"));
        assert_eq!(sheet.number_format(0).code, Some("General"));
    }

    #[test]
    fn parses_fonts_fills_and_borders() {
        let sheet = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        let font = sheet.font(1).unwrap();
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.size, Some(14.0));
        assert_eq!(font.color.as_deref(), Some("FFFF0000"));
        assert_eq!(font.name.as_deref(), Some("Arial"));

        let fill = sheet.fill(1).unwrap();
        assert_eq!(fill.pattern.as_deref(), Some("solid"));
        assert_eq!(fill.fg_color.as_deref(), Some("FFFFFF00"));

        let border = sheet.border(1).unwrap();
        let left = border.left.as_ref().unwrap();
        assert_eq!(left.style, "thin");
        assert_eq!(left.color.as_deref(), Some("FF000000"));
        assert_eq!(border.bottom.as_ref().unwrap().style, "double");
        assert!(border.right.is_none());
    }
}
