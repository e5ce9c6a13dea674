//! Streaming worksheet reader.
//!
//! [`WorkbookReader`] opens the ZIP package once, loads the small shared parts (workbook sheet
//! list, relationships, shared strings, styles) and then streams a worksheet's `<sheetData>`
//! row by row through a callback. Only the row being assembled is held in memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use super::cell_ref::parse_cell_ref;
use super::display::render_number;
use super::error::{WorkbookError, WorkbookResult};
use super::styles::StyleSheet;
use super::xml::{attr, attr_f64, attr_u32};
use crate::types::StyleId;

/// Explicit cell type, taken from the `t` attribute of a `<c>` element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellKind {
    /// No `t` attribute: a number, or an empty styled cell.
    #[default]
    Unset,
    Bool,
    Number,
    Date,
    Error,
    SharedString,
    InlineString,
    /// `t="str"`: cached string result of a formula.
    FormulaString,
}

impl CellKind {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            None => Self::Unset,
            Some("b") => Self::Bool,
            Some("n") => Self::Number,
            Some("d") => Self::Date,
            Some("e") => Self::Error,
            Some("s") => Self::SharedString,
            Some("inlineStr") => Self::InlineString,
            Some("str") => Self::FormulaString,
            Some(_) => Self::Unset,
        }
    }
}

/// A cell as read from a worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetCell {
    pub kind: CellKind,
    pub style: StyleId,
    /// Displayed text (shared strings resolved, numbers rendered through their format).
    pub text: String,
}

/// One worksheet row. Cells are positioned from column A; gaps hold default cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    /// 1-based row number.
    pub number: u32,
    /// Explicit row height (`ht`) in points.
    pub height: Option<f64>,
    pub cells: Vec<SheetCell>,
}

impl SheetRow {
    fn empty(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn cell(&self, col: usize) -> Option<&SheetCell> {
        self.cells.get(col)
    }
}

/// Column widths declared in a worksheet's `<cols>` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnWidths {
    /// `(first_col, last_col, width)`, 0-based inclusive.
    spans: Vec<(u32, u32, f64)>,
}

impl ColumnWidths {
    /// Width of a 0-based column, if one is declared.
    pub fn width(&self, col: u32) -> Option<f64> {
        self.spans
            .iter()
            .find(|(first, last, _)| (*first..=*last).contains(&col))
            .map(|(_, _, w)| *w)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetEntry {
    name: String,
    part: String,
}

/// An open `.xlsx` package.
pub struct WorkbookReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    sheets: Vec<SheetEntry>,
    shared_strings: Arc<[String]>,
    styles: Arc<StyleSheet>,
}

impl std::fmt::Debug for WorkbookReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkbookReader")
            .field("path", &self.path)
            .field("sheets", &self.sheets)
            .field("shared_strings", &self.shared_strings.len())
            .finish()
    }
}

impl WorkbookReader {
    pub fn open(path: impl AsRef<Path>) -> WorkbookResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let workbook = read_part(&mut archive, "xl/workbook.xml")?
            .ok_or_else(|| WorkbookError::MissingPart("xl/workbook.xml".to_string()))?;
        let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
        let sheets = parse_sheet_list(&workbook, rels.as_deref())?;

        let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        let styles = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => StyleSheet::parse(&xml)?,
            None => StyleSheet::default(),
        };

        Ok(Self {
            path,
            archive,
            sheets,
            shared_strings: shared_strings.into(),
            styles: Arc::new(styles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Style table of the workbook, shareable across threads.
    pub fn styles(&self) -> Arc<StyleSheet> {
        Arc::clone(&self.styles)
    }

    /// Stream the rows of sheet `sheet` (0-based) through `f` until it breaks or the sheet ends.
    ///
    /// Rows missing from the XML are reported as empty rows so row numbers stay contiguous.
    /// Returns the break value, if `f` broke early.
    pub fn for_each_row<B, F>(&mut self, sheet: usize, f: F) -> WorkbookResult<Option<B>>
    where
        F: FnMut(SheetRow) -> ControlFlow<B>,
    {
        let part = self.sheet_part(sheet)?;
        let shared = Arc::clone(&self.shared_strings);
        let styles = Arc::clone(&self.styles);
        let file = self.archive.by_name(&part).map_err(part_error(&part))?;
        parse_sheet_rows(BufReader::new(file), &shared, &styles, f)
    }

    /// Column widths of sheet `sheet` (0-based).
    pub fn column_widths(&mut self, sheet: usize) -> WorkbookResult<ColumnWidths> {
        let part = self.sheet_part(sheet)?;
        let file = self.archive.by_name(&part).map_err(part_error(&part))?;
        parse_column_widths(BufReader::new(file))
    }

    fn sheet_part(&self, sheet: usize) -> WorkbookResult<String> {
        self.sheets
            .get(sheet)
            .map(|s| s.part.clone())
            .ok_or_else(|| WorkbookError::MissingPart(format!("worksheet #{sheet}")))
    }
}

fn part_error(name: &str) -> impl FnOnce(ZipError) -> WorkbookError + '_ {
    move |e| match e {
        ZipError::FileNotFound => WorkbookError::MissingPart(name.to_string()),
        other => other.into(),
    }
}

fn read_part(
    archive: &mut ZipArchive<BufReader<File>>,
    name: &str,
) -> WorkbookResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Sheet names and part paths from `xl/workbook.xml`, resolved through its relationships.
fn parse_sheet_list(workbook: &[u8], rels: Option<&[u8]>) -> WorkbookResult<Vec<SheetEntry>> {
    let targets = match rels {
        Some(xml) => parse_relationships(xml)?,
        None => HashMap::new(),
    };

    let mut reader = Reader::from_reader(workbook);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(e, b"name")?.unwrap_or_default();
                let part = attr(e, b"id")?
                    .and_then(|id| targets.get(&id).cloned())
                    .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", sheets.len() + 1));
                sheets.push(SheetEntry { name, part });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// `Id` → package path for every relationship of the workbook part.
fn parse_relationships(xml: &[u8]) -> WorkbookResult<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(e, b"Id")?, attr(e, b"Target")?) {
                    let part = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    targets.insert(id, part);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Shared string table. Rich-text runs are concatenated; phonetic runs are skipped.
fn parse_shared_strings(xml: &[u8]) -> WorkbookResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(ref t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn parse_column_widths<R: BufRead>(source: R) -> WorkbookResult<ColumnWidths> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut widths = ColumnWidths::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"col" => {
                    let min = attr_u32(e, b"min")?;
                    let max = attr_u32(e, b"max")?;
                    let width = attr_f64(e, b"width")?;
                    if let (Some(min), Some(max), Some(width)) = (min, max, width) {
                        if min >= 1 && max >= min {
                            widths.spans.push((min - 1, max - 1, width));
                        }
                    }
                }
                b"sheetData" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(widths)
}

/// A `<c>` element being assembled.
struct PendingCell {
    col: usize,
    kind: CellKind,
    style: StyleId,
    raw: String,
}

impl PendingCell {
    fn start(e: &BytesStart<'_>, next_col: usize) -> WorkbookResult<Self> {
        let col = attr(e, b"r")?
            .and_then(|r| parse_cell_ref(&r))
            .map_or(next_col, |(col, _)| col as usize);
        Ok(Self {
            col,
            kind: CellKind::from_attr(attr(e, b"t")?.as_deref()),
            style: attr_u32(e, b"s")?.unwrap_or(0),
            raw: String::new(),
        })
    }

    fn finish(self, shared: &[String], styles: &StyleSheet) -> WorkbookResult<(usize, SheetCell)> {
        let text = match self.kind {
            CellKind::SharedString => shared_string(self.raw.trim(), shared)?,
            CellKind::Bool => match self.raw.trim() {
                "" => String::new(),
                "1" => "TRUE".to_string(),
                _ => "FALSE".to_string(),
            },
            CellKind::Unset | CellKind::Number => {
                let format = styles.number_format(self.style);
                render_number(&self.raw, format.id, format.code)
            }
            CellKind::Date
            | CellKind::Error
            | CellKind::InlineString
            | CellKind::FormulaString => self.raw,
        };
        Ok((
            self.col,
            SheetCell {
                kind: self.kind,
                style: self.style,
                text,
            },
        ))
    }
}

/// Resolve a `t="s"` cell value; an empty value is an empty cell.
fn shared_string(index: &str, shared: &[String]) -> WorkbookResult<String> {
    if index.is_empty() {
        return Ok(String::new());
    }
    index
        .parse::<usize>()
        .ok()
        .and_then(|i| shared.get(i).cloned())
        .ok_or_else(|| {
            WorkbookError::Malformed(format!(
                "shared string index {index} out of range ({} strings)",
                shared.len()
            ))
        })
}

fn place(row: &mut SheetRow, col: usize, cell: SheetCell) {
    if col < row.cells.len() {
        row.cells[col] = cell;
    } else {
        row.cells.resize_with(col, SheetCell::default);
        row.cells.push(cell);
    }
}

fn start_row(e: &BytesStart<'_>, next_row: u32) -> WorkbookResult<SheetRow> {
    let number = attr_u32(e, b"r")?
        .filter(|&r| r >= next_row)
        .unwrap_or(next_row);
    Ok(SheetRow {
        number,
        height: attr_f64(e, b"ht")?.filter(|h| *h > 0.0),
        cells: Vec::new(),
    })
}

/// Hand `row` to `f`, preceded by an empty row for every row number skipped since the last one.
fn emit<B>(
    row: SheetRow,
    next_row: &mut u32,
    f: &mut impl FnMut(SheetRow) -> ControlFlow<B>,
) -> ControlFlow<B> {
    while *next_row < row.number {
        f(SheetRow::empty(*next_row))?;
        *next_row += 1;
    }
    *next_row = row.number + 1;
    f(row)
}

/// Stream `<sheetData>` rows from a worksheet part.
pub(crate) fn parse_sheet_rows<R, B, F>(
    source: R,
    shared: &[String],
    styles: &StyleSheet,
    mut f: F,
) -> WorkbookResult<Option<B>>
where
    R: BufRead,
    F: FnMut(SheetRow) -> ControlFlow<B>,
{
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut next_row: u32 = 1;
    let mut row: Option<SheetRow> = None;
    let mut cell: Option<PendingCell> = None;
    let mut capturing = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => row = Some(start_row(e, next_row)?),
                b"c" => {
                    let next_col = row.as_ref().map_or(0, |r| r.cells.len());
                    cell = Some(PendingCell::start(e, next_col)?);
                }
                b"v" => capturing = cell.is_some(),
                b"t" => capturing = cell.is_some() && !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"row" => {
                    let empty = start_row(e, next_row)?;
                    if let ControlFlow::Break(b) = emit(empty, &mut next_row, &mut f) {
                        return Ok(Some(b));
                    }
                }
                b"c" => {
                    let next_col = row.as_ref().map_or(0, |r| r.cells.len());
                    let (col, done) = PendingCell::start(e, next_col)?.finish(shared, styles)?;
                    if let Some(row) = row.as_mut() {
                        place(row, col, done);
                    }
                }
                _ => {}
            },
            Event::Text(ref t) if capturing => {
                if let Some(c) = cell.as_mut() {
                    c.raw.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => capturing = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let (col, done) = pending.finish(shared, styles)?;
                        if let Some(row) = row.as_mut() {
                            place(row, col, done);
                        }
                    }
                }
                b"row" => {
                    if let Some(done) = row.take() {
                        if let ControlFlow::Break(b) = emit(done, &mut next_row, &mut f) {
                            return Ok(Some(b));
                        }
                    }
                }
                b"sheetData" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::{
        CellKind, SheetRow, parse_column_widths, parse_shared_strings, parse_sheet_list,
        parse_sheet_rows,
    };
    use crate::xlsx::{StyleSheet, WorkbookError};

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="3">
    <xf numFmtId="0"/>
    <xf numFmtId="2"/>
    <xf numFmtId="14"/>
  </cellXfs>
</styleSheet>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cols><col min="1" max="2" width="18.5" customWidth="1"/><col min="4" max="4" width="9"/></cols>
  <sheetData>
    <row r="1" ht="24" customHeight="1">
      <c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Flag</t></is></c>
    </row>
    <row r="2">
      <c r="A2" t="s"><v>2</v></c><c r="B2" s="1"><v>12.5</v></c><c r="C2" t="b"><v>1</v></c>
    </row>
    <row r="4">
      <c r="B4" s="2"><v>45352</v></c><c r="D4" t="str"><f>A1&amp;"x"</f><v>Namex</v></c>
    </row>
    <row r="5"/>
  </sheetData>
</worksheet>"#;

    const SHARED: &str = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Name</t></si>
  <si><r><t>Amo</t></r><r><t xml:space="preserve">unt</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
  <si><t>alpha &amp; beta</t></si>
</sst>"#;

    fn collect_rows() -> Vec<SheetRow> {
        let shared = parse_shared_strings(SHARED.as_bytes()).unwrap();
        let styles = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        let mut rows = Vec::new();
        let out: Option<()> = parse_sheet_rows(SHEET.as_bytes(), &shared, &styles, |row| {
            rows.push(row);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert!(out.is_none());
        rows
    }

    #[test]
    fn shared_strings_concatenate_runs_and_skip_phonetics() {
        let shared = parse_shared_strings(SHARED.as_bytes()).unwrap();
        assert_eq!(shared, vec!["Name", "Amount", "alpha & beta"]);
    }

    #[test]
    fn rows_resolve_text_kind_style_and_height() {
        let rows = collect_rows();
        let header = &rows[0];
        assert_eq!(header.number, 1);
        assert_eq!(header.height, Some(24.0));
        let texts: Vec<&str> = header.cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Name", "Amount", "Flag"]);

        let data = &rows[1];
        assert_eq!(data.height, None);
        assert_eq!(data.cells[0].text, "alpha & beta");
        assert_eq!(data.cells[0].kind, CellKind::SharedString);
        assert_eq!(data.cells[1].kind, CellKind::Unset);
        assert_eq!(data.cells[1].style, 1);
        assert_eq!(data.cells[1].text, "12.50");
        assert_eq!(data.cells[2].kind, CellKind::Bool);
        assert_eq!(data.cells[2].text, "TRUE");
    }

    #[test]
    fn row_and_cell_gaps_are_filled() {
        let rows = collect_rows();
        let numbers: Vec<u32> = rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert!(rows[2].cells.is_empty());
        assert!(rows[4].cells.is_empty());

        let gapped = &rows[3];
        assert_eq!(gapped.cells.len(), 4);
        assert_eq!(gapped.cells[0].text, "");
        assert_eq!(gapped.cells[1].text, "2024-03-01");
        assert_eq!(gapped.cells[3].kind, CellKind::FormulaString);
        assert_eq!(gapped.cells[3].text, "Namex");
    }

    #[test]
    fn breaking_stops_the_stream() {
        let shared = parse_shared_strings(SHARED.as_bytes()).unwrap();
        let styles = StyleSheet::default();
        let mut seen = 0;
        let out = parse_sheet_rows(SHEET.as_bytes(), &shared, &styles, |row| {
            seen += 1;
            if row.number == 2 {
                ControlFlow::Break(row.number)
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(out, Some(2));
        assert_eq!(seen, 2);
    }

    #[test]
    fn dangling_shared_string_index_is_malformed() {
        let sheet = r#"<worksheet><sheetData>
  <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"/></row>
  <row r="2"><c r="A2" t="s"><v>7</v></c></row>
</sheetData></worksheet>"#;
        let shared = vec!["only".to_string()];
        let styles = StyleSheet::default();
        let mut rows = Vec::new();
        let err = parse_sheet_rows(sheet.as_bytes(), &shared, &styles, |row| {
            rows.push(row);
            ControlFlow::<()>::Continue(())
        })
        .unwrap_err();

        assert!(matches!(err, WorkbookError::Malformed(ref m) if m.contains("index 7")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells[0].text, "only");
        assert_eq!(rows[0].cells[1].text, "");
    }

    #[test]
    fn column_widths_come_from_cols_block() {
        let widths = parse_column_widths(SHEET.as_bytes()).unwrap();
        assert_eq!(widths.width(0), Some(18.5));
        assert_eq!(widths.width(1), Some(18.5));
        assert_eq!(widths.width(2), None);
        assert_eq!(widths.width(3), Some(9.0));
    }

    #[test]
    fn sheet_list_follows_relationships() {
        let workbook = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId2"/>
    <sheet name="Notes" sheetId="2" r:id="rId9"/>
  </sheets>
</workbook>"#;
        let rels = br#"<Relationships>
  <Relationship Id="rId2" Type="worksheet" Target="worksheets/sheet7.xml"/>
  <Relationship Id="rId3" Type="styles" Target="/xl/styles.xml"/>
</Relationships>"#;
        let sheets = parse_sheet_list(workbook, Some(rels)).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Data");
        assert_eq!(sheets[0].part, "xl/worksheets/sheet7.xml");
        assert_eq!(sheets[1].part, "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn reader_opens_a_written_workbook() {
        use rust_xlsxwriter::{Format, Workbook};

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("xlsx-merge-reader-{nanos}.xlsx"));

        let mut wb = Workbook::new();
        let first = wb.add_worksheet();
        first.set_name("Data").unwrap();
        first.write_string(0, 0, "name").unwrap();
        first
            .write_number_with_format(1, 1, 3.5, &Format::new().set_num_format_index(2))
            .unwrap();
        first.write_boolean(2, 0, true).unwrap();
        wb.add_worksheet().set_name("Notes").unwrap();
        wb.save(&path).unwrap();

        let mut reader = super::WorkbookReader::open(&path).unwrap();
        assert_eq!(reader.path(), path.as_path());
        assert_eq!(reader.sheet_names(), vec!["Data", "Notes"]);

        let mut rows = Vec::new();
        reader
            .for_each_row(0, |row| {
                rows.push(row);
                ControlFlow::<()>::Continue(())
            })
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells[0].text, "name");
        assert_eq!(rows[1].cells[0].kind, CellKind::Unset);
        assert_eq!(rows[1].cells[1].text, "3.50");
        assert_eq!(rows[2].cells[0].kind, CellKind::Bool);
        assert_eq!(rows[2].cells[0].text, "TRUE");

        std::fs::remove_file(&path).ok();
    }
}
