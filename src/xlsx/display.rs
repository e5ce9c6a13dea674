//! Displayed text for numeric cells.
//!
//! Spreadsheet applications show a number through its number format; the merge works on that
//! displayed text (decimal counting, numeric parsing). Rendering rules:
//!
//! - fixed-decimal formats (`0.00`, `#,##0.000`, ...) render with exactly that many decimals and
//!   no grouping, so the text still parses as a number
//! - date/time formats render as ISO-8601 text (`2024-03-01`, `2024-03-01 08:30:00`, `08:30:00`)
//!   whatever the code's field order or month style (`dd/mm/yyyy`, `mm-dd-yy`, `d-mmm-yy` all
//!   give `2024-03-01`); merged date columns hold this normalized text, not the source layout
//! - `General`, percent, scientific, fraction and text formats render the shortest round-trip
//!   form of the stored value

use chrono::{NaiveDate, TimeDelta};

/// Built-in number format codes by id (ECMA-376 §18.8.30), for the ids that affect rendering.
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        27 | 36 => "yyyy\"-\"m\"-\"d",
        30 => "m/d/yy",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeKind {
    General,
    Fixed(usize),
    DateTime { date: bool, time: bool },
    Other,
}

/// Render the stored value `raw` of a numeric cell through its number format.
///
/// `raw` that does not parse as a number is returned unchanged.
pub fn render_number(raw: &str, format_id: u32, format_code: Option<&str>) -> String {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return raw.to_string();
    };
    let code = format_code
        .or_else(|| builtin_format_code(format_id))
        .unwrap_or("General");

    match classify_code(code) {
        CodeKind::Fixed(decimals) => format!("{:.*}", decimals, value),
        CodeKind::DateTime { date, time } => {
            render_serial(value, date, time).unwrap_or_else(|| value.to_string())
        }
        CodeKind::General | CodeKind::Other => value.to_string(),
    }
}

/// Number of decimals a fixed-decimal format code shows (`"#,##0.000"` → 3).
pub fn format_decimals(code: &str) -> usize {
    let section = literal_free(first_section(code));
    match section.find('.') {
        Some(dot) => section[dot + 1..]
            .chars()
            .take_while(|c| matches!(c, '0' | '#' | '?'))
            .count(),
        None => 0,
    }
}

fn classify_code(code: &str) -> CodeKind {
    let section = literal_free(first_section(code)).to_ascii_lowercase();
    if section.trim().is_empty() || section.trim() == "general" || section.contains('@') {
        return CodeKind::General;
    }
    if section.contains('%') || section.contains("e+") || section.contains("e-") {
        return CodeKind::Other;
    }
    let date = section.contains('y') || section.contains('d');
    let time = section.contains('h') || section.contains('s');
    if date || time {
        return CodeKind::DateTime { date, time };
    }
    if section.contains('?') || section.contains('/') {
        return CodeKind::Other;
    }
    if section.contains('0') || section.contains('#') {
        return CodeKind::Fixed(format_decimals(code));
    }
    CodeKind::General
}

/// First `;`-separated section of a format code, ignoring separators inside quotes.
fn first_section(code: &str) -> &str {
    let mut quoted = false;
    for (i, c) in code.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => return &code[..i],
            _ => {}
        }
    }
    code
}

/// Strip quoted literals, `[...]` modifiers, and escaped / padding characters.
fn literal_free(section: &str) -> String {
    let mut out = String::with_capacity(section.len());
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for q in chars.by_ref() {
                    if q == ']' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            other => out.push(other),
        }
    }
    out
}

/// Render an Excel serial date (1900 date system) as ISO text.
fn render_serial(value: f64, date: bool, time: bool) -> Option<String> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (value * 86_400_000.0).round() as i64;
    let stamp = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    let pattern = match (date, time) {
        (true, true) => "%Y-%m-%d %H:%M:%S",
        (true, false) => "%Y-%m-%d",
        _ => "%H:%M:%S",
    };
    Some(stamp.format(pattern).to_string())
}
