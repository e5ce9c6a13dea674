//! A1-style cell references. Columns are 0-based, rows 1-based (as in the XML).

/// Parse `AB12` into `(column_0_based, row_1_based)`.
///
/// Absolute markers (`$A$1`) are accepted.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().trim_start_matches('$');
    let split = reference.find(|c: char| !c.is_ascii_alphabetic())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for b in letters.bytes() {
        col = col * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
    }
    let row: u32 = digits.trim_start_matches('$').parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col - 1, row))
}
