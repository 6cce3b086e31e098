// A1-notation helpers for building Sheets API ranges.
//
// Columns are letters (A, B, ..., Z, AA, ...) and rows are 1-based. Tab names
// are always quoted so names with spaces ("Testing Facilities") work.

/// Zero-based index of a column label, or `None` if it isn't all ASCII letters.
pub fn column_index(label: &str) -> Option<usize> {
    let label = label.trim();
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut index = 0usize;
    for c in label.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// True when `right` is the column immediately after `left`.
pub fn are_adjacent(left: &str, right: &str) -> bool {
    match (column_index(left), column_index(right)) {
        (Some(l), Some(r)) => r == l + 1,
        _ => false,
    }
}

/// `'Tab'!` prefix, with embedded quotes doubled.
fn sheet_prefix(sheet: &str) -> String {
    format!("'{}'!", sheet.replace('\'', "''"))
}

/// Open-ended range from `first_row` down to the last filled row, e.g. `'Tab'!A2:H`.
pub fn open_range(sheet: &str, first_col: &str, last_col: &str, first_row: u32) -> String {
    format!(
        "{}{}{}:{}",
        sheet_prefix(sheet),
        first_col.trim(),
        first_row,
        last_col.trim()
    )
}

/// Closed range covering `rows` rows starting at `first_row`.
pub fn block_range(
    sheet: &str,
    first_col: &str,
    last_col: &str,
    first_row: u32,
    rows: usize,
) -> String {
    let last_row = first_row as usize + rows.max(1) - 1;
    format!(
        "{}{}{}:{}{}",
        sheet_prefix(sheet),
        first_col.trim(),
        first_row,
        last_col.trim(),
        last_row
    )
}

/// A single cell, e.g. `'Config'!G5`.
pub fn cell(sheet: &str, col: &str, row: u32) -> String {
    format!("{}{}{}", sheet_prefix(sheet), col.trim(), row)
}
