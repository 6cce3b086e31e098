use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Disable-flag values that take a sheet out of the run. Matched exactly.
const DISABLED_FLAGS: [&str; 2] = ["Y", "Yes"];

/// One target sheet, as described by a row of the control sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Spreadsheet id (the `/d/<id>/` segment of the sheet URL).
    pub id: String,
    /// Tab name inside the spreadsheet.
    pub name: String,
    pub search_term_column: String,
    pub long_column: String,
    pub lat_column: String,
    pub error_column: Option<String>,
    /// Informational only; written by previous runs.
    pub last_geocoded_at: Option<String>,
    pub disable_geocoding: String,
    /// 1-based control-sheet row this config was read from.
    pub control_row: u32,
}

impl SheetConfig {
    pub fn is_disabled(&self) -> bool {
        DISABLED_FLAGS.contains(&self.disable_geocoding.as_str())
    }
}

/// Where the control sheet lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSheet {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl ControlSheet {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

/// A rectangular write: A1 range plus row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default = "rows_dimension")]
    pub major_dimension: String,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

fn rows_dimension() -> String {
    "ROWS".to_string()
}

impl ValueRange {
    pub fn rows(range: impl Into<String>, values: Vec<Vec<Value>>) -> Self {
        Self {
            range: range.into(),
            major_dimension: rows_dimension(),
            values,
        }
    }
}

/// Text content of a cell as the Sheets API hands it back.
///
/// Formatted values arrive as strings, but unformatted reads can carry numbers
/// and booleans, so those are stringified too.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
