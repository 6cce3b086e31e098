// Control-sheet reader.
//
// Each control-sheet row describes one target sheet:
//
//   A: spreadsheet URL   B: tab name        C: address column
//   D: longitude column  E: latitude column F: error column (optional)
//   G: last geocoded at  H: disable geocoding ("Y" / "Yes")
//
// The Sheets API drops trailing empty cells, so F..H are often absent.

use super::a1_notation;
use super::sheets_client::{SheetsError, SpreadsheetClient};
use super::sheets_models::{cell_text, ControlSheet, SheetConfig};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// First data row of the control sheet (row 1 is the header).
pub const CONTROL_FIRST_ROW: u32 = 2;

const REQUIRED_FIELDS: [&str; 5] = [
    "spreadsheet URL",
    "sheet name",
    "search column",
    "longitude column",
    "latitude column",
];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Control row {row} is malformed: {reason}")]
    MalformedRow { row: u32, reason: String },
}

pub struct ConfigSheetReader<C: SpreadsheetClient> {
    client: Arc<C>,
    control: ControlSheet,
}

impl<C: SpreadsheetClient> ConfigSheetReader<C> {
    pub fn new(client: Arc<C>, control: ControlSheet) -> Self {
        Self { client, control }
    }

    /// Read every control row. A failed read is an error for the whole run;
    /// individual bad rows are logged and left out.
    pub async fn read_configs(&self) -> Result<Vec<SheetConfig>, SheetsError> {
        let range = a1_notation::open_range(&self.control.sheet_name, "A", "H", CONTROL_FIRST_ROW);
        let rows = self
            .client
            .get_values(&self.control.spreadsheet_id, &range)
            .await?;

        let mut configs = Vec::with_capacity(rows.len());
        for (offset, row) in rows.iter().enumerate() {
            let row_number = CONTROL_FIRST_ROW + offset as u32;

            if row.iter().all(|cell| cell_text(Some(cell)).trim().is_empty()) {
                continue;
            }

            match parse_config_row(row, row_number) {
                Ok(config) => configs.push(config),
                Err(e) => {
                    tracing::warn!(control_sheet = %self.control.sheet_name, "Skipping row: {}", e)
                }
            }
        }

        tracing::info!(
            control_sheet = %self.control.sheet_name,
            rows = rows.len(),
            configs = configs.len(),
            "Loaded sheet configuration"
        );
        Ok(configs)
    }
}

/// Build a `SheetConfig` from one control row.
pub fn parse_config_row(row: &[Value], row_number: u32) -> Result<SheetConfig, ConfigError> {
    let malformed = |reason: String| ConfigError::MalformedRow {
        row: row_number,
        reason,
    };

    let text = |i: usize| cell_text(row.get(i)).trim().to_string();
    let optional = |i: usize| Some(text(i)).filter(|s| !s.is_empty());

    for (i, field) in REQUIRED_FIELDS.iter().enumerate() {
        if text(i).is_empty() {
            return Err(malformed(format!("missing {field}")));
        }
    }

    let url = text(0);
    let id = extract_spreadsheet_id(&url)
        .ok_or_else(|| malformed(format!("no spreadsheet id in {url:?}")))?;

    Ok(SheetConfig {
        id,
        name: text(1),
        search_term_column: text(2),
        long_column: text(3),
        lat_column: text(4),
        error_column: optional(5),
        last_geocoded_at: optional(6),
        // Compared verbatim, so padding keeps a sheet enabled.
        disable_geocoding: cell_text(row.get(7)),
        control_row: row_number,
    })
}

/// Pull the spreadsheet id out of a sheet URL.
///
/// `https://docs.google.com/spreadsheets/d/<ID>/edit#gid=0` splits on `/` into
/// `["https:", "", "docs.google.com", "spreadsheets", "d", "<ID>", ...]`, so the id
/// is segment 5. A bare id is returned unchanged.
pub fn extract_spreadsheet_id(url_or_id: &str) -> Option<String> {
    let url_or_id = url_or_id.trim();

    if !url_or_id.contains('/') {
        return (!url_or_id.is_empty() && !url_or_id.contains(char::is_whitespace))
            .then(|| url_or_id.to_string());
    }

    let segments: Vec<&str> = url_or_id.split('/').collect();
    match segments.as_slice() {
        [_, _, _, "spreadsheets", "d", id, ..] => {
            // Drop any query or fragment glued onto the id segment.
            let id = id.split(['?', '#']).next().unwrap_or_default();
            (!id.is_empty()).then(|| id.to_string())
        }
        _ => None,
    }
}
