use crate::core::sheets::SheetsError;
use thiserror::Error;

/// Knobs for one sheet batch.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// First data row of every target sheet (row 1 holds headers).
    pub first_data_row: u32,
    /// Upper bound on geocoding requests in flight for one sheet.
    pub max_in_flight: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            first_data_row: 2,
            max_in_flight: 30,
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to read addresses from '{sheet}': {source}")]
    Read {
        sheet: String,
        #[source]
        source: SheetsError,
    },

    #[error("Failed to write coordinates to '{sheet}': {source}")]
    Write {
        sheet: String,
        #[source]
        source: SheetsError,
    },
}

/// What happened to one target sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub sheet: String,
    pub total: usize,
    pub matched: usize,
    pub no_match: usize,
    pub failed: usize,
    /// Whether the completion timestamp reached the control sheet.
    pub stamped: bool,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}
