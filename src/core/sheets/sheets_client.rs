use super::sheets_models::ValueRange;
use crate::core::auth::AuthError;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Sheets request failed: {0}")]
    Transport(String),

    #[error("Could not decode Sheets response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Spreadsheet reads and writes, in terms of A1 ranges and row-major values.
#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
    /// Rows of the range, top to bottom. Trailing empty rows and cells are
    /// omitted by the API, interior empty rows come back as empty vectors.
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, SheetsError>;

    /// Overwrite exactly `range` with `values`.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError>;

    /// Overwrite several ranges of one spreadsheet in a single request.
    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), SheetsError>;
}
