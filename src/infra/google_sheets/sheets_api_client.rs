// =============================================================================
// GOOGLE SHEETS v4 VALUES CLIENT
// =============================================================================
//
// Thin wrapper over the three `spreadsheets.values` calls the batch needs:
//
// - GET  /v4/spreadsheets/{id}/values/{range}
// - PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW
// - POST /v4/spreadsheets/{id}/values:batchUpdate
//
// Every request carries a bearer token from the injected CredentialProvider.
// Writes use RAW input so coordinates land as numbers and "Error" as text,
// without Sheets trying to parse anything.

use crate::core::auth::CredentialProvider;
use crate::core::sheets::{SheetsError, SpreadsheetClient, ValueRange};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest {
    value_input_option: &'static str,
    data: Vec<ValueRange>,
}

/// Error envelope Google APIs return on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct GoogleSheetsClient<A: CredentialProvider> {
    client: Client,
    auth: A,
    base_url: String,
}

impl<A: CredentialProvider> GoogleSheetsClient<A> {
    pub fn new(auth: A) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url,
            spreadsheet_id,
            encode_range(range)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let token = self.auth.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            status,
            message: api_error_message(&text),
        })
    }
}

/// The provider's own error message when the body has one, else the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Characters left as-is in a range path segment. `!` and `:` stay readable
/// since they carry the A1 structure.
const RANGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b':');

/// Percent-encode an A1 range for use as a path segment.
fn encode_range(range: &str) -> String {
    utf8_percent_encode(range, RANGE_ENCODE_SET).to_string()
}

#[async_trait]
impl<A: CredentialProvider> SpreadsheetClient for GoogleSheetsClient<A> {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, SheetsError> {
        tracing::debug!(spreadsheet_id, range, "Reading values");

        let url = self.values_url(spreadsheet_id, range);
        let response = self.send(self.client.get(url)).await?;
        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Decode(e.to_string()))?;

        Ok(body.values)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        tracing::debug!(spreadsheet_id, range, rows = values.len(), "Writing values");

        let url = self.values_url(spreadsheet_id, range);
        let body = ValueRange::rows(range, values);
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;

        Ok(())
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), SheetsError> {
        tracing::debug!(spreadsheet_id, ranges = data.len(), "Batch writing values");

        let url = format!("{}/{}/values:batchUpdate", self.base_url, spreadsheet_id);
        let body = BatchUpdateRequest {
            value_input_option: "RAW",
            data,
        };
        self.send(self.client.post(url).json(&body)).await?;

        Ok(())
    }
}
