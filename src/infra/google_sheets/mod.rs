// Google Sheets infra.
// - `sheets_api_client.rs` talks to the Sheets v4 REST API.
// - `in_memory.rs` is a map-backed stand-in for tests.

#[path = "sheets_api_client.rs"]
pub mod sheets_api_client;

#[cfg(test)]
#[path = "in_memory.rs"]
pub mod in_memory;

#[cfg(test)]
pub use in_memory::InMemorySpreadsheet;
pub use sheets_api_client::GoogleSheetsClient;
