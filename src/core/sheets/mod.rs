pub mod a1_notation;
pub mod config_reader;
pub mod sheets_client;
pub mod sheets_models;

pub use config_reader::ConfigSheetReader;
pub use sheets_client::{SheetsError, SpreadsheetClient};
pub use sheets_models::{ControlSheet, SheetConfig, ValueRange};
