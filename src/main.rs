// This is the entry point of the sheet geocoder.
//
// **Architecture Overview:**
// - `core/` = Business logic (control sheet parsing, batching, outcomes)
// - `infra/` = Implementations of core traits (Google Sheets, Pelias, auth)
//
// This file's job is to:
// 1. Load configuration
// 2. Authenticate with Google once, before any sheet is touched
// 3. Initialize services (dependency injection)
// 4. Run one geocoding pass over every configured sheet
//
// Failures are reported through the log. The process exits normally either way.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::core::auth::CredentialProvider;
use crate::core::batch::{BatchSettings, Orchestrator, SheetBatchProcessor};
use crate::core::geocoding::AddressGeocoder;
use crate::core::sheets::{ConfigSheetReader, ControlSheet};
use crate::infra::google_auth;
use crate::infra::google_sheets::GoogleSheetsClient;
use crate::infra::http::RateLimitedFetcher;
use crate::infra::pelias::{PeliasClient, DEFAULT_BASE_URL};

const DEFAULT_CONTROL_SHEET: &str = "Config";
const DEFAULT_REQUESTS_PER_SECOND: u32 = 30;
const DEFAULT_MAX_IN_FLIGHT: usize = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Numeric env var, falling back to `default` when unset or unparseable.
fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

async fn run() -> anyhow::Result<()> {
    let control_spreadsheet_id = std::env::var("CONTROL_SPREADSHEET_ID")
        .context("Missing CONTROL_SPREADSHEET_ID environment variable")?;
    let control_sheet_name = std::env::var("CONTROL_SHEET_NAME")
        .unwrap_or_else(|_| DEFAULT_CONTROL_SHEET.to_string());
    let geocoder_base_url =
        std::env::var("GEOCODER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let requests_per_second =
        env_number("GEOCODER_REQUESTS_PER_SECOND", DEFAULT_REQUESTS_PER_SECOND).max(1);
    let max_in_flight = env_number("GEOCODER_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT).max(1);
    let timeout = Duration::from_secs(env_number("GEOCODER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS));

    // ========================================================================
    // AUTHENTICATION
    // ========================================================================
    // Done up front so an interactive consent prompt (first run) happens
    // before any work starts, and a bad credential aborts the run cleanly.

    let auth = google_auth::provider_from_env()
        .await
        .context("Failed to load Google credentials")?;
    auth.access_token()
        .await
        .context("Failed to obtain a Google access token")?;
    tracing::info!("Authenticated with Google");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let sheets = Arc::new(GoogleSheetsClient::new(auth));

    let fetcher = RateLimitedFetcher::new(requests_per_second, timeout)
        .context("Failed to build HTTP client")?;
    let geocoder = Arc::new(AddressGeocoder::new(PeliasClient::new(
        fetcher,
        &geocoder_base_url,
    )));

    let control = ControlSheet::new(control_spreadsheet_id, control_sheet_name);
    let reader = ConfigSheetReader::new(Arc::clone(&sheets), control.clone());
    let processor = SheetBatchProcessor::new(
        Arc::clone(&sheets),
        geocoder,
        control,
        BatchSettings {
            max_in_flight,
            ..Default::default()
        },
    );

    tracing::info!(
        geocoder = %geocoder_base_url,
        requests_per_second,
        max_in_flight,
        "Starting geocoding run"
    );

    Orchestrator::new(reader, processor)
        .run()
        .await
        .context("Failed to read the control sheet")?;

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
    }
}
