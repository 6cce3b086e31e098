// Sheet batch processor - geocodes one target sheet end to end.
//
// read address column -> geocode every row (bounded fan-out) -> one batched
// write of the output columns -> completion timestamp on the control sheet.
//
// Row N of the output always lines up with row N of the input. Anything that
// goes wrong for a single address becomes a sentinel row, never a gap.

use super::batch_models::{BatchError, BatchReport, BatchSettings};
use crate::core::geocoding::{AddressGeocoder, GeocodeOutcome, GeocodingProvider};
use crate::core::sheets::a1_notation;
use crate::core::sheets::sheets_models::cell_text;
use crate::core::sheets::{ControlSheet, SheetConfig, SpreadsheetClient, ValueRange};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Control-sheet column that receives the completion timestamp.
pub const TIMESTAMP_COLUMN: &str = "G";

pub struct SheetBatchProcessor<C: SpreadsheetClient, P: GeocodingProvider> {
    sheets: Arc<C>,
    geocoder: Arc<AddressGeocoder<P>>,
    control: ControlSheet,
    settings: BatchSettings,
}

impl<C, P> SheetBatchProcessor<C, P>
where
    C: SpreadsheetClient,
    P: GeocodingProvider + 'static,
{
    pub fn new(
        sheets: Arc<C>,
        geocoder: Arc<AddressGeocoder<P>>,
        control: ControlSheet,
        settings: BatchSettings,
    ) -> Self {
        Self {
            sheets,
            geocoder,
            control,
            settings,
        }
    }

    /// Geocode every address of `config` and write the results back.
    pub async fn process(&self, config: &SheetConfig) -> Result<BatchReport, BatchError> {
        let addresses = self.read_addresses(config).await?;
        tracing::info!(sheet = %config.name, addresses = addresses.len(), "Geocoding sheet");

        let outcomes = self.geocode_all(&config.name, addresses).await;

        let mut report = BatchReport {
            sheet: config.name.clone(),
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            match outcome {
                GeocodeOutcome::Matched(_) => report.matched += 1,
                GeocodeOutcome::NoMatch => report.no_match += 1,
                GeocodeOutcome::Failed(_) => report.failed += 1,
            }
        }

        if !outcomes.is_empty() {
            let data = output_ranges(config, self.settings.first_data_row, &outcomes);
            self.sheets
                .batch_update_values(&config.id, data)
                .await
                .map_err(|source| BatchError::Write {
                    sheet: config.name.clone(),
                    source,
                })?;
        }

        report.stamped = self.stamp_completion(config).await;
        Ok(report)
    }

    async fn read_addresses(&self, config: &SheetConfig) -> Result<Vec<String>, BatchError> {
        let range = a1_notation::open_range(
            &config.name,
            &config.search_term_column,
            &config.search_term_column,
            self.settings.first_data_row,
        );

        let rows = self
            .sheets
            .get_values(&config.id, &range)
            .await
            .map_err(|source| BatchError::Read {
                sheet: config.name.clone(),
                source,
            })?;

        Ok(rows.iter().map(|row| cell_text(row.first())).collect())
    }

    /// Geocode all addresses concurrently, at most `max_in_flight` at a time,
    /// and return the outcomes in input order.
    async fn geocode_all(&self, sheet: &str, addresses: Vec<String>) -> Vec<GeocodeOutcome> {
        let permits = Arc::new(Semaphore::new(self.settings.max_in_flight.max(1)));
        let mut slots: Vec<Option<GeocodeOutcome>> = vec![None; addresses.len()];
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.into_iter().enumerate() {
            // Wait for a free slot before spawning so the task count stays bounded too.
            let permit = Arc::clone(&permits).acquire_owned().await.ok();
            let geocoder = Arc::clone(&self.geocoder);
            tasks.spawn(async move {
                let outcome = geocoder.geocode(&address).await;
                drop(permit);
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!(sheet, error = %e, "Geocoding task did not finish"),
            }
        }

        fill_missing(slots)
    }

    /// Write the completion timestamp. Failure is logged and reported as `false`.
    async fn stamp_completion(&self, config: &SheetConfig) -> bool {
        let range = a1_notation::cell(
            &self.control.sheet_name,
            TIMESTAMP_COLUMN,
            config.control_row,
        );
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        match self
            .sheets
            .update_values(
                &self.control.spreadsheet_id,
                &range,
                vec![vec![Value::from(stamp)]],
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(sheet = %config.name, error = %e, "Failed to record completion time");
                false
            }
        }
    }
}

/// Replace slots whose task never reported with a failure, keeping positions.
fn fill_missing(slots: Vec<Option<GeocodeOutcome>>) -> Vec<GeocodeOutcome> {
    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| GeocodeOutcome::Failed("geocoding task did not finish".into()))
        })
        .collect()
}

/// Ranges for one batched write of the output columns.
///
/// Adjacent longitude/latitude columns are written as one `[lng, lat]` block;
/// otherwise each gets its own single-column range. The error column, when
/// configured, rides along in the same request.
fn output_ranges(
    config: &SheetConfig,
    first_row: u32,
    outcomes: &[GeocodeOutcome],
) -> Vec<ValueRange> {
    let rows = outcomes.len();
    let mut data = Vec::with_capacity(3);

    if a1_notation::are_adjacent(&config.long_column, &config.lat_column) {
        data.push(ValueRange::rows(
            a1_notation::block_range(
                &config.name,
                &config.long_column,
                &config.lat_column,
                first_row,
                rows,
            ),
            outcomes
                .iter()
                .map(|o| o.coordinate_cells().to_vec())
                .collect(),
        ));
    } else {
        let (longitudes, latitudes): (Vec<_>, Vec<_>) = outcomes
            .iter()
            .map(|o| {
                let [lng, lat] = o.coordinate_cells();
                (vec![lng], vec![lat])
            })
            .unzip();

        for (column, values) in [(&config.long_column, longitudes), (&config.lat_column, latitudes)] {
            data.push(ValueRange::rows(
                a1_notation::block_range(&config.name, column, column, first_row, rows),
                values,
            ));
        }
    }

    if let Some(column) = &config.error_column {
        data.push(ValueRange::rows(
            a1_notation::block_range(&config.name, column, column, first_row, rows),
            outcomes.iter().map(|o| vec![o.error_cell()]).collect(),
        ));
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geocoding::{GeocodeError, SearchResponse};
    use crate::infra::google_sheets::InMemorySpreadsheet;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers from a fixed table; unknown addresses fail at the transport level.
    struct TableProvider {
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<String>>>,
        delay: Duration,
    }

    impl TableProvider {
        fn new() -> Self {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: Arc::new(AtomicUsize::new(0)),
                seen: Arc::new(Mutex::new(Vec::new())),
                delay,
            }
        }
    }

    #[async_trait]
    impl GeocodingProvider for TableProvider {
        async fn search(&self, address: &str) -> Result<SearchResponse, GeocodeError> {
            self.seen.lock().unwrap().push(address.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let body = match address {
                "123 Main St" => {
                    json!({"features": [{"geometry": {"coordinates": [-71.05, 42.36]}}]})
                }
                "1 Beacon St" => {
                    json!({"features": [{"geometry": {"coordinates": [-71.06, 42.35]}}]})
                }
                "Nowhere Particular" => json!({"features": []}),
                _ => return Err(GeocodeError::Transport("connection refused".into())),
            };
            serde_json::from_value(body).map_err(|e| GeocodeError::Decode(e.to_string()))
        }
    }

    fn config(long: &str, lat: &str, error: Option<&str>) -> SheetConfig {
        SheetConfig {
            id: "ABC123".into(),
            name: "Sheet1".into(),
            search_term_column: "A".into(),
            long_column: long.into(),
            lat_column: lat.into(),
            error_column: error.map(str::to_string),
            last_geocoded_at: None,
            disable_geocoding: String::new(),
            control_row: 3,
        }
    }

    fn addresses(cells: &[&str]) -> Vec<Vec<Value>> {
        cells
            .iter()
            .map(|c| if c.is_empty() { vec![] } else { vec![json!(c)] })
            .collect()
    }

    fn processor(
        sheets: Arc<InMemorySpreadsheet>,
        provider: TableProvider,
        max_in_flight: usize,
    ) -> SheetBatchProcessor<InMemorySpreadsheet, TableProvider> {
        SheetBatchProcessor::new(
            sheets,
            Arc::new(AddressGeocoder::new(provider)),
            ControlSheet::new("control", "Config"),
            BatchSettings {
                first_data_row: 2,
                max_in_flight,
            },
        )
    }

    #[tokio::test]
    async fn test_writes_matches_and_sentinels_in_input_order() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values(
            "ABC123",
            "'Sheet1'!A2:A",
            addresses(&["123 Main St", "Nowhere Particular"]),
        );

        let report = processor(Arc::clone(&sheets), TableProvider::new(), 10)
            .process(&config("B", "C", None))
            .await
            .unwrap();

        assert_eq!(
            sheets.written("ABC123", "'Sheet1'!B2:C3"),
            Some(vec![
                vec![json!(-71.05), json!(42.36)],
                vec![json!("Error"), json!("Error")],
            ])
        );
        assert_eq!(report.total, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.no_match, 1);
        assert!(report.stamped);
        assert_eq!(sheets.batch_calls("ABC123"), 1);
    }

    #[tokio::test]
    async fn test_transport_failures_and_blank_rows_keep_alignment() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values(
            "ABC123",
            "'Sheet1'!A2:A",
            addresses(&["123 Main St", "", "unreachable", "1 Beacon St"]),
        );

        let provider = TableProvider::new();
        let seen = Arc::clone(&provider.seen);

        let report = processor(Arc::clone(&sheets), provider, 2)
            .process(&config("B", "C", None))
            .await
            .unwrap();

        let written = sheets.written("ABC123", "'Sheet1'!B2:C5").unwrap();
        assert_eq!(written.len(), 4);
        assert_eq!(written[0], vec![json!(-71.05), json!(42.36)]);
        assert_eq!(written[1], vec![json!("Error"), json!("Error")]);
        assert_eq!(written[2], vec![json!("Error"), json!("Error")]);
        assert_eq!(written[3], vec![json!(-71.06), json!(42.35)]);
        assert_eq!(report.no_match, 1);
        assert_eq!(report.failed, 1);

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["1 Beacon St", "123 Main St", "unreachable"]);
    }

    #[tokio::test]
    async fn test_split_columns_and_error_column_share_one_batch() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values(
            "ABC123",
            "'Sheet1'!A2:A",
            addresses(&["123 Main St", "Nowhere Particular", "unreachable"]),
        );

        processor(Arc::clone(&sheets), TableProvider::new(), 4)
            .process(&config("E", "C", Some("H")))
            .await
            .unwrap();

        assert_eq!(sheets.batch_calls("ABC123"), 1);
        assert_eq!(
            sheets.written("ABC123", "'Sheet1'!E2:E4"),
            Some(vec![vec![json!(-71.05)], vec![json!("Error")], vec![json!("Error")]])
        );
        assert_eq!(
            sheets.written("ABC123", "'Sheet1'!C2:C4"),
            Some(vec![vec![json!(42.36)], vec![json!("Error")], vec![json!("Error")]])
        );

        let errors = sheets.written("ABC123", "'Sheet1'!H2:H4").unwrap();
        assert_eq!(errors[0], vec![json!("")]);
        assert_eq!(errors[1], vec![json!("No match")]);
        assert!(errors[2][0].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_completion_timestamp_lands_on_the_control_row() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values("ABC123", "'Sheet1'!A2:A", addresses(&["123 Main St"]));

        processor(Arc::clone(&sheets), TableProvider::new(), 1)
            .process(&config("B", "C", None))
            .await
            .unwrap();

        let stamp = sheets.written("control", "'Config'!G3").unwrap();
        let text = stamp[0][0].as_str().unwrap();
        assert!(text.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
    }

    #[tokio::test]
    async fn test_write_failure_skips_the_timestamp() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values("ABC123", "'Sheet1'!A2:A", addresses(&["123 Main St"]));
        sheets.fail_writes_to("ABC123");

        let result = processor(Arc::clone(&sheets), TableProvider::new(), 1)
            .process(&config("B", "C", None))
            .await;

        assert!(matches!(result, Err(BatchError::Write { .. })));
        assert_eq!(sheets.written("control", "'Config'!G3"), None);
    }

    #[tokio::test]
    async fn test_failed_stamp_does_not_fail_the_batch() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.set_values("ABC123", "'Sheet1'!A2:A", addresses(&["123 Main St"]));
        sheets.fail_writes_to("control");

        let report = processor(Arc::clone(&sheets), TableProvider::new(), 1)
            .process(&config("B", "C", None))
            .await
            .unwrap();

        assert!(!report.stamped);
        assert!(sheets.written("ABC123", "'Sheet1'!B2:C2").is_some());
    }

    #[tokio::test]
    async fn test_empty_sheet_writes_only_the_timestamp() {
        let sheets = Arc::new(InMemorySpreadsheet::new());

        let report = processor(Arc::clone(&sheets), TableProvider::new(), 1)
            .process(&config("B", "C", None))
            .await
            .unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(sheets.batch_calls("ABC123"), 0);
        assert!(report.stamped);
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        sheets.fail_reads_of("ABC123");

        let result = processor(sheets, TableProvider::new(), 1)
            .process(&config("B", "C", None))
            .await;

        assert!(matches!(result, Err(BatchError::Read { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_respects_the_in_flight_bound() {
        let sheets = Arc::new(InMemorySpreadsheet::new());
        let many: Vec<&str> = std::iter::repeat("123 Main St").take(25).collect();
        sheets.set_values("ABC123", "'Sheet1'!A2:A", addresses(&many));

        let provider = TableProvider::with_delay(Duration::from_millis(100));
        let peak = Arc::clone(&provider.peak);
        let processor = SheetBatchProcessor::new(
            Arc::clone(&sheets),
            Arc::new(AddressGeocoder::new(provider)),
            ControlSheet::new("control", "Config"),
            BatchSettings {
                first_data_row: 2,
                max_in_flight: 4,
            },
        );

        let report = processor.process(&config("B", "C", None)).await.unwrap();

        assert_eq!(report.matched, 25);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in-flight was {peak}");
        assert!(peak > 1, "requests never overlapped");
    }
}
