// Orchestrator - one geocoding run across every configured sheet.
//
// Reading the control sheet is the only step allowed to fail the run. After
// that, each sheet succeeds or fails on its own and the run keeps going.

use super::batch_models::RunSummary;
use super::batch_processor::SheetBatchProcessor;
use crate::core::geocoding::GeocodingProvider;
use crate::core::sheets::{ConfigSheetReader, SheetsError, SpreadsheetClient};

pub struct Orchestrator<C: SpreadsheetClient, P: GeocodingProvider> {
    reader: ConfigSheetReader<C>,
    processor: SheetBatchProcessor<C, P>,
}

impl<C, P> Orchestrator<C, P>
where
    C: SpreadsheetClient,
    P: GeocodingProvider + 'static,
{
    pub fn new(reader: ConfigSheetReader<C>, processor: SheetBatchProcessor<C, P>) -> Self {
        Self { reader, processor }
    }

    pub async fn run(&self) -> Result<RunSummary, SheetsError> {
        let configs = self.reader.read_configs().await?;
        let mut summary = RunSummary::default();

        for config in configs {
            if config.is_disabled() {
                tracing::info!(sheet = %config.name, "Geocoding disabled, skipping");
                summary.skipped += 1;
                continue;
            }

            match self.processor.process(&config).await {
                Ok(report) => {
                    tracing::info!(
                        sheet = %report.sheet,
                        total = report.total,
                        matched = report.matched,
                        no_match = report.no_match,
                        failed = report.failed,
                        stamped = report.stamped,
                        "Sheet geocoded"
                    );
                    summary.processed += 1;
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Geocoding run finished"
        );
        Ok(summary)
    }
}
