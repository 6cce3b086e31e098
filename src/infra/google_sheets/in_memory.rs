// In-memory SpreadsheetClient for exercising the batch logic without Google.
//
// Values are keyed by (spreadsheet id, exact range string), so reads only see
// what a test seeded under the same range the code asks for. Writes are
// recorded separately so tests can assert on exactly what went out.

use crate::core::sheets::{SheetsError, SpreadsheetClient, ValueRange};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;

type Key = (String, String);

#[derive(Default)]
pub struct InMemorySpreadsheet {
    values: DashMap<Key, Vec<Vec<Value>>>,
    writes: DashMap<Key, Vec<Vec<Value>>>,
    batch_calls: DashMap<String, usize>,
    failing_reads: DashSet<String>,
    failing_writes: DashSet<String>,
}

impl InMemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_values(&self, spreadsheet_id: &str, range: &str, rows: Vec<Vec<Value>>) {
        self.values
            .insert((spreadsheet_id.to_string(), range.to_string()), rows);
    }

    pub fn fail_reads_of(&self, spreadsheet_id: &str) {
        self.failing_reads.insert(spreadsheet_id.to_string());
    }

    pub fn fail_writes_to(&self, spreadsheet_id: &str) {
        self.failing_writes.insert(spreadsheet_id.to_string());
    }

    /// The last values written to exactly `range`.
    pub fn written(&self, spreadsheet_id: &str, range: &str) -> Option<Vec<Vec<Value>>> {
        self.writes
            .get(&(spreadsheet_id.to_string(), range.to_string()))
            .map(|v| v.clone())
    }

    pub fn batch_calls(&self, spreadsheet_id: &str) -> usize {
        self.batch_calls
            .get(spreadsheet_id)
            .map(|n| *n)
            .unwrap_or(0)
    }

    fn permission_denied() -> SheetsError {
        SheetsError::Api {
            status: 403,
            message: "The caller does not have permission".to_string(),
        }
    }

    fn record(&self, spreadsheet_id: &str, range: &str, values: Vec<Vec<Value>>) {
        let key = (spreadsheet_id.to_string(), range.to_string());
        self.values.insert(key.clone(), values.clone());
        self.writes.insert(key, values);
    }
}

#[async_trait]
impl SpreadsheetClient for InMemorySpreadsheet {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, SheetsError> {
        if self.failing_reads.contains(spreadsheet_id) {
            return Err(Self::permission_denied());
        }

        Ok(self
            .values
            .get(&(spreadsheet_id.to_string(), range.to_string()))
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        if self.failing_writes.contains(spreadsheet_id) {
            return Err(Self::permission_denied());
        }

        self.record(spreadsheet_id, range, values);
        Ok(())
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), SheetsError> {
        if self.failing_writes.contains(spreadsheet_id) {
            return Err(Self::permission_denied());
        }

        *self
            .batch_calls
            .entry(spreadsheet_id.to_string())
            .or_insert(0) += 1;
        for range in data {
            self.record(spreadsheet_id, &range.range, range.values);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reads_see_seeded_and_written_values() {
        let sheets = InMemorySpreadsheet::new();
        sheets.set_values("s", "'Tab'!A2:A", vec![vec![json!("x")]]);

        assert_eq!(
            sheets.get_values("s", "'Tab'!A2:A").await.unwrap(),
            vec![vec![json!("x")]]
        );
        assert!(sheets.get_values("s", "'Tab'!B2:B").await.unwrap().is_empty());

        sheets
            .update_values("s", "'Tab'!B2", vec![vec![json!(1)]])
            .await
            .unwrap();
        assert_eq!(sheets.written("s", "'Tab'!B2"), Some(vec![vec![json!(1)]]));
        assert_eq!(sheets.batch_calls("s"), 0);
    }
}
