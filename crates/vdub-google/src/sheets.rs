//! Google Sheets v4 values client.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::GoogleResult;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// A1 range for a single cell (`config!L5:L5`).
pub fn cell_range(sheet: &str, column: &str, row: u32) -> String {
    format!("{sheet}!{column}{row}:{column}{row}")
}

/// A range of values, as sent to and received from the values API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// A single cell, written column-major the way the writeback expects.
    pub fn single_cell(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            major_dimension: Some("COLUMNS".to_string()),
            values: vec![vec![Value::String(value.into())]],
        }
    }

    /// Values rendered as strings (numbers and booleans are stringified).
    pub fn rows_as_strings(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'static str,
    data: &'a [ValueRange],
}

/// Response of `values.update`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: String,
    #[serde(default)]
    pub updated_cells: u64,
}

/// Response of `values.batchUpdate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub total_updated_cells: u64,
}

/// Sheets values client. Calls are never retried.
#[derive(Clone)]
pub struct SheetsClient {
    api: ApiClient,
    base_url: String,
}

impl SheetsClient {
    pub fn new(api: ApiClient) -> Self {
        Self::with_base_url(api, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api: api.without_retry(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// Read a range; an empty range yields no rows.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> GoogleResult<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range);
        let response: ValueRange = self
            .api
            .send_json::<(), _>("sheets.get_values", Method::GET, &url, None)
            .await?;

        debug!(range = %range, rows = response.values.len(), "Read sheet range");
        Ok(response.rows_as_strings())
    }

    /// Overwrite a range with raw (unparsed) values.
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        value_range: &ValueRange,
    ) -> GoogleResult<UpdateValuesResponse> {
        let url = format!(
            "{}?valueInputOption=RAW",
            self.values_url(spreadsheet_id, &value_range.range)
        );
        self.api
            .send_json("sheets.update_values", Method::PUT, &url, Some(value_range))
            .await
    }

    /// Overwrite several ranges in one call with raw values.
    pub async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
    ) -> GoogleResult<BatchUpdateValuesResponse> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        );
        let body = BatchUpdateRequest {
            value_input_option: "RAW",
            data,
        };
        self.api
            .send_json("sheets.batch_update_values", Method::POST, &url, Some(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_range() {
        assert_eq!(cell_range("config", "L", 5), "config!L5:L5");
    }

    #[test]
    fn test_single_cell_is_column_major() {
        let value = serde_json::to_value(ValueRange::single_cell("config!L2:L2", "TTS OK")).unwrap();
        assert_eq!(
            value,
            json!({
                "range": "config!L2:L2",
                "majorDimension": "COLUMNS",
                "values": [["TTS OK"]]
            })
        );
    }

    #[test]
    fn test_rows_as_strings() {
        let range: ValueRange = serde_json::from_value(json!({
            "range": "config!A1:C3",
            "majorDimension": "ROWS",
            "values": [["campaign", "topic"], ["summer", 1500, true], []]
        }))
        .unwrap();

        assert_eq!(
            range.rows_as_strings(),
            vec![
                vec!["campaign".to_string(), "topic".to_string()],
                vec!["summer".to_string(), "1500".to_string(), "true".to_string()],
                vec![],
            ]
        );
    }

    #[test]
    fn test_missing_values_is_empty() {
        let range: ValueRange = serde_json::from_value(json!({"range": "config!A1:M"})).unwrap();
        assert!(range.rows_as_strings().is_empty());
    }
}
