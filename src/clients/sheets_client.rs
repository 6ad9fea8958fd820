//! Google Sheets client
//!
//! Read-only access to one worksheet, returned as header-keyed records.

use crate::clients::service_account::ServiceAccount;
use crate::config::Config;
use crate::error::SheetError;
use crate::services::roster_loader::RecordSource;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::{debug, info};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Scopes for reading a spreadsheet shared with the service account
pub const READONLY_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// One data row keyed by header cell
pub type SheetRecord = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// Sheets client bound to one worksheet
pub struct SheetsClient {
    account: ServiceAccount,
    http: reqwest::Client,
    base_url: String,
    sheet_id: String,
    tab: String,
}

impl SheetsClient {
    /// Create a client from the configured credential file
    pub async fn new(config: &Config) -> Result<Self, SheetError> {
        let http = reqwest::Client::new();
        let account = ServiceAccount::from_file(&config.credentials_file, http.clone()).await?;
        Ok(Self {
            account,
            http,
            base_url: SHEETS_API_BASE.to_string(),
            sheet_id: config.sheet_id.clone(),
            tab: config.sheet_tab.clone(),
        })
    }

    /// `values.get` address for the whole worksheet
    fn values_url(&self) -> Result<reqwest::Url, SheetError> {
        let invalid = || SheetError::InvalidEndpoint(self.base_url.clone());
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        let range = format!("'{}'", self.tab.replace('\'', "''"));
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.sheet_id.as_str(), "values", range.as_str()]);
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        Ok(url)
    }

    /// Raw value grid of the worksheet
    pub async fn fetch_values(&self) -> Result<Vec<Vec<JsonValue>>, SheetError> {
        let token = self.account.access_token(&READONLY_SCOPES).await?;
        let url = self.values_url()?;
        let endpoint = url.to_string();
        debug!("GET {}", endpoint);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetError::request_failed(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::request_failed(&endpoint, e))?;
        Ok(range.values)
    }
}

#[async_trait]
impl RecordSource for SheetsClient {
    async fn fetch_records(&self) -> Result<Vec<SheetRecord>> {
        info!("📄 Reading worksheet '{}'...", self.tab);
        let values = self.fetch_values().await?;
        if values.is_empty() {
            return Err(SheetError::EmptySheet {
                tab: self.tab.clone(),
            }
            .into());
        }
        let records = records_from_values(values);
        info!("✓ {} rows read", records.len());
        Ok(records)
    }
}

/// Turn a value grid into records keyed by the first row
///
/// Short rows are padded with empty cells; the API drops trailing blanks.
pub fn records_from_values(values: Vec<Vec<JsonValue>>) -> Vec<SheetRecord> {
    let mut rows = values.into_iter();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect();

    rows.map(|row| {
        headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(i, header)| {
                let value = row.get(i).map(cell_text).unwrap_or_default();
                (header.clone(), value)
            })
            .collect()
    })
    .collect()
}

fn cell_text(cell: &JsonValue) -> String {
    match cell {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::service_account::ServiceAccountKey;
    use serde_json::json;

    #[test]
    fn test_records_are_keyed_by_trimmed_headers() {
        let values = vec![
            vec![json!("FECHA"), json!(" RUT "), json!("EDIFICIO")],
            vec![json!("01/06/2024"), json!(12345678), json!("A")],
        ];
        let records = records_from_values(values);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["FECHA"], "01/06/2024");
        assert_eq!(records[0]["RUT"], "12345678");
        assert_eq!(records[0]["EDIFICIO"], "A");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let values = vec![
            vec![json!("APELLIDO"), json!("NOMBRE"), json!("GENERO")],
            vec![json!("Soto")],
        ];
        let records = records_from_values(values);
        assert_eq!(records[0]["APELLIDO"], "Soto");
        assert_eq!(records[0]["NOMBRE"], "");
        assert_eq!(records[0]["GENERO"], "");
    }

    #[test]
    fn test_empty_grid_has_no_records() {
        assert!(records_from_values(Vec::new()).is_empty());
        assert!(records_from_values(vec![vec![json!("FECHA")]]).is_empty());
    }

    #[test]
    fn test_values_url_quotes_the_tab() {
        let client = SheetsClient {
            account: ServiceAccount::new(
                ServiceAccountKey {
                    client_email: "bot@demo".to_string(),
                    private_key: String::new(),
                    token_uri: "https://oauth2.googleapis.com/token".to_string(),
                },
                reqwest::Client::new(),
            ),
            http: reqwest::Client::new(),
            base_url: SHEETS_API_BASE.to_string(),
            sheet_id: "abc123".to_string(),
            tab: "Asistencia 2024".to_string(),
        };
        let url = client.values_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Asistencia%202024'?valueRenderOption=FORMATTED_VALUE"
        );
    }
}
