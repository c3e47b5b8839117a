//!
//! src/sheets.rs  Andrew Belles  Oct 19th, 2026
//!
//! Thin transport over the Sheets v4 values API. Knows nothing about
//! tracks; see sink.rs for what gets written and when.
//!

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use url::Url;

use crate::auth::{ServiceAccountKey, fetch_access_token};
use crate::config::{HttpConfig, SheetsConfig};
use crate::errors::{SyncError, status_error};
use crate::fetch::base_client;

pub type Row = Vec<String>;

/// One worksheet's worth of cells
#[async_trait]
pub trait Worksheet {
    /// Authenticates and selects the worksheet to use
    async fn open(&mut self) -> Result<(), SyncError>;
    /// Every non-empty row, top to bottom
    async fn get_all_values(&self) -> Result<Vec<Row>, SyncError>;
    /// Appends rows after the last one in a single request
    async fn append_rows(&self, rows: &[Row]) -> Result<(), SyncError>;
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: String,
    #[serde(default)]
    sheet_id: i64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    major_dimension: &'static str,
    values: &'a [Row],
}

/// Unformatted cells may come back as numbers or bools
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Quotes a sheet title for use in A1 notation
pub fn a1_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct GoogleWorksheet {
    http: Client,
    api_base: Url,
    spreadsheet_id: String,
    credentials: ServiceAccountKey,
    bearer: Option<String>,
    title: Option<String>,
}

impl GoogleWorksheet {
    pub fn new(http_config: &HttpConfig, cfg: &SheetsConfig) -> Result<Self, SyncError> {
        Ok( Self {
            http: base_client(http_config)?,
            api_base: cfg.api_base.clone(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            credentials: cfg.credentials.clone(),
            bearer: None,
            title: None,
        })
    }

    /// {api_base}spreadsheets/{id}/{rest...}
    pub fn spreadsheet_url(&self, rest: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("SHEETS_API_BASE cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str()])
            .extend(rest);
        Ok(url)
    }

    fn session(&self) -> Result<(&str, &str), SyncError> {
        match (self.bearer.as_deref(), self.title.as_deref()) {
            (Some(bearer), Some(title)) => Ok((bearer, title)),
            _ => Err(SyncError::Sheet("worksheet used before open".to_string())),
        }
    }

    async fn checked(&self, resp: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        match resp.status() {
            s if s.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => Err(SyncError::Sheet(
                format!("spreadsheet '{}' not found or not shared", self.spreadsheet_id)
            )),
            _ => Err(status_error("sheets", resp).await),
        }
    }
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn open(&mut self) -> Result<(), SyncError> {
        let bearer = fetch_access_token(&self.http, &self.credentials).await?;

        let mut url = self.spreadsheet_url(&[])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");
        let resp = self.http.get(url).bearer_auth(&bearer).send().await?;
        let sheet: Spreadsheet = self.checked(resp).await?.json().await?;

        let first = sheet.sheets
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Sheet(
                format!("spreadsheet '{}' has no worksheets", self.spreadsheet_id)
            ))?;

        info!(worksheet = %first.properties.title, sheet_id = first.properties.sheet_id,
            "sheets.connected");
        self.bearer = Some(bearer);
        self.title = Some(first.properties.title);
        Ok(())
    }

    async fn get_all_values(&self) -> Result<Vec<Row>, SyncError> {
        let (bearer, title) = self.session()?;
        let url = self.spreadsheet_url(&["values", a1_sheet(title).as_str()])?;
        let resp = self.http.get(url).bearer_auth(bearer).send().await?;
        let range: ValueRange = self.checked(resp).await?.json().await?;

        Ok(range.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn append_rows(&self, rows: &[Row]) -> Result<(), SyncError> {
        let (bearer, title) = self.session()?;
        let range = format!("{}:append", a1_sheet(title));
        let mut url = self.spreadsheet_url(&["values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = AppendBody { major_dimension: "ROWS", values: rows };
        let resp = self.http.post(url).bearer_auth(bearer).json(&body).send().await?;
        self.checked(resp).await?;
        Ok(())
    }
}
