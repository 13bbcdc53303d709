use crate::error::{GatewayError, Result};
use crate::{header_from_cells, records_from_grid, SheetGateway, SheetSnapshot};
use async_trait::async_trait;
use casedesk_protocol::Row;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct SheetsApiConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    /// OAuth access token with the spreadsheets scope. Minting it is left to
    /// the deployment (service account tooling, metadata server, ...).
    pub access_token: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 REST client.
pub struct SheetsApiGateway {
    client: Client,
    cfg: SheetsApiConfig,
}

impl SheetsApiGateway {
    pub fn new(cfg: SheetsApiConfig) -> Result<Self> {
        if cfg.spreadsheet_id.trim().is_empty() {
            return Err(GatewayError::Unavailable(
                "spreadsheet id must be non-empty".to_string(),
            ));
        }
        if cfg.access_token.trim().is_empty() {
            return Err(GatewayError::Unavailable(
                "access token must be non-empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { client, cfg })
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url> {
        spreadsheet_url(&self.cfg.base_url, &self.cfg.spreadsheet_id, tail)
    }

    async fn send<T: DeserializeOwned>(&self, sheet: &str, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.cfg.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(sheet, status, &body))
    }

    async fn values(&self, title: &str, range: Option<&str>) -> Result<Vec<Vec<Value>>> {
        let url = self.spreadsheet_url(&["values", &a1_range(title, range)])?;
        let range: ValueRange = self.send(title, self.client.get(url)).await?;
        Ok(range.values)
    }
}

#[async_trait]
impl SheetGateway for SheetsApiGateway {
    async fn list_sheets(&self) -> Result<Vec<String>> {
        let mut url = self.spreadsheet_url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.send("", self.client.get(url)).await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|entry| entry.properties.title)
            .collect())
    }

    async fn header_row(&self, title: &str) -> Result<Vec<String>> {
        let grid = self.values(title, Some("1:1")).await?;
        Ok(grid
            .first()
            .map(|cells| header_from_cells(cells))
            .unwrap_or_default())
    }

    async fn all_records(&self, title: &str) -> Result<Vec<Row>> {
        Ok(self.read_sheet(title).await?.records)
    }

    // One values call serves both header and records.
    async fn read_sheet(&self, title: &str) -> Result<SheetSnapshot> {
        let grid = self.values(title, None).await?;
        let headers = grid
            .first()
            .map(|cells| header_from_cells(cells))
            .unwrap_or_default();
        let records = records_from_grid(&headers, grid.get(1..).unwrap_or_default());
        Ok(SheetSnapshot {
            title: title.to_string(),
            headers,
            records,
        })
    }

    async fn append_row(&self, title: &str, values: Vec<String>) -> Result<()> {
        let segment = format!("{}:append", a1_range(title, None));
        let mut url = self.spreadsheet_url(&["values", &segment])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "values": [values] });
        let _: Value = self
            .send(title, self.client.post(url).json(&body))
            .await?;
        log::debug!("Appended row to sheet {title}");
        Ok(())
    }

    async fn create_sheet(&self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let url = spreadsheet_url(
            &self.cfg.base_url,
            &format!("{}:batchUpdate", self.cfg.spreadsheet_id),
            &[],
        )?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });
        let _: Value = self
            .send(title, self.client.post(url).json(&body))
            .await?;
        log::info!("Created sheet {title} ({rows}x{cols})");
        Ok(())
    }
}

fn spreadsheet_url(base: &str, spreadsheet: &str, tail: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| GatewayError::Unavailable(format!("invalid API base url {base}: {err}")))?;
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            GatewayError::Unavailable(format!("API base url cannot take a path: {base}"))
        })?;
        segments.pop_if_empty().push("spreadsheets").push(spreadsheet);
        for segment in tail {
            segments.push(segment);
        }
    }
    Ok(url)
}

/// A1 range for a whole sheet or a sub-range of it. Titles are always quoted
/// so spaces and punctuation survive.
fn a1_range(title: &str, range: Option<&str>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match range {
        Some(range) => format!("{quoted}!{range}"),
        None => quoted,
    }
}

fn classify_failure(sheet: &str, status: StatusCode, body: &str) -> GatewayError {
    match status {
        StatusCode::NOT_FOUND => GatewayError::SheetNotFound(sheet.to_string()),
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
            GatewayError::SheetNotFound(sheet.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Unavailable(format!("authorization rejected ({status})"))
        }
        _ => {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            GatewayError::Unavailable(format!("{status}: {preview}"))
        }
    }
}
