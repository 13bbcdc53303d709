//! # Casedesk Gateway
//!
//! The seam between casedesk and the remote spreadsheet that stores cases.
//!
//! ## Architecture
//!
//! ```text
//! SheetGateway (async trait)
//!     │
//!     ├──> MemoryGateway     in-process grid store, JSON fixtures, read counters
//!     │
//!     └──> SheetsApiGateway  Google Sheets v4 REST (reqwest, bearer token)
//! ```
//!
//! Every implementation exposes a sheet as a grid whose first row is the
//! header; [`records_from_grid`] turns the remaining rows into keyed records.

mod error;
mod memory;
mod sheets_api;

use async_trait::async_trait;
use casedesk_protocol::Row;
use serde_json::Value;

pub use error::{GatewayError, Result};
pub use memory::{FixtureSheet, GatewayFixture, MemoryGateway};
pub use sheets_api::{SheetsApiConfig, SheetsApiGateway, DEFAULT_SHEETS_API_BASE};

/// Header row plus keyed records of one worksheet, as read in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetSnapshot {
    pub title: String,
    pub headers: Vec<String>,
    pub records: Vec<Row>,
}

#[async_trait]
pub trait SheetGateway: Send + Sync {
    /// Titles of every worksheet in the spreadsheet, configured or not.
    async fn list_sheets(&self) -> Result<Vec<String>>;

    async fn header_row(&self, title: &str) -> Result<Vec<String>>;

    async fn all_records(&self, title: &str) -> Result<Vec<Row>>;

    async fn append_row(&self, title: &str, values: Vec<String>) -> Result<()>;

    async fn create_sheet(&self, title: &str, rows: u32, cols: u32) -> Result<()>;

    async fn read_sheet(&self, title: &str) -> Result<SheetSnapshot> {
        let headers = self.header_row(title).await?;
        let records = self.all_records(title).await?;
        Ok(SheetSnapshot {
            title: title.to_string(),
            headers,
            records,
        })
    }
}

/// Key every data row by the header row. Short rows are padded with `""`,
/// cells past the last header are dropped.
pub fn records_from_grid(headers: &[String], rows: &[Vec<Value>]) -> Vec<Row> {
    rows.iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let cell = cells
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    (header.clone(), cell)
                })
                .collect()
        })
        .collect()
}

/// Header cells come back as JSON values; render them as column names.
pub fn header_from_cells(cells: &[Value]) -> Vec<String> {
    cells
        .iter()
        .map(|cell| match cell {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}
