use crate::error::{GatewayError, Result};
use crate::{header_from_cells, records_from_grid, SheetGateway};
use async_trait::async_trait;
use casedesk_protocol::Row;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// On-disk description of a spreadsheet, used to seed a [`MemoryGateway`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayFixture {
    #[serde(default)]
    pub sheets: Vec<FixtureSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSheet {
    pub title: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default)]
struct MemorySheet {
    /// Row 0 is the header row once anything has been written.
    grid: Vec<Vec<Value>>,
    row_capacity: u32,
    col_capacity: u32,
}

impl MemorySheet {
    fn headers(&self) -> Vec<String> {
        self.grid
            .first()
            .map(|cells| header_from_cells(cells))
            .unwrap_or_default()
    }

    fn records(&self) -> Vec<Row> {
        let headers = self.headers();
        let body = self.grid.get(1..).unwrap_or_default();
        records_from_grid(&headers, body)
    }
}

#[derive(Default)]
struct MemoryState {
    sheets: IndexMap<String, MemorySheet>,
    reads: HashMap<String, usize>,
    unavailable: HashSet<String>,
}

/// Thread-safe in-process spreadsheet. Counts reads per sheet so callers can
/// observe caching, and can mark sheets unreachable to exercise failure paths.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: GatewayFixture) -> Self {
        let gateway = Self::new();
        for sheet in fixture.sheets {
            gateway.insert_sheet(&sheet.title, sheet.headers, sheet.rows);
        }
        gateway
    }

    pub fn from_fixture_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let fixture: GatewayFixture = serde_json::from_str(&raw)?;
        log::debug!(
            "Loaded fixture {} with {} sheet(s)",
            path.display(),
            fixture.sheets.len()
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Replace (or add) a sheet with the given header and data rows.
    pub fn insert_sheet(&self, title: &str, headers: Vec<String>, rows: Vec<Vec<Value>>) {
        let mut grid = Vec::with_capacity(rows.len() + 1);
        if !headers.is_empty() {
            grid.push(headers.into_iter().map(Value::String).collect());
        }
        grid.extend(rows);
        let sheet = MemorySheet {
            row_capacity: u32::try_from(grid.len()).unwrap_or(u32::MAX),
            col_capacity: u32::try_from(grid.first().map_or(0, Vec::len)).unwrap_or(u32::MAX),
            grid,
        };
        self.lock().sheets.insert(title.to_string(), sheet);
    }

    pub fn set_unavailable(&self, title: &str, unavailable: bool) {
        let mut state = self.lock();
        if unavailable {
            state.unavailable.insert(title.to_string());
        } else {
            state.unavailable.remove(title);
        }
    }

    /// Number of record reads served for `title`.
    pub fn reads(&self, title: &str) -> usize {
        self.lock().reads.get(title).copied().unwrap_or(0)
    }

    /// Raw grid of a sheet, header row first.
    pub fn grid(&self, title: &str) -> Option<Vec<Vec<Value>>> {
        self.lock().sheets.get(title).map(|sheet| sheet.grid.clone())
    }

    pub fn capacity(&self, title: &str) -> Option<(u32, u32)> {
        self.lock()
            .sheets
            .get(title)
            .map(|sheet| (sheet.row_capacity, sheet.col_capacity))
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_sheet<T>(&self, title: &str, f: impl FnOnce(&MemorySheet) -> T) -> Result<T> {
        let state = self.lock();
        if state.unavailable.contains(title) {
            return Err(GatewayError::Unavailable(format!(
                "sheet {title} is unreachable"
            )));
        }
        let sheet = state
            .sheets
            .get(title)
            .ok_or_else(|| GatewayError::SheetNotFound(title.to_string()))?;
        Ok(f(sheet))
    }
}

#[async_trait]
impl SheetGateway for MemoryGateway {
    async fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(self.lock().sheets.keys().cloned().collect())
    }

    async fn header_row(&self, title: &str) -> Result<Vec<String>> {
        self.with_sheet(title, MemorySheet::headers)
    }

    async fn all_records(&self, title: &str) -> Result<Vec<Row>> {
        let records = self.with_sheet(title, MemorySheet::records)?;
        *self.lock().reads.entry(title.to_string()).or_insert(0) += 1;
        Ok(records)
    }

    async fn append_row(&self, title: &str, values: Vec<String>) -> Result<()> {
        let mut state = self.lock();
        if state.unavailable.contains(title) {
            return Err(GatewayError::Unavailable(format!(
                "sheet {title} is unreachable"
            )));
        }
        let sheet = state
            .sheets
            .get_mut(title)
            .ok_or_else(|| GatewayError::SheetNotFound(title.to_string()))?;
        sheet.grid.push(values.into_iter().map(Value::String).collect());
        Ok(())
    }

    async fn create_sheet(&self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let mut state = self.lock();
        if state.sheets.contains_key(title) {
            return Err(GatewayError::Malformed {
                sheet: title.to_string(),
                reason: "a sheet with this title already exists".to_string(),
            });
        }
        state.sheets.insert(
            title.to_string(),
            MemorySheet {
                grid: Vec::new(),
                row_capacity: rows,
                col_capacity: cols,
            },
        );
        Ok(())
    }
}
