use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAIN_VIEW_KEY: &str = "Main";
pub const SUGGESTIONS_KEY: &str = "Suggestions";
pub const CASE_ID_COLUMN: &str = "Case id";
pub const DEFAULT_SHEET: &str = "AIA";
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_CACHE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_CACHE_CAPACITY: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_SHEET_KEYS: [&str; 8] = ["AIA", "OCR", "MYR", "SGD", "CRM", "CTX", "GRP", SUGGESTIONS_KEY];

/// A configured case category and the worksheet that stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetBinding {
    pub key: String,
    /// Worksheet title; the key is used when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SheetBinding {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            title: None,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub spreadsheet_id: String,
    pub api_base_url: String,
    /// Declaration order is the Main view order.
    pub sheets: Vec<SheetBinding>,
    pub default_sheet: String,
    pub main_key: String,
    pub suggestions_sheet: String,
    pub case_id_column: String,
    pub page_size: usize,
    pub cache_interval_secs: u64,
    pub cache_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            api_base_url: casedesk_gateway::DEFAULT_SHEETS_API_BASE.to_string(),
            sheets: DEFAULT_SHEET_KEYS.iter().map(|key| SheetBinding::new(key)).collect(),
            default_sheet: DEFAULT_SHEET.to_string(),
            main_key: MAIN_VIEW_KEY.to_string(),
            suggestions_sheet: SUGGESTIONS_KEY.to_string(),
            case_id_column: CASE_ID_COLUMN.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_interval_secs: DEFAULT_CACHE_INTERVAL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)
            .map_err(|err| DashboardError::Config(format!("invalid config: {err}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            DashboardError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(DashboardError::Config("at least one sheet is required".into()));
        }
        if self.page_size == 0 {
            return Err(DashboardError::Config("page_size must be positive".into()));
        }
        if self.cache_capacity < self.sheets.len() {
            return Err(DashboardError::Config(format!(
                "cache_capacity {} is smaller than the {} configured sheets",
                self.cache_capacity,
                self.sheets.len()
            )));
        }
        if self.binding(&self.default_sheet).is_none() {
            return Err(DashboardError::Config(format!(
                "default_sheet {} is not a configured sheet",
                self.default_sheet
            )));
        }
        if self.binding(&self.main_key).is_some() {
            return Err(DashboardError::Config(format!(
                "main_key {} collides with a sheet key",
                self.main_key
            )));
        }
        Ok(())
    }

    pub fn binding(&self, key: &str) -> Option<&SheetBinding> {
        self.sheets.iter().find(|binding| binding.key == key)
    }

    /// The binding for `key`, or the default sheet when the key is unknown.
    pub fn binding_or_default(&self, key: &str) -> Result<&SheetBinding> {
        if let Some(binding) = self.binding(key) {
            return Ok(binding);
        }
        log::debug!(
            "Unknown sheet key {key:?}, falling back to {}",
            self.default_sheet
        );
        self.binding(&self.default_sheet)
            .or_else(|| self.sheets.first())
            .ok_or_else(|| DashboardError::Config("no sheets configured".into()))
    }

    pub fn is_main(&self, key: &str) -> bool {
        key == self.main_key
    }

    pub fn is_suggestions(&self, key: &str) -> bool {
        key == self.suggestions_sheet
    }

    pub fn suggestions_title(&self) -> &str {
        self.binding(&self.suggestions_sheet)
            .map_or(self.suggestions_sheet.as_str(), SheetBinding::title)
    }

    pub fn sheet_keys(&self) -> Vec<String> {
        self.sheets.iter().map(|binding| binding.key.clone()).collect()
    }

    pub fn cache_interval(&self) -> Duration {
        Duration::from_secs(self.cache_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
