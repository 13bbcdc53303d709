use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One sheet row keyed by column name, in column order.
pub type Row = IndexMap<String, serde_json::Value>;

/// Synthetic column naming the sheet a record came from.
pub const SHEET_COLUMN: &str = "_sheet";

pub const ANONYMOUS_USER: &str = "Anonymous";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

/// One page of a dashboard listing, ready for tabular rendering.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardView {
    pub headers: Vec<String>,
    pub records: Vec<Row>,
    pub selected_sheet: String,
    pub search_query: String,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

/// Fields of the add-case form.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CaseSubmission {
    pub case_id: String,
    /// `YYYY-MM-DDTHH:MM`, as produced by a `datetime-local` input.
    pub datetime: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub remark: String,
    pub category: String,
    #[serde(default)]
    pub telegram_link: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CaseReceipt {
    pub case_id: String,
    pub sheet: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SuggestionSubmission {
    #[serde(default)]
    pub suggestion: String,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub product: String,
}

fn default_user_name() -> String {
    ANONYMOUS_USER.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionReceipt {
    pub recorded: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub resets: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub configured_sheets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_sheets: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
    pub cache: CacheStats,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
