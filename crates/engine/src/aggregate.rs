use crate::cache::RecordCache;
use crate::config::{DashboardConfig, SheetBinding};
use crate::error::Result;
use crate::normalize::normalize;
use casedesk_gateway::SheetSnapshot;
use casedesk_protocol::{Row, SHEET_COLUMN};
use serde_json::Value;
use std::sync::Arc;

/// A normalized row and the sheet key it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub sheet: String,
    pub row: Row,
}

/// Every record of a listing, all shaped by `headers`.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    /// Key the listing was actually read from, after any fallback.
    pub selected: String,
    pub headers: Vec<String>,
    pub records: Vec<UnifiedRecord>,
}

pub struct Aggregator {
    cache: Arc<RecordCache>,
    config: Arc<DashboardConfig>,
}

impl Aggregator {
    pub fn new(cache: Arc<RecordCache>, config: Arc<DashboardConfig>) -> Self {
        Self { cache, config }
    }

    pub async fn build_view(&self, selected_key: &str) -> Result<SheetView> {
        if self.config.is_main(selected_key) {
            return self.build_main_view().await;
        }

        let binding = self.config.binding_or_default(selected_key)?;
        let mut view = SheetView {
            selected: binding.key.clone(),
            headers: Vec::new(),
            records: Vec::new(),
        };
        let Some(snapshot) = self.read_configured(binding).await? else {
            if self.config.is_suggestions(&binding.key) {
                view.headers.push(SHEET_COLUMN.to_string());
            }
            return Ok(view);
        };

        view.headers = snapshot.headers.clone();
        if self.config.is_suggestions(&binding.key) {
            view.headers.push(SHEET_COLUMN.to_string());
        }
        view.records = tag_records(&binding.key, &snapshot.records, &view.headers);
        Ok(view)
    }

    /// Every configured sheet in declaration order, shaped by the header of
    /// the first sheet found.
    async fn build_main_view(&self) -> Result<SheetView> {
        let mut headers: Option<Vec<String>> = None;
        let mut records = Vec::new();

        for binding in &self.config.sheets {
            let Some(snapshot) = self.read_configured(binding).await? else {
                continue;
            };
            let headers = headers.get_or_insert_with(|| {
                let mut unified = snapshot.headers.clone();
                unified.push(SHEET_COLUMN.to_string());
                unified
            });
            records.extend(tag_records(&binding.key, &snapshot.records, headers));
        }

        Ok(SheetView {
            selected: self.config.main_key.clone(),
            headers: headers.unwrap_or_else(|| vec![SHEET_COLUMN.to_string()]),
            records,
        })
    }

    /// A configured sheet that does not exist remotely yet reads as absent.
    async fn read_configured(&self, binding: &SheetBinding) -> Result<Option<Arc<SheetSnapshot>>> {
        match self.cache.get_records(binding.title()).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) if err.is_not_found() => {
                log::warn!(
                    "Configured sheet {} ({}) is missing from the store",
                    binding.key,
                    binding.title()
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn tag_records(key: &str, records: &[Row], headers: &[String]) -> Vec<UnifiedRecord> {
    records
        .iter()
        .map(|record| {
            let mut tagged = record.clone();
            tagged.insert(SHEET_COLUMN.to_string(), Value::String(key.to_string()));
            UnifiedRecord {
                sheet: key.to_string(),
                row: normalize(&tagged, headers),
            }
        })
        .collect()
}
