use crate::aggregate::Aggregator;
use crate::cache::RecordCache;
use crate::clock::{Clock, SystemClock};
use crate::config::DashboardConfig;
use crate::duplicates::DuplicateScanner;
use crate::error::{DashboardError, Result};
use crate::search;
use crate::submission::{
    case_row, suggestion_row, SUGGESTION_HEADERS, SUGGESTION_SHEET_COLS, SUGGESTION_SHEET_ROWS,
};
use casedesk_gateway::SheetGateway;
use casedesk_protocol::{
    CaseReceipt, CaseSubmission, DashboardView, HealthReport, SuggestionSubmission,
};
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// Everything the route layer needs: listings, case submission and
/// suggestions over one shared cache and gateway.
pub struct CaseDesk {
    config: Arc<DashboardConfig>,
    gateway: Arc<dyn SheetGateway>,
    cache: Arc<RecordCache>,
    aggregator: Aggregator,
    scanner: DuplicateScanner,
    // Scan-then-append must not interleave within this process.
    write_lock: TokioMutex<()>,
}

impl CaseDesk {
    pub fn new(config: DashboardConfig, gateway: Arc<dyn SheetGateway>) -> Result<Self> {
        Self::with_clock(config, gateway, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: DashboardConfig,
        gateway: Arc<dyn SheetGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let cache = Arc::new(RecordCache::new(
            Arc::clone(&gateway),
            clock,
            config.cache_interval(),
            config.cache_capacity,
        ));
        let aggregator = Aggregator::new(Arc::clone(&cache), Arc::clone(&config));
        let scanner = DuplicateScanner::new(Arc::clone(&gateway), config.case_id_column.clone());
        Ok(Self {
            config,
            gateway,
            cache,
            aggregator,
            scanner,
            write_lock: TokioMutex::new(()),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Categories a new case can be filed under.
    pub fn sheet_keys(&self) -> Vec<String> {
        self.config.sheet_keys()
    }

    pub async fn dashboard_view(
        &self,
        selected_key: &str,
        search_text: &str,
        page: usize,
    ) -> Result<DashboardView> {
        self.cache.expire_if_due();

        let view = self.aggregator.build_view(selected_key).await?;
        let rows = view.records.into_iter().map(|record| record.row).collect();
        let search_text = search_text.trim();
        let page = search::query(rows, search_text, page, self.config.page_size);

        Ok(DashboardView {
            headers: view.headers,
            records: page.records,
            selected_sheet: selected_key.to_string(),
            search_query: search_text.to_string(),
            page: page.page,
            total_pages: page.total_pages,
            total_matches: page.total_matches,
        })
    }

    pub async fn is_duplicate(&self, case_id: &str) -> Result<bool> {
        self.cache.expire_if_due();
        Ok(self.scanner.is_duplicate(case_id).await?)
    }

    /// Append `row_values` to the sheet of `target_key` unless `case_id`
    /// already exists in any sheet.
    pub async fn check_and_record_case(
        &self,
        case_id: &str,
        row_values: Vec<String>,
        target_key: &str,
    ) -> Result<CaseReceipt> {
        self.cache.expire_if_due();

        if case_id.trim().is_empty() {
            return Err(DashboardError::InvalidSubmission("case id is required".into()));
        }
        let binding = self
            .config
            .binding(target_key)
            .ok_or_else(|| DashboardError::UnknownSheet(target_key.to_string()))?;

        let _guard = self.write_lock.lock().await;
        if self.scanner.is_duplicate(case_id).await? {
            log::info!("Rejected duplicate case {case_id:?}");
            return Err(DashboardError::DuplicateCase {
                case_id: case_id.to_string(),
            });
        }
        self.gateway.append_row(binding.title(), row_values).await?;
        log::info!("Recorded case {case_id:?} in {}", binding.key);

        Ok(CaseReceipt {
            case_id: case_id.trim().to_string(),
            sheet: binding.key.clone(),
        })
    }

    /// Record a case from the add-case form.
    pub async fn record_case(&self, submission: &CaseSubmission) -> Result<CaseReceipt> {
        let row = case_row(submission)?;
        self.check_and_record_case(&submission.case_id, row, &submission.category)
            .await
    }

    /// Append a suggestion, creating the suggestions sheet on first use.
    /// Returns `false` without touching the store when the text is blank.
    pub async fn record_suggestion(&self, submission: &SuggestionSubmission) -> Result<bool> {
        self.cache.expire_if_due();

        let Some(row) = suggestion_row(submission, chrono::Local::now().naive_local()) else {
            return Ok(false);
        };
        let title = self.config.suggestions_title();

        let _guard = self.write_lock.lock().await;
        match self.gateway.header_row(title).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                self.gateway
                    .create_sheet(title, SUGGESTION_SHEET_ROWS, SUGGESTION_SHEET_COLS)
                    .await?;
                self.gateway
                    .append_row(
                        title,
                        SUGGESTION_HEADERS.iter().map(|h| h.to_string()).collect(),
                    )
                    .await?;
                log::info!("Created suggestions sheet {title}");
            }
            Err(err) => return Err(err.into()),
        }
        self.gateway.append_row(title, row).await?;
        Ok(true)
    }

    pub async fn health(&self) -> HealthReport {
        let (remote_sheets, gateway_error) = match self.gateway.list_sheets().await {
            Ok(sheets) => (Some(sheets.len()), None),
            Err(err) => {
                log::warn!("Health probe could not list sheets: {err}");
                (None, Some(err.to_string()))
            }
        };
        HealthReport {
            status: if gateway_error.is_none() { "ok" } else { "degraded" }.to_string(),
            configured_sheets: self.config.sheets.len(),
            remote_sheets,
            gateway_error,
            cache: self.cache.stats(),
        }
    }
}
