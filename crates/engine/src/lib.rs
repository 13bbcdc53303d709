//! # Casedesk Engine
//!
//! Aggregation, caching, duplicate detection and search over a spreadsheet of
//! case records.
//!
//! ## Architecture
//!
//! ```text
//! dashboard_view(sheet, search, page)
//!     │
//!     ├──> Aggregator        one sheet, or every configured sheet ("Main")
//!     │      └─ RecordCache  per-sheet memo, bulk reset every interval, LRU
//!     │
//!     └──> search::query     substring filter over joined cells, 1-indexed pages
//!
//! check_and_record_case(id, row, sheet)
//!     │
//!     ├──> DuplicateScanner  live scan of every worksheet, no cache
//!     └──> SheetGateway      append (serialized in-process)
//! ```

mod aggregate;
mod cache;
mod clock;
mod config;
mod duplicates;
mod error;
mod normalize;
pub mod search;
mod service;
mod submission;

pub use aggregate::{Aggregator, SheetView, UnifiedRecord};
pub use cache::RecordCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DashboardConfig, SheetBinding, CASE_ID_COLUMN, DEFAULT_PAGE_SIZE, MAIN_VIEW_KEY,
    SUGGESTIONS_KEY,
};
pub use duplicates::{normalize_case_id, DuplicateScanner};
pub use error::{DashboardError, Result};
pub use normalize::{cell_text, normalize};
pub use search::{query, Page};
pub use service::CaseDesk;
pub use submission::{case_row, suggestion_row, SUGGESTION_HEADERS};
