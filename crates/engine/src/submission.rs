use crate::error::{DashboardError, Result};
use casedesk_protocol::{CaseSubmission, SuggestionSubmission};
use chrono::NaiveDateTime;

pub const CASE_DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const CASE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const SUGGESTION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SUGGESTION_HEADERS: [&str; 5] = ["Timestamp", "User", "Department", "Product", "Suggestion"];
pub const SUGGESTION_SHEET_ROWS: u32 = 1000;
pub const SUGGESTION_SHEET_COLS: u32 = 5;

/// Cell values of a new case, in case-sheet column order.
pub fn case_row(submission: &CaseSubmission) -> Result<Vec<String>> {
    let case_id = submission.case_id.trim();
    if case_id.is_empty() {
        return Err(DashboardError::InvalidSubmission("case id is required".into()));
    }
    let when = NaiveDateTime::parse_from_str(submission.datetime.trim(), CASE_DATETIME_INPUT_FORMAT)
        .map_err(|err| {
            DashboardError::InvalidSubmission(format!(
                "datetime {:?} is not YYYY-MM-DDTHH:MM: {err}",
                submission.datetime
            ))
        })?;

    Ok(vec![
        case_id.to_string(),
        when.format(CASE_DATETIME_FORMAT).to_string(),
        submission.brand_name.clone(),
        submission.channel.clone(),
        submission.description.clone(),
        submission.assigned_to.clone(),
        submission.status.clone(),
        submission.remark.clone(),
        submission.telegram_link.clone(),
    ])
}

/// `None` when the suggestion text is blank.
pub fn suggestion_row(submission: &SuggestionSubmission, at: NaiveDateTime) -> Option<Vec<String>> {
    if submission.suggestion.trim().is_empty() {
        return None;
    }
    Some(vec![
        at.format(SUGGESTION_TIMESTAMP_FORMAT).to_string(),
        submission.user_name.clone(),
        submission.department.clone(),
        submission.product.clone(),
        submission.suggestion.clone(),
    ])
}
