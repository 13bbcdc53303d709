use crate::normalize::cell_text;
use casedesk_protocol::Row;

/// One page of matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Row>,
    /// Requested page, 1-indexed.
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

/// Filter `records` by case-insensitive substring over their joined cell
/// text, then cut out page `page` (1-indexed) of `page_size` rows.
///
/// Pages outside `1..=total_pages` come back empty, echoing the requested
/// page.
pub fn query(records: Vec<Row>, search: &str, page: usize, page_size: usize) -> Page {
    let needle = search.to_lowercase();
    let page_size = page_size.max(1);

    let matched: Vec<Row> = records
        .into_iter()
        .filter(|row| needle.is_empty() || row_matches(row, &needle))
        .collect();

    let total_matches = matched.len();
    let total_pages = total_matches.div_ceil(page_size);
    let records = match page.checked_sub(1) {
        Some(index) => matched
            .into_iter()
            .skip(index.saturating_mul(page_size))
            .take(page_size)
            .collect(),
        None => Vec::new(),
    };

    Page {
        records,
        page,
        total_pages,
        total_matches,
    }
}

/// Space-joined text of every cell, in column order. `None` when a cell has
/// no text form.
pub fn row_text(row: &Row) -> Option<String> {
    let mut parts = Vec::with_capacity(row.len());
    for value in row.values() {
        parts.push(cell_text(value)?);
    }
    Some(parts.join(" "))
}

fn row_matches(row: &Row, needle: &str) -> bool {
    match row_text(row) {
        Some(text) => text.to_lowercase().contains(needle),
        None => {
            log::warn!(
                "Skipping row with unrenderable cells during search: {:?}",
                row.keys().collect::<Vec<_>>()
            );
            false
        }
    }
}
