use crate::normalize::cell_text;
use casedesk_gateway::{GatewayError, SheetGateway};
use std::sync::Arc;

pub fn normalize_case_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Live scan of every worksheet for a case identifier. Reads never go
/// through the record cache.
pub struct DuplicateScanner {
    gateway: Arc<dyn SheetGateway>,
    id_column: String,
}

impl DuplicateScanner {
    pub fn new(gateway: Arc<dyn SheetGateway>, id_column: impl Into<String>) -> Self {
        Self {
            gateway,
            id_column: id_column.into(),
        }
    }

    /// Whether any row of any sheet carries `case_id`, compared trimmed and
    /// case-insensitively. A sheet that cannot be read fails the scan.
    pub async fn is_duplicate(&self, case_id: &str) -> Result<bool, GatewayError> {
        let needle = normalize_case_id(case_id);

        for title in self.gateway.list_sheets().await? {
            let records = self.gateway.all_records(&title).await?;
            for record in &records {
                let existing = match record.get(&self.id_column) {
                    None => String::new(),
                    Some(value) => cell_text(value).map(|text| text.into_owned()).ok_or_else(|| {
                        GatewayError::Malformed {
                            sheet: title.clone(),
                            reason: format!("column {:?} holds a nested value", self.id_column),
                        }
                    })?,
                };
                if normalize_case_id(&existing) == needle {
                    log::info!("Case id {case_id:?} already present in sheet {title}");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk_gateway::MemoryGateway;
    use serde_json::json;

    fn gateway() -> Arc<MemoryGateway> {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.insert_sheet("AIA", vec!["Case id".into()], vec![vec![json!("X1")]]);
        gateway.insert_sheet(
            "Archive 2023",
            vec!["Case id".into(), "Status".into()],
            vec![vec![json!("  old-77 "), json!("closed")]],
        );
        gateway.insert_sheet("Suggestions", vec!["Suggestion".into()], vec![vec![json!("hi")]]);
        gateway
    }

    #[tokio::test]
    async fn matches_across_sheets_ignoring_case_and_padding() {
        let scanner = DuplicateScanner::new(gateway(), "Case id");
        assert!(scanner.is_duplicate("x1").await.unwrap());
        assert!(scanner.is_duplicate(" OLD-77").await.unwrap());
        assert!(!scanner.is_duplicate("X2").await.unwrap());
    }

    #[tokio::test]
    async fn same_id_in_two_sheets_is_a_duplicate() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.insert_sheet("AIA", vec!["Case id".into()], vec![vec![json!("X1")]]);
        gateway.insert_sheet("OCR", vec!["Case id".into()], vec![vec![json!("x1")]]);
        let scanner = DuplicateScanner::new(gateway, "Case id");
        assert!(scanner.is_duplicate("X1").await.unwrap());
        assert!(!scanner.is_duplicate("X2").await.unwrap());
    }

    #[tokio::test]
    async fn numeric_ids_compare_by_text() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.insert_sheet("GRP", vec!["Case id".into()], vec![vec![json!(4411)]]);
        let scanner = DuplicateScanner::new(gateway, "Case id");
        assert!(scanner.is_duplicate("4411").await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_sheet_fails_the_scan() {
        let gateway = gateway();
        gateway.set_unavailable("Archive 2023", true);
        let scanner = DuplicateScanner::new(gateway, "Case id");
        assert!(scanner.is_duplicate("X2").await.is_err());
    }

    #[tokio::test]
    async fn every_scan_reads_live() {
        let gateway = gateway();
        let scanner = DuplicateScanner::new(gateway.clone(), "Case id");
        scanner.is_duplicate("nope").await.unwrap();
        scanner.is_duplicate("nope").await.unwrap();
        assert_eq!(gateway.reads("AIA"), 2);
    }
}
