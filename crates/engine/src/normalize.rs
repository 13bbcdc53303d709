use casedesk_protocol::Row;
use serde_json::Value;
use std::borrow::Cow;

/// Project `row` onto `headers`: exactly the header columns, in header
/// order, with missing and null cells filled with `""`.
pub fn normalize(row: &Row, headers: &[String]) -> Row {
    headers
        .iter()
        .map(|header| {
            let cell = match row.get(header) {
                None | Some(Value::Null) => Value::String(String::new()),
                Some(value) => value.clone(),
            };
            (header.clone(), cell)
        })
        .collect()
}

/// Text form of a cell for search and comparison. Nested values have no
/// text form.
pub fn cell_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Null => Some(Cow::Borrowed("")),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn backfills_missing_and_null_cells() {
        let mut row = Row::new();
        row.insert("Case id".into(), json!("A-1"));
        row.insert("Remark".into(), Value::Null);

        let out = normalize(&row, &headers(&["Case id", "Status", "Remark"]));

        assert_eq!(out["Status"], json!(""));
        assert_eq!(out["Remark"], json!(""));
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["Case id", "Status", "Remark"]);
    }

    #[test]
    fn drops_columns_outside_the_header_set() {
        let mut row = Row::new();
        row.insert("Case id".into(), json!("A-1"));
        row.insert("Only in OCR".into(), json!("x"));

        let out = normalize(&row, &headers(&["Case id"]));
        assert_eq!(out.len(), 1);
        assert!(!out.contains_key("Only in OCR"));
    }

    #[test]
    fn numbers_keep_their_text_form() {
        assert_eq!(cell_text(&json!(1042)).unwrap(), "1042");
        assert_eq!(cell_text(&json!(true)).unwrap(), "true");
        assert_eq!(cell_text(&Value::Null).unwrap(), "");
        assert!(cell_text(&json!(["nested"])).is_none());
    }
}
