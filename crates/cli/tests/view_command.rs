use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let headers = json!(["Case id", "Datetime", "Description", "Status"]);
    let aia_rows: Vec<Value> = (1..=7)
        .map(|n| {
            let description = if n == 2 || n == 5 { "URGENT escalation" } else { "routine" };
            json!([format!("AIA-{n}"), "2024-04-01 09:30", description, "Open"])
        })
        .collect();
    let fixture = json!({
        "sheets": [
            { "title": "AIA", "headers": headers, "rows": aia_rows },
            { "title": "OCR", "headers": ["Case id", "Scan"], "rows": [["OCR-1", "blurry"]] },
            { "title": "Legacy", "headers": ["Case id"], "rows": [["old-9"]] }
        ]
    });
    let path = dir.join("sheets.json");
    fs::write(&path, fixture.to_string()).unwrap();
    path
}

fn run(fixture: &Path, args: &[&str]) -> (bool, Value) {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("casedesk"))
        .env_remove("CASEDESK_CONFIG")
        .env_remove("CASEDESK_CACHE_INTERVAL_SECS")
        .arg("--quiet")
        .arg("--fixture")
        .arg(fixture)
        .args(args)
        .output()
        .expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

#[test]
fn view_filters_and_paginates() {
    let temp = tempdir().unwrap();
    let fixture = write_fixture(temp.path());

    let (ok, body) = run(&fixture, &["view", "--sheet", "AIA", "--search", "urgent"]);
    assert!(ok, "expected ok, got {body}");
    assert_eq!(body["total_pages"], 1);
    let ids: Vec<&str> = body["records"]
        .as_array()
        .expect("records array")
        .iter()
        .filter_map(|r| r["Case id"].as_str())
        .collect();
    assert_eq!(ids, vec!["AIA-2", "AIA-5"]);

    let (ok, body) = run(&fixture, &["view", "--page", "2"]);
    assert!(ok);
    assert_eq!(body["selected_sheet"], "AIA");
    assert_eq!(body["records"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["total_pages"], 2);
}

#[test]
fn main_view_tags_rows_with_their_sheet() {
    let temp = tempdir().unwrap();
    let fixture = write_fixture(temp.path());

    let (ok, body) = run(&fixture, &["view", "--sheet", "Main", "--search", "ocr-1"]);
    assert!(ok, "expected ok, got {body}");
    assert_eq!(body["headers"], json!(["Case id", "Datetime", "Description", "Status", "_sheet"]));
    assert_eq!(body["records"][0]["_sheet"], "OCR");
    assert_eq!(body["records"][0]["Status"], "");
}

#[test]
fn check_case_scans_unconfigured_sheets_too() {
    let temp = tempdir().unwrap();
    let fixture = write_fixture(temp.path());

    let (ok, body) = run(&fixture, &["check-case", "OLD-9"]);
    assert!(ok);
    assert_eq!(body["duplicate"], true);

    let (_, body) = run(&fixture, &["check-case", "AIA-8"]);
    assert_eq!(body["duplicate"], false);
}

#[test]
fn config_file_changes_page_size() {
    let temp = tempdir().unwrap();
    let fixture = write_fixture(temp.path());
    let config = temp.path().join("casedesk.toml");
    fs::write(&config, "page_size = 3\n").unwrap();

    let (ok, body) = run(
        &fixture,
        &["--config", config.to_str().unwrap(), "view", "--sheet", "AIA"],
    );
    assert!(ok, "expected ok, got {body}");
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["records"].as_array().map(Vec::len), Some(3));
}
