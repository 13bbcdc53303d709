use casedesk_engine::{CaseDesk, DashboardConfig, DashboardError, ManualClock};
use casedesk_gateway::MemoryGateway;
use casedesk_protocol::{CaseSubmission, SuggestionSubmission};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const CASE_HEADERS: [&str; 9] = [
    "Case id",
    "Datetime",
    "Brand Name",
    "Channel",
    "Description",
    "Assigned To",
    "Status",
    "Remark",
    "Telegram Link",
];

fn case_headers() -> Vec<String> {
    CASE_HEADERS.iter().map(|h| h.to_string()).collect()
}

fn case(id: &str, description: &str) -> Vec<Value> {
    vec![
        json!(id),
        json!("2024-04-01 09:30"),
        json!("Acme"),
        json!("Email"),
        json!(description),
        json!("Dewi"),
        json!("Open"),
        json!(""),
        json!(""),
    ]
}

fn seeded_gateway() -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.insert_sheet(
        "AIA",
        case_headers(),
        vec![
            case("AIA-1", "login issue"),
            case("AIA-2", "urgent: payment stuck"),
            case("AIA-3", "profile update"),
            case("AIA-4", "card declined"),
            case("AIA-5", "address change"),
            case("AIA-6", "Urgent refund"),
            case("AIA-7", "statement request"),
        ],
    );
    gateway.insert_sheet(
        "OCR",
        vec!["Case id".into(), "Datetime".into(), "Scan quality".into()],
        vec![vec![json!("OCR-1"), json!("2024-04-02 10:00"), json!("blurry")]],
    );
    gateway
}

fn desk(gateway: Arc<MemoryGateway>) -> (CaseDesk, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let desk = CaseDesk::with_clock(DashboardConfig::default(), gateway, clock.clone()).unwrap();
    (desk, clock)
}

fn case_ids(records: &[casedesk_protocol::Row]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["Case id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn search_and_pagination_over_one_sheet() {
    let (desk, _clock) = desk(seeded_gateway());

    let urgent = desk.dashboard_view("AIA", "urgent", 1).await.unwrap();
    assert_eq!(case_ids(&urgent.records), vec!["AIA-2", "AIA-6"]);
    assert_eq!(urgent.total_pages, 1);
    assert_eq!(urgent.search_query, "urgent");

    let second = desk.dashboard_view("AIA", "", 2).await.unwrap();
    assert_eq!(case_ids(&second.records), vec!["AIA-6", "AIA-7"]);
    assert_eq!(second.total_pages, 2);
    assert_eq!(second.headers, case_headers());

    let beyond = desk.dashboard_view("AIA", "", 3).await.unwrap();
    assert!(beyond.records.is_empty());
}

#[tokio::test]
async fn unknown_sheet_keys_echo_the_request_but_list_the_default_sheet() {
    let (desk, _clock) = desk(seeded_gateway());

    let view = desk.dashboard_view("Bogus", "", 1).await.unwrap();
    assert_eq!(view.selected_sheet, "Bogus");
    assert_eq!(view.headers, case_headers());
    assert_eq!(view.total_matches, 7);
    assert_eq!(case_ids(&view.records), vec!["AIA-1", "AIA-2", "AIA-3", "AIA-4", "AIA-5"]);
}

#[tokio::test]
async fn page_zero_lists_nothing() {
    let (desk, _clock) = desk(seeded_gateway());

    let view = desk.dashboard_view("AIA", "", 0).await.unwrap();
    assert!(view.records.is_empty());
    assert_eq!(view.page, 0);
    assert_eq!(view.total_pages, 2);
}

#[tokio::test]
async fn main_view_unifies_every_configured_sheet() {
    let (desk, _clock) = desk(seeded_gateway());

    let view = desk.dashboard_view("Main", "ocr-1", 1).await.unwrap();
    assert_eq!(view.selected_sheet, "Main");
    assert_eq!(view.headers.last().map(String::as_str), Some("_sheet"));
    assert_eq!(view.total_matches, 1);

    let record = &view.records[0];
    let keys: HashSet<&String> = record.keys().collect();
    let expected: HashSet<&String> = view.headers.iter().collect();
    assert_eq!(keys, expected);
    assert_eq!(record["_sheet"], json!("OCR"));
    assert_eq!(record["Brand Name"], json!(""));

    let everything = desk.dashboard_view("Main", "", 2).await.unwrap();
    assert_eq!(everything.total_matches, 8);
    assert_eq!(case_ids(&everything.records), vec!["AIA-6", "AIA-7", "OCR-1"]);
}

#[tokio::test]
async fn listings_are_cached_until_the_interval_passes() {
    let gateway = seeded_gateway();
    let (desk, clock) = desk(gateway.clone());

    desk.dashboard_view("AIA", "", 1).await.unwrap();
    clock.advance(Duration::from_secs(20));
    desk.dashboard_view("AIA", "login", 1).await.unwrap();
    assert_eq!(gateway.reads("AIA"), 1);

    clock.advance(Duration::from_secs(11));
    desk.dashboard_view("AIA", "", 1).await.unwrap();
    assert_eq!(gateway.reads("AIA"), 2);
}

#[tokio::test]
async fn duplicate_ids_are_rejected_across_sheets() {
    let gateway = seeded_gateway();
    gateway.insert_sheet("Legacy", vec!["Case id".into()], vec![vec![json!("x1")]]);
    let (desk, _clock) = desk(gateway.clone());

    let err = desk
        .check_and_record_case("X1", vec!["X1".into()], "OCR")
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::DuplicateCase { .. }));
    assert_eq!(err.to_string(), "Case ID 'X1' already exists!");

    let receipt = desk
        .check_and_record_case("X2", vec!["X2".into()], "OCR")
        .await
        .unwrap();
    assert_eq!(receipt.sheet, "OCR");
    assert!(desk.is_duplicate(" x2 ").await.unwrap());
}

#[tokio::test]
async fn new_case_shows_up_once_the_cache_expires() {
    let gateway = seeded_gateway();
    let (desk, clock) = desk(gateway.clone());
    assert_eq!(desk.dashboard_view("AIA", "", 1).await.unwrap().total_matches, 7);

    let submission = CaseSubmission {
        case_id: "AIA-8".into(),
        datetime: "2024-05-06T07:08".into(),
        brand_name: "Acme".into(),
        description: "new urgent case".into(),
        category: "AIA".into(),
        ..CaseSubmission::default()
    };
    desk.record_case(&submission).await.unwrap();

    assert_eq!(desk.dashboard_view("AIA", "", 1).await.unwrap().total_matches, 7);
    clock.advance(Duration::from_secs(31));
    let view = desk.dashboard_view("AIA", "aia-8", 1).await.unwrap();
    assert_eq!(view.total_matches, 1);
    assert_eq!(view.records[0]["Datetime"], json!("2024-05-06 07:08"));
}

#[tokio::test]
async fn writes_to_unknown_categories_are_refused() {
    let (desk, _clock) = desk(seeded_gateway());
    let err = desk
        .check_and_record_case("Z-1", vec!["Z-1".into()], "Main")
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::UnknownSheet(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_of_one_id_accept_exactly_one() {
    let gateway = seeded_gateway();
    let (desk, _clock) = desk(gateway.clone());
    let desk = Arc::new(desk);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let desk = Arc::clone(&desk);
        handles.push(tokio::spawn(async move {
            desk.check_and_record_case("RACE-1", vec!["RACE-1".into()], "OCR")
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(DashboardError::DuplicateCase { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn suggestions_sheet_is_created_on_first_use() {
    let gateway = seeded_gateway();
    let (desk, _clock) = desk(gateway.clone());

    let blank = SuggestionSubmission {
        suggestion: "   ".into(),
        user_name: "Rina".into(),
        department: String::new(),
        product: String::new(),
    };
    assert!(!desk.record_suggestion(&blank).await.unwrap());
    assert!(gateway.grid("Suggestions").is_none());

    for text in ["dark mode", "export to csv"] {
        let suggestion = SuggestionSubmission {
            suggestion: text.into(),
            user_name: "Rina".into(),
            department: "Support".into(),
            product: "Dashboard".into(),
        };
        assert!(desk.record_suggestion(&suggestion).await.unwrap());
    }

    let grid = gateway.grid("Suggestions").unwrap();
    assert_eq!(grid.len(), 3);
    assert_eq!(
        grid[0],
        vec![
            json!("Timestamp"),
            json!("User"),
            json!("Department"),
            json!("Product"),
            json!("Suggestion")
        ]
    );
    assert_eq!(gateway.capacity("Suggestions"), Some((1000, 5)));

    let view = desk.dashboard_view("Suggestions", "csv", 1).await.unwrap();
    assert_eq!(view.total_matches, 1);
    assert_eq!(view.records[0]["_sheet"], json!("Suggestions"));
}

#[tokio::test]
async fn gateway_failures_surface_and_are_not_cached() {
    let gateway = seeded_gateway();
    let (desk, _clock) = desk(gateway.clone());

    gateway.set_unavailable("AIA", true);
    let err = desk.dashboard_view("AIA", "", 1).await.unwrap_err();
    assert!(matches!(err, DashboardError::Gateway(_)));
    assert_eq!(err.code(), "gateway_unavailable");

    gateway.set_unavailable("AIA", false);
    assert_eq!(desk.dashboard_view("AIA", "", 1).await.unwrap().total_matches, 7);

    let health = desk.health().await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.remote_sheets, Some(2));
    assert_eq!(health.cache.entries, 1);
}
