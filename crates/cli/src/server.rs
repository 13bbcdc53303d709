use crate::http_api;
use crate::server_security::AuthToken;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use casedesk_engine::CaseDesk;
use casedesk_protocol::{CaseSubmission, SuggestionReceipt, SuggestionSubmission};
use serde::Deserialize;
use std::sync::Arc;

pub(crate) struct AppState {
    pub(crate) desk: Arc<CaseDesk>,
    pub(crate) auth_token: Option<AuthToken>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    sheet: Option<String>,
    search: Option<String>,
    page: Option<String>,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/sheets", get(sheets))
        .route("/add", post(add_case))
        .route("/add_suggestion", post(add_suggestion))
        .route("/health", get(health))
        .with_state(state)
}

fn reject_unauthorized(state: &AppState, headers: &HeaderMap) -> Option<Result<Response, StatusCode>> {
    let token = state.auth_token.as_ref()?;
    if token.admits(headers) {
        return None;
    }
    let envelope = http_api::error_envelope(
        "unauthorized",
        "Missing or invalid Authorization header".to_string(),
    );
    Some(http_api::build_response(StatusCode::UNAUTHORIZED, &envelope))
}

fn invalid_request(message: String) -> Result<Response, StatusCode> {
    let envelope = http_api::error_envelope("invalid_request", message);
    http_api::build_response(StatusCode::BAD_REQUEST, &envelope)
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, StatusCode> {
    if let Some(rejected) = reject_unauthorized(&state, &headers) {
        return rejected;
    }

    let page = match query.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(page) => page,
            Err(err) => return invalid_request(format!("page {raw:?} is not a number: {err}")),
        },
    };
    let sheet = query
        .sheet
        .unwrap_or_else(|| state.desk.config().default_sheet.clone());
    let search = query.search.unwrap_or_default();

    match state.desk.dashboard_view(&sheet, &search, page).await {
        Ok(view) => http_api::build_response(StatusCode::OK, &view),
        Err(err) => http_api::error_response(&err),
    }
}

async fn sheets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if let Some(rejected) = reject_unauthorized(&state, &headers) {
        return rejected;
    }
    http_api::build_response(StatusCode::OK, &state.desk.sheet_keys())
}

async fn add_case(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    if let Some(rejected) = reject_unauthorized(&state, &headers) {
        return rejected;
    }
    let submission: CaseSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(err) => return invalid_request(format!("Invalid case submission: {err}")),
    };

    match state.desk.record_case(&submission).await {
        Ok(receipt) => http_api::build_response(StatusCode::CREATED, &receipt),
        Err(err) => http_api::error_response(&err),
    }
}

async fn add_suggestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    if let Some(rejected) = reject_unauthorized(&state, &headers) {
        return rejected;
    }
    let submission: SuggestionSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(err) => return invalid_request(format!("Invalid suggestion: {err}")),
    };

    match state.desk.record_suggestion(&submission).await {
        Ok(recorded) => http_api::build_response(StatusCode::OK, &SuggestionReceipt { recorded }),
        Err(err) => http_api::error_response(&err),
    }
}

async fn health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if let Some(rejected) = reject_unauthorized(&state, &headers) {
        return rejected;
    }
    let report = state.desk.health().await;
    http_api::build_response(StatusCode::OK, &report)
}
