use axum::{
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
};
use casedesk_engine::DashboardError;
use casedesk_protocol::{serialize_json, ErrorEnvelope};
use serde::Serialize;

pub(crate) fn error_envelope(code: &str, message: String) -> ErrorEnvelope {
    let hint = match code {
        "unauthorized" => Some(
            "Include Authorization: Bearer <token>. The token is set with --auth-token or CASEDESK_AUTH_TOKEN."
                .to_string(),
        ),
        "invalid_request" => Some(
            "Verify the request body is valid JSON with the documented fields.".to_string(),
        ),
        "duplicate_case" => Some("Use a case id that is not present in any sheet.".to_string()),
        "unknown_sheet" => Some("GET /sheets lists the categories cases can be filed under.".to_string()),
        "gateway_unavailable" => {
            Some("The spreadsheet store could not be reached; retry shortly.".to_string())
        }
        _ => None,
    };
    ErrorEnvelope {
        code: code.to_string(),
        message,
        details: None,
        hint,
    }
}

pub(crate) fn dashboard_error_status(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::DuplicateCase { .. } => StatusCode::CONFLICT,
        DashboardError::UnknownSheet(_) | DashboardError::InvalidSubmission(_) => {
            StatusCode::BAD_REQUEST
        }
        DashboardError::Gateway(_) => StatusCode::BAD_GATEWAY,
        DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &DashboardError) -> Result<Response, StatusCode> {
    let status = dashboard_error_status(err);
    if status.is_server_error() {
        log::error!("Request failed: {err}");
    } else {
        log::debug!("Request rejected: {err}");
    }
    build_response(status, &error_envelope(err.code(), err.to_string()))
}

pub(crate) fn build_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response, StatusCode> {
    let bytes = serialize_json(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    let mut builder = HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json");

    if status == StatusCode::UNAUTHORIZED {
        builder = builder.header("www-authenticate", "Bearer");
    }

    builder
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
