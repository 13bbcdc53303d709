use casedesk_gateway::GatewayError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Case ID '{case_id}' already exists!")]
    DuplicateCase { case_id: String },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl DashboardError {
    /// Stable machine-readable code for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateCase { .. } => "duplicate_case",
            Self::Gateway(_) => "gateway_unavailable",
            Self::UnknownSheet(_) => "unknown_sheet",
            Self::InvalidSubmission(_) => "invalid_request",
            Self::Config(_) => "config",
        }
    }
}
