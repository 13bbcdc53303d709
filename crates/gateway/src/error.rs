use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Sheet store unavailable: {0}")]
    Unavailable(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Malformed sheet {sheet}: {reason}")]
    Malformed { sheet: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SheetNotFound(_))
    }
}
