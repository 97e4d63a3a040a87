use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Cannot move {kind} from {from} to {to}")]
    InvalidTransition {
        kind: &'static str,
        from: String,
        to: String,
    },
    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },
    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(&'static str),
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
    #[error("Mail delivery error: {0}")]
    MailError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PortalError>;

impl PortalError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::ValidationError(_) | PortalError::SerializationError(_) => {
                StatusCode::BAD_REQUEST
            }
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::InvalidTransition { .. } | PortalError::InsufficientStock { .. } => {
                StatusCode::CONFLICT
            }
            PortalError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PortalError::Unauthorized | PortalError::InvalidSignature(_) => {
                StatusCode::UNAUTHORIZED
            }
            PortalError::GatewayError(_) | PortalError::MailError(_) | PortalError::HttpError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
