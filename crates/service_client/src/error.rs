use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned an unexpected body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
    #[error("invalid relay url: {0}")]
    InvalidUrl(String),
    #[error("transaction relay unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Service
    }

    /// Raw response body for HTTP status failures.
    pub fn body(&self) -> Option<&str> {
        match self {
            ServiceError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
