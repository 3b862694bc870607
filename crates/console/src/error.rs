use alloy::primitives::B256;
use safe::SafeError;
use service_client::ServiceError;
use shared::error::{ErrorCode, ErrorReport};
use thiserror::Error;

use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    State(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Safe(#[from] SafeError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("transaction {0} was already submitted")]
    AlreadySubmitted(B256),
    #[error("config: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConsoleError::Parse(_) => ErrorCode::Parse,
            ConsoleError::State(_) => ErrorCode::State,
            ConsoleError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ConsoleError::Safe(err) => err.code(),
            ConsoleError::Service(err) => err.code(),
            ConsoleError::AlreadySubmitted(_) => ErrorCode::AlreadySubmitted,
            ConsoleError::Config(_) => ErrorCode::Config,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> ConsoleError {
    ConsoleError::InvalidArgument(message.into())
}
