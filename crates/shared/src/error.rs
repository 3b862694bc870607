use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Parse,
    State,
    InvalidArgument,
    OwnerNotFound,
    OwnerExists,
    ThresholdViolation,
    ThresholdNotMet,
    PredecessorMismatch,
    AlreadySubmitted,
    Signing,
    Service,
    Chain,
    Config,
}

impl ErrorCode {
    /// Errors the console reports while keeping the active mode.
    ///
    /// Everything else counts as an unrecovered dispatch failure and sends a
    /// contract or Safe session back to the general console.
    pub fn is_recoverable(self) -> bool {
        !matches!(
            self,
            ErrorCode::Signing | ErrorCode::Service | ErrorCode::Chain | ErrorCode::Config
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_codes_are_recoverable() {
        for code in [
            ErrorCode::Parse,
            ErrorCode::State,
            ErrorCode::OwnerNotFound,
            ErrorCode::ThresholdNotMet,
        ] {
            assert!(code.is_recoverable(), "{code:?}");
        }
        assert!(!ErrorCode::Service.is_recoverable());
        assert!(!ErrorCode::Chain.is_recoverable());
    }

    #[test]
    fn codes_serialize_as_snake_case() {
        let report = ErrorReport::new(ErrorCode::ThresholdNotMet, "1 of 2");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["code"], "threshold_not_met");
    }
}
