use alloy::primitives::Address;
use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafeError {
    #[error("owner {0} is not an owner of this safe")]
    OwnerNotFound(Address),
    #[error("owner {0} is already an owner of this safe")]
    OwnerExists(Address),
    #[error("address {0} cannot be used as a safe owner")]
    InvalidOwner(Address),
    #[error("threshold {threshold} is invalid for {owners} owner(s)")]
    ThresholdViolation { threshold: u64, owners: usize },
    #[error("threshold not met: {collected} of {required} required signature(s) collected")]
    ThresholdNotMet { required: u64, collected: usize },
    #[error("predecessor mismatch for {owner}: sorted view gives {sorted}, on-chain order gives {on_chain}")]
    PredecessorMismatch {
        owner: Address,
        sorted: Address,
        on_chain: Address,
    },
    #[error("invalid signer key: {0}")]
    InvalidKey(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("chain state unavailable for safe {safe}: {message}")]
    Chain { safe: Address, message: String },
}

impl SafeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SafeError::OwnerNotFound(_) => ErrorCode::OwnerNotFound,
            SafeError::OwnerExists(_) => ErrorCode::OwnerExists,
            SafeError::InvalidOwner(_) | SafeError::InvalidKey(_) => ErrorCode::InvalidArgument,
            SafeError::ThresholdViolation { .. } => ErrorCode::ThresholdViolation,
            SafeError::ThresholdNotMet { .. } => ErrorCode::ThresholdNotMet,
            SafeError::PredecessorMismatch { .. } => ErrorCode::PredecessorMismatch,
            SafeError::Signing(_) => ErrorCode::Signing,
            SafeError::Chain { .. } => ErrorCode::Chain,
        }
    }
}

impl From<alloy::signers::Error> for SafeError {
    fn from(value: alloy::signers::Error) -> Self {
        SafeError::Signing(value.to_string())
    }
}
