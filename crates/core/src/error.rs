//! Error types shared across the contract runtime.

use chainbatch_types::Amount;
use thiserror::Error;

/// Errors raised by a [`LedgerState`](crate::LedgerState) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The backing store failed.
    #[error("ledger error: {0}")]
    Backend(String),

    /// A write was attempted through a read-only view.
    #[error("write attempted in read-only context")]
    ReadOnly,

    /// A composite key could not be built.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The transaction timestamp is unavailable.
    #[error("failed to get tx timestamp: {0}")]
    Timestamp(String),
}

/// Errors from balance primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("insufficient funds to process: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },

    #[error("balance overflow")]
    Overflow,

    #[error("corrupt balance under key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Category of a [`ContractError`], used by callers that branch on the
/// failure rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    AlreadyCommitted,
    Expired,
    InvalidArgument,
    Unauthorized,
    InsufficientFunds,
    Internal,
}

/// Error returned by contract methods.
///
/// The message is what ends up in a failed call result, so it is kept
/// verbatim from the protocol that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    AlreadyCommitted(String),

    #[error("{0}")]
    Expired(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InsufficientFunds(String),

    #[error("{0}")]
    Internal(String),
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::AlreadyCommitted(_) => ErrorKind::AlreadyCommitted,
            Self::Expired(_) => ErrorKind::Expired,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<LedgerError> for ContractError {
    fn from(err: LedgerError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<BalanceError> for ContractError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InsufficientFunds { .. } => Self::InsufficientFunds(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_error_maps_to_kind() {
        let err: ContractError = BalanceError::InsufficientFunds {
            have: Amount::new(1),
            need: Amount::new(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(
            err.to_string(),
            "insufficient funds to process: have 1, need 2"
        );

        let err: ContractError = BalanceError::Ledger(LedgerError::ReadOnly).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_message_is_verbatim() {
        let err = ContractError::NotFound("transfer not found".into());
        assert_eq!(err.to_string(), "transfer not found");
    }
}
