//! Error types for the pending-call store and nonce guard.

use chainbatch_core::{ContractError, LedgerError};
use chainbatch_types::TxId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonceError {
    /// The nonce is not greater than the last one accepted for the sender.
    #[error("incorrect nonce {nonce}, must be greater than last used {last}")]
    Stale { nonce: u64, last: u64 },

    #[error("failed to decode nonce record: {0}")]
    Decode(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PendingError {
    #[error("method '{0}' not found")]
    MethodNotFound(String),

    #[error("{0}")]
    ArgumentError(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    #[error(
        "transaction expired: batch timestamp {batch_timestamp}, submitted at {submitted}, ttl {ttl}"
    )]
    TransactionExpired {
        batch_timestamp: i64,
        submitted: i64,
        ttl: u64,
    },

    #[error("unknown method {0}")]
    UnknownMethod(String),

    #[error("sender address is empty")]
    MissingSender,

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("failed to decode pending call: {0}")]
    Decode(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A failed [`load`](crate::PendingStore::load), with the method name when
/// the record was readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct LoadFailure {
    pub method: Option<String>,
    pub error: PendingError,
}

impl LoadFailure {
    pub(crate) fn new(method: Option<&str>, error: impl Into<PendingError>) -> Self {
        Self {
            method: method.map(str::to_string),
            error: error.into(),
        }
    }
}

impl From<NonceError> for ContractError {
    fn from(err: NonceError) -> Self {
        match err {
            NonceError::Stale { .. } => ContractError::Unauthorized(err.to_string()),
            other => ContractError::Internal(other.to_string()),
        }
    }
}

impl From<PendingError> for ContractError {
    fn from(err: PendingError) -> Self {
        let msg = err.to_string();
        match err {
            PendingError::MethodNotFound(_)
            | PendingError::TransactionNotFound(_)
            | PendingError::UnknownMethod(_) => ContractError::NotFound(msg),
            PendingError::ArgumentError(_) => ContractError::InvalidArgument(msg),
            PendingError::TransactionExpired { .. } => ContractError::Expired(msg),
            PendingError::MissingSender => ContractError::Unauthorized(msg),
            PendingError::Nonce(nonce) => nonce.into(),
            PendingError::Decode(_) | PendingError::Ledger(_) => ContractError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainbatch_core::ErrorKind;

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (PendingError::MethodNotFound("m".into()), ErrorKind::NotFound),
            (
                PendingError::TransactionNotFound(TxId(vec![1])),
                ErrorKind::NotFound,
            ),
            (PendingError::ArgumentError("bad".into()), ErrorKind::InvalidArgument),
            (
                PendingError::TransactionExpired {
                    batch_timestamp: 10,
                    submitted: 1,
                    ttl: 5,
                },
                ErrorKind::Expired,
            ),
            (PendingError::MissingSender, ErrorKind::Unauthorized),
            (
                PendingError::Nonce(NonceError::Stale { nonce: 1, last: 2 }),
                ErrorKind::Unauthorized,
            ),
            (PendingError::Decode("x".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(ContractError::from(err).kind(), kind);
        }
    }
}
