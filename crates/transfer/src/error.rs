//! Transfer errors.

use chainbatch_core::{ContractError, LedgerError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("id transfer is empty")]
    EmptyId,

    #[error("transfer not found")]
    NotFound,

    #[error("invalid argument id user")]
    InvalidUser,

    #[error("invalid argument token")]
    InvalidToken,

    #[error("invalid argument channel to")]
    InvalidChannel,

    #[error("not found admin public key")]
    AdminKeyNotFound,

    #[error("id transfer already exists")]
    AlreadyExists,

    #[error("transfer already commit")]
    AlreadyCommitted,

    #[error("transfer not commit")]
    NotCommitted,

    #[error("invalid bookmark")]
    InvalidBookmark,

    #[error("page size is less or equal to zero")]
    InvalidPageSize,

    #[error("invalid transfer payload: {0}")]
    InvalidPayload(String),

    #[error("failed to decode transfer under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A balance primitive or ledger accessor failed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<TransferError> for ContractError {
    fn from(err: TransferError) -> Self {
        let msg = err.to_string();
        match err {
            TransferError::NotFound => ContractError::NotFound(msg),
            TransferError::AlreadyExists => ContractError::AlreadyExists(msg),
            TransferError::AlreadyCommitted => ContractError::AlreadyCommitted(msg),
            TransferError::AdminKeyNotFound => ContractError::Unauthorized(msg),
            TransferError::EmptyId
            | TransferError::InvalidUser
            | TransferError::InvalidToken
            | TransferError::InvalidChannel
            | TransferError::NotCommitted
            | TransferError::InvalidBookmark
            | TransferError::InvalidPageSize
            | TransferError::InvalidPayload(_) => ContractError::InvalidArgument(msg),
            TransferError::Corrupt { .. } | TransferError::Ledger(_) => {
                ContractError::Internal(msg)
            }
            TransferError::Contract(inner) => inner,
        }
    }
}
