//! Swap errors.

use chainbatch_core::{ContractError, LedgerError};
use chainbatch_types::TxId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// The token belongs to neither channel of the swap, or the swap cannot
    /// be completed from this side.
    #[error("incorrect swap")]
    IncorrectSwap,

    /// The revealed key does not hash to the swap's lock.
    #[error("incorrect key")]
    IncorrectKey,

    #[error("{label} doesn't exist by key {id}")]
    NotFound { label: &'static str, id: TxId },

    #[error("{label} {id} already exists")]
    AlreadyExists { label: &'static str, id: TxId },

    #[error("unauthorized")]
    Unauthorized,

    #[error("wait for timeout to end")]
    TimeoutNotReached,

    #[error("{0} disabled")]
    Disabled(&'static str),

    #[error("invalid assets: {0}")]
    InvalidAssets(String),

    #[error("failed to decode swap under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A balance primitive or ledger accessor failed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<SwapError> for ContractError {
    fn from(err: SwapError) -> Self {
        let msg = err.to_string();
        match err {
            SwapError::NotFound { .. } => ContractError::NotFound(msg),
            SwapError::AlreadyExists { .. } => ContractError::AlreadyExists(msg),
            SwapError::IncorrectKey | SwapError::Unauthorized | SwapError::TimeoutNotReached => {
                ContractError::Unauthorized(msg)
            }
            SwapError::IncorrectSwap | SwapError::Disabled(_) | SwapError::InvalidAssets(_) => {
                ContractError::InvalidArgument(msg)
            }
            SwapError::Corrupt { .. } | SwapError::Ledger(_) => ContractError::Internal(msg),
            SwapError::Contract(inner) => inner,
        }
    }
}
