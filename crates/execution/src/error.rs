//! Batch-level errors.
//!
//! Anything here aborts the whole batch invocation. Per-call failures are
//! reported in the batch response instead.

use chainbatch_core::{ContractError, LedgerError};
use chainbatch_engine::ScopeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("failed to decode batch: {0}")]
    Decode(String),

    #[error("failed to read batch timestamp: {0}")]
    Timestamp(LedgerError),

    #[error("failed to commit batch: {0}")]
    Commit(ScopeError),

    #[error("failed to encode batch response: {0}")]
    Encode(String),

    #[error("failed to emit batch event: {0}")]
    Event(LedgerError),
}

impl From<BatchError> for ContractError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Decode(_) => ContractError::InvalidArgument(err.to_string()),
            other => ContractError::Internal(other.to_string()),
        }
    }
}
