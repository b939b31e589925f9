//! Error types for scoped execution.

use chainbatch_core::{ContractError, LedgerError};
use thiserror::Error;

/// Errors committing a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Merging a call scope into its parent failed.
    #[error("failed to merge {key} into parent scope: {source}")]
    Merge { key: String, source: LedgerError },

    /// Writing the batch write-set to the ledger failed.
    #[error("batch commit failed: {0}")]
    Commit(LedgerError),
}

impl From<ScopeError> for ContractError {
    fn from(err: ScopeError) -> Self {
        ContractError::Internal(err.to_string())
    }
}
