//! Batch execution engine.
//!
//! Turns a list of previously submitted pending calls into one atomic ledger
//! update. Each call is loaded (and consumed) from the pending-call store,
//! run in its own call scope behind a panic boundary, and either merged into
//! the batch scope or discarded. Swap and transfer transitions carried by the
//! batch follow, each in its own call scope. The batch scope is written to the
//! ledger once, at the end, and a single `batchExecute` event describes every
//! call.

mod call;
mod error;
mod executor;

pub use error::BatchError;
pub use executor::{BatchExecutor, BATCH_EVENT};
