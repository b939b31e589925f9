//! Pending calls waiting for a batch.
//!
//! Batched methods are not executed when invoked. The invocation is checked
//! against the method registry and stored by [`PendingStore::submit`] under a
//! key derived from its transaction id. A later batch names that id and
//! [`PendingStore::load`] consumes the record: it is deleted on the first
//! load attempt whatever the outcome, so a call runs at most once.
//!
//! Replay protection is the job of [`NonceGuard`]. With a nonce TTL
//! configured, nonces are checked when a call is loaded for execution;
//! without one, they are checked when the call is submitted.
//!
//! # Components
//!
//! - [`PendingStore`] - submit/load of [`PendingCall`](chainbatch_types::PendingCall)s
//! - [`NonceGuard`] - per-sender strictly increasing nonces
//! - [`PendingError`], [`NonceError`] - failure taxonomy, convertible into
//!   [`ContractError`](chainbatch_core::ContractError)

mod error;
mod nonce;
mod store;

pub use error::{LoadFailure, NonceError, PendingError};
pub use nonce::NonceGuard;
pub use store::PendingStore;
