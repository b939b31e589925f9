//! Scoped execution contexts.
//!
//! Contract methods executed in a batch never write to the ledger directly.
//! They run inside two nested scopes:
//!
//! ```text
//!  ledger ◄── BatchScope ◄── CallScope (call 1)
//!                        ◄── CallScope (call 2)   dropped on failure
//!                        ◄── CallScope (swap answer)
//! ```
//!
//! - [`CallScope`] buffers one call's writes, events and side records. Reads
//!   check the buffer first, then fall through to the enclosing scope.
//!   [`CallScope::commit`] hands the buffer to the enclosing scope and returns
//!   a [`ScopeSnapshot`] for the call result. Dropping the scope discards it.
//! - [`BatchScope`] accumulates every committed call. [`BatchScope::commit`]
//!   is the only place batch writes reach the ledger, once per batch.
//!
//! Both scopes implement [`LedgerState`](chainbatch_core::LedgerState), so
//! contract code runs in them unchanged.
//!
//! [`contain`] is the error boundary used around method invocations: any
//! panic is turned into an error string instead of unwinding through the
//! batch.

mod boundary;
mod error;
mod overlay;
mod snapshot;

pub use boundary::contain;
pub use error::ScopeError;
pub use overlay::{BatchScope, CallScope};
pub use snapshot::ScopeSnapshot;
