//! Core abstractions shared by every layer of the contract runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   invoke    ┌─────────────────┐
//! │  Invocation  │ ──────────► │  MethodRegistry │
//! └──────────────┘             └────────┬────────┘
//!                                       │ handler(ctx, sender, args)
//!                                       ▼
//!                              ┌─────────────────┐
//!                              │ ContractContext │  balances, events, config
//!                              └────────┬────────┘
//!                                       │ &mut dyn LedgerState
//!                                       ▼
//!                              ┌─────────────────┐
//!                              │   LedgerState   │  ledger, batch scope or call scope
//!                              └─────────────────┘
//! ```
//!
//! Handlers never know which [`LedgerState`] they are running against. The
//! same code runs directly on the ledger (queries and non-batched methods),
//! inside a per-call scope of a batch, or against a [`MemoryLedger`] in tests.

pub mod balance;
mod config;
mod context;
mod error;
pub mod keys;
mod ledger;
mod memory;
mod registry;

pub use config::{ConfigError, ContractConfig, NoncePrefix, MAX_DURATION_SECS};
pub use context::ContractContext;
pub use error::{BalanceError, ContractError, ErrorKind, LedgerError};
pub use ledger::{LedgerState, RangeEntry, RangePage, ReadOnlyState, ScopeRecord, TxTimestamp};
pub use memory::MemoryLedger;
pub use registry::{
    parse_arg, require_sender, MethodInfo, MethodKind, MethodRegistry, RegistryError,
};
