//! Core data types for batched contract execution.
//!
//! Everything in this crate is plain data: identifiers, amounts, the records
//! persisted by the pending-call store and the two cross-channel protocols,
//! and the request/response shapes of a batch execution. No type here touches
//! the ledger.

mod amount;
mod batch;
mod hash;
mod identifiers;
mod pending;
mod state;
mod swap;
mod transfer;

pub mod serde_hex;

pub use amount::{Amount, AmountError};
pub use batch::{
    Batch, BatchEvent, BatchResponse, BatchTxEvent, CallResult, ResponseError, SwapKey,
    SwapResponse, TransferCommand, TransferResponse,
};
pub use hash::{Hash, HexError};
pub use identifiers::{token_symbol, Address, ChannelId, TxId};
pub use pending::PendingCall;
pub use state::{AccountingRecord, ContractEvent, StateWrite};
pub use swap::{Asset, MultiSwapRecord, SwapRecord, ROBOT_CREATOR};
pub use transfer::{CrossChannelTransfer, TransferPage};
