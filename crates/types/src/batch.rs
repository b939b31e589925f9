//! Batch requests and aggregated batch results.

use crate::{
    AccountingRecord, ContractEvent, CrossChannelTransfer, MultiSwapRecord, StateWrite,
    SwapRecord, TxId,
};
use serde::{Deserialize, Serialize};

/// Reveal of a swap's secret key, submitted by the counter-channel service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapKey {
    /// Swap id.
    pub id: TxId,

    /// Secret key (pre-image of the swap's hash-lock).
    pub key: String,
}

/// A service-side cross-channel transfer transition carried by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransferCommand {
    /// Mirror a transfer on this (destination) channel.
    CreateTo { transfer: CrossChannelTransfer },
    /// Set the commit flag on the origin record.
    CommitFrom { id: String },
    /// Cancel an uncommitted origin record.
    CancelFrom { id: String },
    /// Delete a committed origin record.
    DeleteFrom { id: String },
    /// Delete a committed destination record.
    DeleteTo { id: String },
}

impl TransferCommand {
    /// Transfer id the command applies to.
    pub fn transfer_id(&self) -> &str {
        match self {
            TransferCommand::CreateTo { transfer } => &transfer.id,
            TransferCommand::CommitFrom { id }
            | TransferCommand::CancelFrom { id }
            | TransferCommand::DeleteFrom { id }
            | TransferCommand::DeleteTo { id } => id,
        }
    }
}

/// One deterministic execution unit.
///
/// Ephemeral: decoded from the caller's payload for a single execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Pending calls to execute, in order.
    #[serde(default)]
    pub tx_ids: Vec<TxId>,

    /// Swaps to mirror on this channel.
    #[serde(default)]
    pub swaps: Vec<SwapRecord>,

    /// Swap keys revealed on the counter-channel.
    #[serde(default)]
    pub keys: Vec<SwapKey>,

    /// Multi-asset swaps to mirror on this channel.
    #[serde(default)]
    pub multi_swaps: Vec<MultiSwapRecord>,

    /// Multi-asset swap keys revealed on the counter-channel.
    #[serde(default)]
    pub multi_swap_keys: Vec<SwapKey>,

    /// Service-side transfer transitions.
    #[serde(default)]
    pub transfer_commands: Vec<TransferCommand>,
}

/// Error detail attached to a failed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error text.
    pub error: String,
}

impl ResponseError {
    /// Wrap an error message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Result of executing one pending call inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Transaction id of the pending call.
    pub id: TxId,

    /// Method name, empty if the call could not be loaded.
    pub method: String,

    /// Set when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Committed write-set, in key order.
    #[serde(default)]
    pub writes: Vec<StateWrite>,

    /// Events emitted by the call, in emission order.
    #[serde(default)]
    pub events: Vec<ContractEvent>,

    /// Accounting records, sorted by their stable key.
    #[serde(default)]
    pub accounting: Vec<AccountingRecord>,

    /// Method return value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl CallResult {
    /// A failed result carrying no side effects.
    pub fn failed(id: TxId, method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            error: Some(ResponseError::new(error)),
            writes: Vec::new(),
            events: Vec::new(),
            accounting: Vec::new(),
            result: None,
        }
    }

    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Event-payload view of this result.
    pub fn to_event(&self) -> BatchTxEvent {
        BatchTxEvent {
            id: self.id.clone(),
            method: self.method.clone(),
            error: self.error.clone(),
            events: self.events.clone(),
            accounting: self.accounting.clone(),
            result: self.result.clone(),
        }
    }
}

/// Per-call entry of the aggregated batch event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTxEvent {
    pub id: TxId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub events: Vec<ContractEvent>,
    #[serde(default)]
    pub accounting: Vec<AccountingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Result of one swap answer or key reveal processed by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResponse {
    pub id: TxId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub writes: Vec<StateWrite>,
}

/// Result of one transfer command processed by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub writes: Vec<StateWrite>,
}

/// Aggregated response of a batch execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub tx_responses: Vec<CallResult>,
    pub swap_responses: Vec<SwapResponse>,
    pub swap_key_responses: Vec<SwapResponse>,
    pub transfer_responses: Vec<TransferResponse>,
    /// Swaps begun by calls of this batch.
    pub created_swaps: Vec<SwapRecord>,
    /// Multi-asset swaps begun by calls of this batch.
    pub created_multi_swaps: Vec<MultiSwapRecord>,
}

/// Aggregated event payload of a batch execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub events: Vec<BatchTxEvent>,
}
