//! Pending calls awaiting batch execution.

use crate::{Address, TxId};
use serde::{Deserialize, Serialize};

/// A submitted method invocation waiting to be executed by a batch.
///
/// Written once at submission and consumed (read and deleted) exactly once by
/// the batch that names its transaction id. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    /// Id of the submitting transaction. Not stored; it is the record's key.
    #[serde(skip)]
    pub tx_id: TxId,

    /// Registered method name.
    pub method: String,

    /// Authenticated sender, if the method needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,

    /// Raw arguments, sender excluded.
    #[serde(default)]
    pub args: Vec<String>,

    /// Submission time, seconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,

    /// Sender nonce recorded at submission.
    #[serde(default)]
    pub nonce: u64,
}
