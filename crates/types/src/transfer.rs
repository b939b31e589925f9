//! Cross-channel transfer records.

use crate::{token_symbol, Address, Amount, ChannelId};
use serde::{Deserialize, Serialize};

/// One side of a cross-channel transfer.
///
/// The same record exists independently on the origin channel (the "from"
/// record) and on the destination channel (the "to" record). `amount`, `token`
/// and `forward_direction` are fixed when the record is created; only
/// `is_commit` ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChannelTransfer {
    /// Transfer id, chosen by the initiator.
    pub id: String,

    /// Origin channel.
    pub from: ChannelId,

    /// Destination channel.
    pub to: ChannelId,

    /// Token moved.
    pub token: String,

    /// Owner of the moved tokens on both sides.
    pub user: Address,

    /// Amount moved.
    pub amount: Amount,

    /// True when the token is native to the origin channel.
    pub forward_direction: bool,

    /// Creation time, nanoseconds since the epoch.
    pub time_as_nanos: i64,

    /// Commit flag.
    pub is_commit: bool,
}

impl CrossChannelTransfer {
    /// Base symbol of the moved token.
    pub fn token_symbol(&self) -> &str {
        token_symbol(&self.token)
    }
}

/// One page of a paginated transfer listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPage {
    /// Records on this page, in key order.
    pub transfers: Vec<CrossChannelTransfer>,

    /// Key to resume from; empty when the listing is exhausted.
    pub bookmark: String,
}
