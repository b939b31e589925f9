//! Atomic swap records.

use crate::{token_symbol, Address, Amount, ChannelId, Hash, TxId};
use serde::{Deserialize, Serialize};

/// Creator stamped on swaps mirrored by the counter-channel service.
///
/// No key pair maps to the all-zero address, so it never collides with a user.
pub const ROBOT_CREATOR: Address = Address([0u8; 32]);

/// A hash-locked swap of one token between two channels.
///
/// Created by the initiating user (`creator == owner`) on the origin channel,
/// mirrored on the counter-channel with `creator == ROBOT_CREATOR`, and
/// deleted when closed by key reveal or cancellation. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Swap id (the id of the transaction that began it).
    pub id: TxId,

    /// Who created this record.
    pub creator: Address,

    /// Whose funds are held.
    pub owner: Address,

    /// Token held.
    pub token: String,

    /// Amount held.
    pub amount: Amount,

    /// Origin channel.
    pub from: ChannelId,

    /// Destination channel.
    pub to: ChannelId,

    /// Digest of the secret key that releases the swap.
    pub hash: Hash,

    /// Epoch second after which the swap may be cancelled.
    pub timeout: i64,
}

impl SwapRecord {
    /// Base symbol of the held token.
    pub fn token_symbol(&self) -> &str {
        token_symbol(&self.token)
    }

    /// Whether the record was created by the counter-channel service.
    pub fn is_robot_created(&self) -> bool {
        self.creator == ROBOT_CREATOR
    }
}

/// One asset of a multi-asset swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Token group, e.g. `"VT_1"`.
    pub group: String,

    /// Amount of this group.
    pub amount: Amount,
}

/// A hash-locked swap of several token groups sharing one base symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSwapRecord {
    /// Swap id.
    pub id: TxId,

    /// Who created this record.
    pub creator: Address,

    /// Whose funds are held.
    pub owner: Address,

    /// Base symbol shared by all assets.
    pub token: String,

    /// Held assets.
    pub assets: Vec<Asset>,

    /// Origin channel.
    pub from: ChannelId,

    /// Destination channel.
    pub to: ChannelId,

    /// Digest of the secret key that releases the swap.
    pub hash: Hash,

    /// Epoch second after which the swap may be cancelled.
    pub timeout: i64,
}

impl MultiSwapRecord {
    /// Base symbol of the held tokens.
    pub fn token_symbol(&self) -> &str {
        token_symbol(&self.token)
    }

    /// Whether the record was created by the counter-channel service.
    pub fn is_robot_created(&self) -> bool {
        self.creator == ROBOT_CREATOR
    }
}
