//! Single-token swaps.

use crate::batch::run_in_scope;
use crate::lock::{self, SwapLock};
use crate::SwapError;
use chainbatch_core::{ContractConfig, ContractContext, LedgerState, ScopeRecord};
use chainbatch_types::{
    Address, Amount, ChannelId, Hash, SwapKey, SwapRecord, SwapResponse, TxId, ROBOT_CREATOR,
};

impl SwapLock for SwapRecord {
    const OBJECT_TYPE: &'static str = "swaps";
    const LABEL: &'static str = "swap";

    fn id(&self) -> &TxId {
        &self.id
    }

    fn creator(&self) -> &Address {
        &self.creator
    }

    fn owner(&self) -> &Address {
        &self.owner
    }

    fn symbol(&self) -> &str {
        self.token_symbol()
    }

    fn from(&self) -> &ChannelId {
        &self.from
    }

    fn to(&self) -> &ChannelId {
        &self.to
    }

    fn hash(&self) -> &Hash {
        &self.hash
    }

    fn timeout(&self) -> i64 {
        self.timeout
    }

    fn holdings(&self) -> Vec<(String, Amount)> {
        vec![(self.token.clone(), self.amount)]
    }

    fn mark_mirrored(&mut self, timeout: i64) {
        self.creator = ROBOT_CREATOR;
        self.timeout = timeout;
    }

    fn created(&self) -> ScopeRecord {
        ScopeRecord::CreatedSwap(self.clone())
    }
}

/// Lock `amount` of `token` owned by `sender` for a swap towards `to`.
///
/// The swap id is the id of the current transaction. Returns the id in hex.
pub fn swap_begin(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    token: &str,
    to: &ChannelId,
    amount: Amount,
    hash: Hash,
) -> Result<String, SwapError> {
    if ctx.config().disable_swaps {
        return Err(SwapError::Disabled("swaps"));
    }
    if amount.is_zero() {
        return Err(SwapError::IncorrectSwap);
    }
    let now = ctx.timestamp()?.seconds;
    let swap = SwapRecord {
        id: ctx.tx_id(),
        creator: *sender,
        owner: *sender,
        token: token.to_string(),
        amount,
        from: ctx.channel().clone(),
        to: to.clone(),
        hash,
        timeout: now.saturating_add(ctx.config().user_side_timeout_secs()),
    };
    lock::begin(ctx, swap)
}

/// Mirror `swap` on this channel as part of a batch.
pub fn swap_answer(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    swap: &SwapRecord,
) -> SwapResponse {
    run_in_scope(parent, config, &swap.id, |ctx| lock::answer(ctx, swap.clone()))
}

/// Close a swap with a key revealed on the counter-channel, as part of a batch.
pub fn swap_robot_done(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    key: &SwapKey,
) -> SwapResponse {
    run_in_scope(parent, config, &key.id, |ctx| {
        lock::robot_done::<SwapRecord>(ctx, &key.id, &key.key)
    })
}

/// Close a mirrored swap by revealing its key.
pub fn swap_user_done(ctx: &mut ContractContext<'_>, id: &TxId, key: &str) -> Result<(), SwapError> {
    lock::user_done::<SwapRecord>(ctx, id, key)
}

pub fn swap_cancel(ctx: &mut ContractContext<'_>, sender: &Address, id: &TxId) -> Result<(), SwapError> {
    lock::cancel::<SwapRecord>(ctx, sender, id)
}

pub fn swap_get(state: &dyn LedgerState, id: &TxId) -> Result<SwapRecord, SwapError> {
    lock::load(state, id)
}
