//! Multi-asset swaps.
//!
//! Every asset is a token group of the same base symbol. Balance moves are
//! applied per asset with the same direction rules as single swaps.

use crate::batch::run_in_scope;
use crate::lock::{self, SwapLock};
use crate::SwapError;
use chainbatch_core::{ContractConfig, ContractContext, LedgerState, ScopeRecord};
use chainbatch_types::{
    token_symbol, Address, Amount, Asset, ChannelId, Hash, MultiSwapRecord, SwapKey,
    SwapResponse, TxId, ROBOT_CREATOR,
};
use std::collections::HashSet;

impl SwapLock for MultiSwapRecord {
    const OBJECT_TYPE: &'static str = "multi_swap";
    const LABEL: &'static str = "multiswap";

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
        self.assets
            .iter()
            .map(|asset| (asset.group.clone(), asset.amount))
            .collect()
    }

    fn mark_mirrored(&mut self, timeout: i64) {
        self.creator = ROBOT_CREATOR;
        self.timeout = timeout;
    }

    fn created(&self) -> ScopeRecord {
        ScopeRecord::CreatedMultiSwap(self.clone())
    }
}

fn validate_assets(token: &str, assets: &[Asset]) -> Result<(), SwapError> {
    if assets.is_empty() {
        return Err(SwapError::InvalidAssets("no assets".into()));
    }
    let mut seen = HashSet::new();
    for asset in assets {
        if !token_symbol(&asset.group).eq_ignore_ascii_case(token_symbol(token)) {
            return Err(SwapError::InvalidAssets(format!(
                "group {} does not belong to {}",
                asset.group, token
            )));
        }
        if asset.amount.is_zero() {
            return Err(SwapError::InvalidAssets(format!(
                "zero amount for {}",
                asset.group
            )));
        }
        if !seen.insert(asset.group.as_str()) {
            return Err(SwapError::InvalidAssets(format!(
                "duplicate group {}",
                asset.group
            )));
        }
    }
    Ok(())
}

/// Lock every asset owned by `sender` for a swap towards `to`.
///
/// Returns the swap id in hex.
pub fn multi_swap_begin(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    token: &str,
    assets: Vec<Asset>,
    to: &ChannelId,
    hash: Hash,
) -> Result<String, SwapError> {
    if ctx.config().disable_multi_swaps {
        return Err(SwapError::Disabled("multi swaps"));
    }
    validate_assets(token, &assets)?;
    let now = ctx.timestamp()?.seconds;
    let swap = MultiSwapRecord {
        id: ctx.tx_id(),
        creator: *sender,
        owner: *sender,
        token: token.to_string(),
        assets,
        from: ctx.channel().clone(),
        to: to.clone(),
        hash,
        timeout: now.saturating_add(ctx.config().user_side_timeout_secs()),
    };
    lock::begin(ctx, swap)
}

/// Mirror a multi-asset swap on this channel as part of a batch.
pub fn multi_swap_answer(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    swap: &MultiSwapRecord,
) -> SwapResponse {
    run_in_scope(parent, config, &swap.id, |ctx| {
        validate_assets(&swap.token, &swap.assets)?;
        lock::answer(ctx, swap.clone())
    })
}

pub fn multi_swap_robot_done(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    key: &SwapKey,
) -> SwapResponse {
    run_in_scope(parent, config, &key.id, |ctx| {
        lock::robot_done::<MultiSwapRecord>(ctx, &key.id, &key.key)
    })
}

pub fn multi_swap_user_done(
    ctx: &mut ContractContext<'_>,
    id: &TxId,
    key: &str,
) -> Result<(), SwapError> {
    lock::user_done::<MultiSwapRecord>(ctx, id, key)
}

pub fn multi_swap_cancel(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    id: &TxId,
) -> Result<(), SwapError> {
    lock::cancel::<MultiSwapRecord>(ctx, sender, id)
}

pub fn multi_swap_get(state: &dyn LedgerState, id: &TxId) -> Result<MultiSwapRecord, SwapError> {
    lock::load(state, id)
}
