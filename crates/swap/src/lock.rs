//! Operations shared by single and multi-asset swaps.

use crate::SwapError;
use chainbatch_core::{keys, ContractContext, LedgerState, ScopeRecord};
use chainbatch_types::{Address, Amount, ChannelId, Hash, TxId, ROBOT_CREATOR};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Name of the event emitted when a user reveals a swap key.
pub const KEY_EVENT: &str = "key";

const REASON: &str = "swap";

/// A stored hash-locked swap.
pub(crate) trait SwapLock: Serialize + DeserializeOwned + Clone {
    /// Composite-key object type of the stored records.
    const OBJECT_TYPE: &'static str;
    /// Name used in error messages and logs.
    const LABEL: &'static str;

    fn id(&self) -> &TxId;
    fn creator(&self) -> &Address;
    fn owner(&self) -> &Address;
    fn symbol(&self) -> &str;
    fn from(&self) -> &ChannelId;
    fn to(&self) -> &ChannelId;
    fn hash(&self) -> &Hash;
    fn timeout(&self) -> i64;
    /// `(token, amount)` pairs held by the swap.
    fn holdings(&self) -> Vec<(String, Amount)>;
    /// Stamp the record as mirrored by the channel-transfer service.
    fn mark_mirrored(&mut self, timeout: i64);
    /// Side record announcing the creation of this swap.
    fn created(&self) -> ScopeRecord;
}

/// Which channel of the swap the held token is native to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    From,
    To,
}

fn side<S: SwapLock>(swap: &S) -> Result<Side, SwapError> {
    if swap.from().is_exactly(swap.symbol()) {
        Ok(Side::From)
    } else if swap.to().is_exactly(swap.symbol()) {
        Ok(Side::To)
    } else {
        Err(SwapError::IncorrectSwap)
    }
}

pub(crate) fn key<S: SwapLock>(id: &TxId) -> Result<String, SwapError> {
    Ok(keys::composite_key(S::OBJECT_TYPE, &[&id.to_hex()])?)
}

pub(crate) fn load<S: SwapLock>(state: &dyn LedgerState, id: &TxId) -> Result<S, SwapError> {
    let key = key::<S>(id)?;
    match state.get_state(&key)? {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_slice(&raw).map_err(|e| SwapError::Corrupt {
                key,
                reason: e.to_string(),
            })
        }
        _ => Err(SwapError::NotFound {
            label: S::LABEL,
            id: id.clone(),
        }),
    }
}

fn exists<S: SwapLock>(state: &dyn LedgerState, id: &TxId) -> Result<bool, SwapError> {
    Ok(state
        .get_state(&key::<S>(id)?)?
        .is_some_and(|raw| !raw.is_empty()))
}

fn save<S: SwapLock>(state: &mut dyn LedgerState, swap: &S) -> Result<(), SwapError> {
    let key = key::<S>(swap.id())?;
    let raw = serde_json::to_vec(swap).map_err(|e| SwapError::Corrupt {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok(state.put_state(&key, raw)?)
}

fn delete<S: SwapLock>(state: &mut dyn LedgerState, id: &TxId) -> Result<(), SwapError> {
    Ok(state.del_state(&key::<S>(id)?)?)
}

fn check_key<S: SwapLock>(swap: &S, key: &str) -> Result<(), SwapError> {
    if swap.hash().is_preimage(key.as_bytes()) {
        Ok(())
    } else {
        warn!(swap = %swap.id(), label = S::LABEL, "Swap key does not match lock");
        Err(SwapError::IncorrectKey)
    }
}

/// Debit the owner and store a new user-created swap.
pub(crate) fn begin<S: SwapLock>(ctx: &mut ContractContext<'_>, swap: S) -> Result<String, SwapError> {
    if swap.from() == swap.to() {
        return Err(SwapError::IncorrectSwap);
    }
    let side = side(&swap)?;
    if exists::<S>(ctx.state_ref(), swap.id())? {
        return Err(SwapError::AlreadyExists {
            label: S::LABEL,
            id: swap.id().clone(),
        });
    }

    let owner = *swap.owner();
    for (token, amount) in swap.holdings() {
        match side {
            Side::From => ctx.token_balance_sub(&token, &owner, amount, REASON)?,
            Side::To => ctx.allowed_balance_sub(&token, &owner, amount, REASON)?,
        }
    }
    save(ctx.state(), &swap)?;
    ctx.record(swap.created());

    debug!(swap = %swap.id(), label = S::LABEL, to = %swap.to(), "Swap begun");
    Ok(swap.id().to_hex())
}

/// Mirror a swap begun on the counter-channel.
pub(crate) fn answer<S: SwapLock>(ctx: &mut ContractContext<'_>, mut swap: S) -> Result<(), SwapError> {
    let now = ctx.timestamp()?.seconds;
    swap.mark_mirrored(now.saturating_add(ctx.config().robot_side_timeout_secs()));

    let side = side(&swap)?;
    if exists::<S>(ctx.state_ref(), swap.id())? {
        return Err(SwapError::AlreadyExists {
            label: S::LABEL,
            id: swap.id().clone(),
        });
    }
    if side == Side::To {
        for (_, amount) in swap.holdings() {
            ctx.given_balance_sub(swap.from(), amount)?;
        }
    }
    save(ctx.state(), &swap)?;

    debug!(swap = %swap.id(), label = S::LABEL, "Swap answered");
    Ok(())
}

/// Close a swap with a key revealed on the counter-channel.
pub(crate) fn robot_done<S: SwapLock>(
    ctx: &mut ContractContext<'_>,
    id: &TxId,
    key: &str,
) -> Result<(), SwapError> {
    let swap: S = load(ctx.state_ref(), id)?;
    check_key(&swap, key)?;

    if side(&swap)? == Side::From {
        for (_, amount) in swap.holdings() {
            ctx.given_balance_add(swap.to(), amount)?;
        }
    }
    delete::<S>(ctx.state(), id)?;

    debug!(swap = %id, label = S::LABEL, "Swap closed by service");
    Ok(())
}

/// Close a mirrored swap by revealing its key, crediting the owner.
pub(crate) fn user_done<S: SwapLock>(
    ctx: &mut ContractContext<'_>,
    id: &TxId,
    key: &str,
) -> Result<(), SwapError> {
    let swap: S = load(ctx.state_ref(), id)?;
    check_key(&swap, key)?;
    if swap.creator() == swap.owner() {
        return Err(SwapError::IncorrectSwap);
    }

    let owner = *swap.owner();
    let side = side(&swap)?;
    for (token, amount) in swap.holdings() {
        match side {
            Side::From => ctx.allowed_balance_add(&token, &owner, amount, REASON)?,
            Side::To => ctx.token_balance_add(&token, &owner, amount, REASON)?,
        }
    }
    delete::<S>(ctx.state(), id)?;

    let payload = format!("{}\t{}\t{}", swap.from(), id.to_hex(), key);
    ctx.emit_event(KEY_EVENT, payload.into_bytes())?;

    debug!(swap = %id, label = S::LABEL, "Swap closed by owner");
    Ok(())
}

/// Cancel a swap and undo its balance effect.
///
/// The channel admin may cancel any swap at any time. The owner of a swap
/// they created may cancel it once its timeout has been reached.
pub(crate) fn cancel<S: SwapLock>(
    ctx: &mut ContractContext<'_>,
    sender: &Address,
    id: &TxId,
) -> Result<(), SwapError> {
    let swap: S = load(ctx.state_ref(), id)?;
    authorize_cancel(ctx, sender, &swap)?;

    let owner = *swap.owner();
    let user_created = swap.creator() == swap.owner();
    let side = side(&swap).ok();
    for (token, amount) in swap.holdings() {
        match (user_created, swap.creator() == &ROBOT_CREATOR, side) {
            (true, _, Some(Side::From)) => {
                ctx.token_balance_add(&token, &owner, amount, REASON)?;
            }
            (true, _, Some(Side::To)) => {
                ctx.allowed_balance_add(&token, &owner, amount, REASON)?;
            }
            (false, true, Some(Side::To)) => {
                ctx.given_balance_add(swap.from(), amount)?;
            }
            _ => {}
        }
    }
    delete::<S>(ctx.state(), id)?;

    debug!(swap = %id, label = S::LABEL, sender = %sender, "Swap cancelled");
    Ok(())
}

fn authorize_cancel<S: SwapLock>(
    ctx: &ContractContext<'_>,
    sender: &Address,
    swap: &S,
) -> Result<(), SwapError> {
    if ctx.config().admin.as_ref() == Some(sender) {
        return Ok(());
    }
    if swap.creator() == swap.owner() && swap.owner() == sender {
        if ctx.timestamp()?.seconds < swap.timeout() {
            return Err(SwapError::TimeoutNotReached);
        }
        return Ok(());
    }
    Err(SwapError::Unauthorized)
}
