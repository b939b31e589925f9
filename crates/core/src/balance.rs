//! Balance primitives.
//!
//! Three pools are tracked:
//!
//! - **token balance**: an address's own holding of a token native to this
//!   channel (`VT`, `VT_1`, ...);
//! - **allowed balance**: an address's holding of a token native to another
//!   channel, received through a transfer or swap;
//! - **given balance**: per destination channel, the amount of native tokens
//!   that currently lives on that channel as allowed balance.
//!
//! Amounts are stored as decimal strings. Every change to a token or allowed
//! balance emits an [`AccountingRecord`] through [`LedgerState::record`].

use crate::{keys, BalanceError, LedgerState, ScopeRecord};
use chainbatch_types::{AccountingRecord, Address, Amount, ChannelId};

const TOKEN_BALANCE: &str = "tokenBalance";
const ALLOWED_BALANCE: &str = "allowedBalance";
const GIVEN_BALANCE: &str = "givenBalance";

pub fn token_balance_key(token: &str, address: &Address) -> Result<String, BalanceError> {
    Ok(keys::composite_key(TOKEN_BALANCE, &[token, &address.to_hex()])?)
}

pub fn allowed_balance_key(token: &str, address: &Address) -> Result<String, BalanceError> {
    Ok(keys::composite_key(ALLOWED_BALANCE, &[token, &address.to_hex()])?)
}

pub fn given_balance_key(channel: &ChannelId) -> Result<String, BalanceError> {
    Ok(keys::composite_key(GIVEN_BALANCE, &[channel.as_str()])?)
}

pub fn token_balance(
    state: &dyn LedgerState,
    token: &str,
    address: &Address,
) -> Result<Amount, BalanceError> {
    read(state, &token_balance_key(token, address)?)
}

pub fn token_balance_add(
    state: &mut dyn LedgerState,
    token: &str,
    address: &Address,
    amount: Amount,
    reason: &str,
) -> Result<(), BalanceError> {
    add(state, &token_balance_key(token, address)?, amount)?;
    state.record(credit(token, address, amount, reason));
    Ok(())
}

pub fn token_balance_sub(
    state: &mut dyn LedgerState,
    token: &str,
    address: &Address,
    amount: Amount,
    reason: &str,
) -> Result<(), BalanceError> {
    sub(state, &token_balance_key(token, address)?, amount)?;
    state.record(debit(token, address, amount, reason));
    Ok(())
}

pub fn allowed_balance(
    state: &dyn LedgerState,
    token: &str,
    address: &Address,
) -> Result<Amount, BalanceError> {
    read(state, &allowed_balance_key(token, address)?)
}

pub fn allowed_balance_add(
    state: &mut dyn LedgerState,
    token: &str,
    address: &Address,
    amount: Amount,
    reason: &str,
) -> Result<(), BalanceError> {
    add(state, &allowed_balance_key(token, address)?, amount)?;
    state.record(credit(token, address, amount, reason));
    Ok(())
}

pub fn allowed_balance_sub(
    state: &mut dyn LedgerState,
    token: &str,
    address: &Address,
    amount: Amount,
    reason: &str,
) -> Result<(), BalanceError> {
    sub(state, &allowed_balance_key(token, address)?, amount)?;
    state.record(debit(token, address, amount, reason));
    Ok(())
}

pub fn given_balance(state: &dyn LedgerState, channel: &ChannelId) -> Result<Amount, BalanceError> {
    read(state, &given_balance_key(channel)?)
}

pub fn given_balance_add(
    state: &mut dyn LedgerState,
    channel: &ChannelId,
    amount: Amount,
) -> Result<(), BalanceError> {
    add(state, &given_balance_key(channel)?, amount)
}

pub fn given_balance_sub(
    state: &mut dyn LedgerState,
    channel: &ChannelId,
    amount: Amount,
) -> Result<(), BalanceError> {
    sub(state, &given_balance_key(channel)?, amount)
}

fn read(state: &dyn LedgerState, key: &str) -> Result<Amount, BalanceError> {
    let Some(raw) = state.get_state(key)? else {
        return Ok(Amount::ZERO);
    };
    if raw.is_empty() {
        return Ok(Amount::ZERO);
    }
    let text = std::str::from_utf8(&raw).map_err(|e| BalanceError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    text.parse().map_err(|e: chainbatch_types::AmountError| BalanceError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn write(state: &mut dyn LedgerState, key: &str, amount: Amount) -> Result<(), BalanceError> {
    if amount.is_zero() {
        state.del_state(key)?;
    } else {
        state.put_state(key, amount.to_string().into_bytes())?;
    }
    Ok(())
}

fn add(state: &mut dyn LedgerState, key: &str, amount: Amount) -> Result<(), BalanceError> {
    let current = read(state, key)?;
    let next = current.checked_add(amount).ok_or(BalanceError::Overflow)?;
    write(state, key, next)
}

fn sub(state: &mut dyn LedgerState, key: &str, amount: Amount) -> Result<(), BalanceError> {
    let current = read(state, key)?;
    let next = current
        .checked_sub(amount)
        .ok_or(BalanceError::InsufficientFunds {
            have: current,
            need: amount,
        })?;
    write(state, key, next)
}

fn credit(token: &str, address: &Address, amount: Amount, reason: &str) -> ScopeRecord {
    ScopeRecord::Accounting(AccountingRecord {
        token: token.to_string(),
        sender: None,
        recipient: Some(*address),
        amount,
        reason: reason.to_string(),
    })
}

fn debit(token: &str, address: &Address, amount: Amount, reason: &str) -> ScopeRecord {
    ScopeRecord::Accounting(AccountingRecord {
        token: token.to_string(),
        sender: Some(*address),
        recipient: None,
        amount,
        reason: reason.to_string(),
    })
}
