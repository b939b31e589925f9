//! Persistence of transfer records.

use crate::{paths, TransferError};
use chainbatch_core::{keys, LedgerState};
use chainbatch_types::{CrossChannelTransfer, TransferPage};

pub(crate) fn load_from(
    state: &dyn LedgerState,
    id: &str,
) -> Result<CrossChannelTransfer, TransferError> {
    load(state, &paths::from_key(id))
}

pub(crate) fn load_to(
    state: &dyn LedgerState,
    id: &str,
) -> Result<CrossChannelTransfer, TransferError> {
    load(state, &paths::to_key(id))
}

pub(crate) fn exists_from(state: &dyn LedgerState, id: &str) -> Result<bool, TransferError> {
    exists(state, &paths::from_key(id))
}

pub(crate) fn exists_to(state: &dyn LedgerState, id: &str) -> Result<bool, TransferError> {
    exists(state, &paths::to_key(id))
}

pub(crate) fn save_from(
    state: &mut dyn LedgerState,
    transfer: &CrossChannelTransfer,
) -> Result<(), TransferError> {
    save(state, &paths::from_key(&transfer.id), transfer)
}

pub(crate) fn save_to(
    state: &mut dyn LedgerState,
    transfer: &CrossChannelTransfer,
) -> Result<(), TransferError> {
    save(state, &paths::to_key(&transfer.id), transfer)
}

pub(crate) fn delete_from(state: &mut dyn LedgerState, id: &str) -> Result<(), TransferError> {
    Ok(state.del_state(&paths::from_key(id))?)
}

pub(crate) fn delete_to(state: &mut dyn LedgerState, id: &str) -> Result<(), TransferError> {
    Ok(state.del_state(&paths::to_key(id))?)
}

/// One page of origin-side records.
pub(crate) fn load_from_page(
    state: &dyn LedgerState,
    page_size: usize,
    bookmark: &str,
) -> Result<TransferPage, TransferError> {
    let (start, end) = keys::prefix_range(paths::from_prefix());
    let page = state.get_state_by_range_with_pagination(&start, &end, page_size, bookmark)?;

    let transfers = page
        .entries
        .iter()
        .map(|entry| decode(&entry.key, &entry.value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransferPage {
        transfers,
        bookmark: page.bookmark,
    })
}

fn load(state: &dyn LedgerState, key: &str) -> Result<CrossChannelTransfer, TransferError> {
    match state.get_state(key)? {
        Some(raw) if !raw.is_empty() => decode(key, &raw),
        _ => Err(TransferError::NotFound),
    }
}

fn exists(state: &dyn LedgerState, key: &str) -> Result<bool, TransferError> {
    Ok(state.get_state(key)?.is_some_and(|raw| !raw.is_empty()))
}

fn save(
    state: &mut dyn LedgerState,
    key: &str,
    transfer: &CrossChannelTransfer,
) -> Result<(), TransferError> {
    if transfer.id.is_empty() {
        return Err(TransferError::EmptyId);
    }
    let raw = serde_json::to_vec(transfer).map_err(|e| TransferError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(state.put_state(key, raw)?)
}

fn decode(key: &str, raw: &[u8]) -> Result<CrossChannelTransfer, TransferError> {
    serde_json::from_slice(raw).map_err(|e| TransferError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
