//! Read-only transfer lookups.

use crate::{paths, storage, TransferError};
use chainbatch_core::LedgerState;
use chainbatch_types::{CrossChannelTransfer, TransferPage};

/// Origin-side record `id`.
pub fn query_from(state: &dyn LedgerState, id: &str) -> Result<CrossChannelTransfer, TransferError> {
    storage::load_from(state, id)
}

/// Destination-side record `id`.
pub fn query_to(state: &dyn LedgerState, id: &str) -> Result<CrossChannelTransfer, TransferError> {
    storage::load_to(state, id)
}

/// Page through origin-side records.
///
/// Pass an empty bookmark for the first page and the returned bookmark for
/// the next; an empty returned bookmark means the listing is complete. A
/// bookmark that does not point into the origin-side key range is rejected.
pub fn query_from_page(
    state: &dyn LedgerState,
    page_size: i64,
    bookmark: &str,
) -> Result<TransferPage, TransferError> {
    if page_size <= 0 {
        return Err(TransferError::InvalidPageSize);
    }
    if !bookmark.is_empty() && !bookmark.starts_with(paths::from_prefix()) {
        return Err(TransferError::InvalidBookmark);
    }
    let page_size = usize::try_from(page_size).map_err(|_| TransferError::InvalidPageSize)?;
    storage::load_from_page(state, page_size, bookmark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_transfer_by_customer;
    use chainbatch_core::{ContractConfig, ContractContext, MemoryLedger, TxTimestamp};
    use chainbatch_types::{Address, Amount, ChannelId, TxId};
    use std::collections::BTreeSet;

    const USER: Address = Address([1; 32]);

    fn ledger_with_transfers(n: usize) -> MemoryLedger {
        let config = ContractConfig::for_channel("VT");
        let mut ledger = MemoryLedger::new();
        ledger.begin_tx(TxId(vec![1]), TxTimestamp::new(1, 0), vec![]);
        let mut ctx = ContractContext::new(&mut ledger, &config);
        ctx.token_balance_add("VT", &USER, Amount::new(1_000), "emit")
            .unwrap();
        let to = ChannelId::new("CC");
        for i in 0..n {
            channel_transfer_by_customer(&mut ctx, &USER, &format!("t{i}"), &to, "VT", Amount::new(1))
                .unwrap();
        }
        drop(ctx);
        ledger
    }

    #[test]
    fn test_pagination_returns_every_record_once() {
        let ledger = ledger_with_transfers(5);

        let mut seen = Vec::new();
        let mut bookmark = String::new();
        let mut pages = 0;
        loop {
            let page = query_from_page(&ledger, 2, &bookmark).unwrap();
            assert!(page.transfers.len() <= 2);
            seen.extend(page.transfers.into_iter().map(|t| t.id));
            pages += 1;
            if page.bookmark.is_empty() {
                break;
            }
            bookmark = page.bookmark;
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 5);
        let unique: BTreeSet<_> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_foreign_bookmark_is_rejected() {
        let ledger = ledger_with_transfers(1);
        assert_eq!(
            query_from_page(&ledger, 2, "/f/b/cct/to/t0"),
            Err(TransferError::InvalidBookmark)
        );
        assert_eq!(
            query_from_page(&ledger, 2, "\u{0}batchTransactions\u{0}"),
            Err(TransferError::InvalidBookmark)
        );
    }

    #[test]
    fn test_page_size_must_be_positive() {
        let ledger = ledger_with_transfers(1);
        assert_eq!(query_from_page(&ledger, 0, ""), Err(TransferError::InvalidPageSize));
        assert_eq!(query_from_page(&ledger, -3, ""), Err(TransferError::InvalidPageSize));
    }

    #[test]
    fn test_listing_excludes_destination_records() {
        let mut ledger = ledger_with_transfers(2);
        ledger
            .put_state(&paths::to_key("x"), b"{}".to_vec())
            .unwrap();
        let page = query_from_page(&ledger, 10, "").unwrap();
        assert_eq!(page.transfers.len(), 2);
        assert!(page.bookmark.is_empty());
    }
}
