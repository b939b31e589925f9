//! Output of a committed scope.

use chainbatch_core::ScopeRecord;
use chainbatch_types::{AccountingRecord, ContractEvent, MultiSwapRecord, StateWrite, SwapRecord};

/// Everything a scope produced, captured at commit.
///
/// Writes are in key order, events and records in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSnapshot {
    pub writes: Vec<StateWrite>,
    pub events: Vec<ContractEvent>,
    pub records: Vec<ScopeRecord>,
}

impl ScopeSnapshot {
    /// Accounting records sorted by their canonical string form.
    pub fn accounting(&self) -> Vec<AccountingRecord> {
        let mut accounting: Vec<AccountingRecord> = self
            .records
            .iter()
            .filter_map(|r| match r {
                ScopeRecord::Accounting(a) => Some(a.clone()),
                _ => None,
            })
            .collect();
        accounting.sort_by_cached_key(AccountingRecord::sort_key);
        accounting
    }

    pub fn created_swaps(&self) -> Vec<SwapRecord> {
        self.records
            .iter()
            .filter_map(|r| match r {
                ScopeRecord::CreatedSwap(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn created_multi_swaps(&self) -> Vec<MultiSwapRecord> {
        self.records
            .iter()
            .filter_map(|r| match r {
                ScopeRecord::CreatedMultiSwap(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}
