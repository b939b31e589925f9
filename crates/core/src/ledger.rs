//! The ledger abstraction every contract operation is written against.

use crate::LedgerError;
use chainbatch_types::{AccountingRecord, MultiSwapRecord, StateWrite, SwapRecord, TxId};

/// Transaction timestamp as reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TxTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl TxTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Nanoseconds since the epoch.
    pub fn as_nanos(&self) -> i64 {
        self.seconds
            .saturating_mul(1_000_000_000)
            .saturating_add(i64::from(self.nanos))
    }
}

/// One key/value pair returned by a range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// A page of a range query.
///
/// `bookmark` is empty when the range is exhausted; otherwise it resumes the
/// query at the first key not yet returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangePage {
    pub entries: Vec<RangeEntry>,
    pub bookmark: String,
}

/// Side records produced during execution that are not ledger state.
///
/// Scopes collect them so the batch engine can report accounting per call
/// and the swaps created during the batch. Outside a scope they are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRecord {
    Accounting(AccountingRecord),
    CreatedSwap(SwapRecord),
    CreatedMultiSwap(MultiSwapRecord),
}

/// Key/value access to the ledger plus the transaction metadata the ledger
/// exposes to contract code.
///
/// Implemented by the real ledger binding, by [`MemoryLedger`](crate::MemoryLedger),
/// and by the execution scopes of the engine crate. All contract logic takes
/// `&mut dyn LedgerState` so it runs unchanged in any of them.
pub trait LedgerState {
    /// Read the value stored under `key`.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Store `value` under `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn del_state(&mut self, key: &str) -> Result<(), LedgerError>;

    /// Range query over `[start, end)` returning at most `page_size` entries,
    /// resuming at `bookmark` when it is non-empty.
    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage, LedgerError>;

    /// Id of the transaction being executed.
    fn tx_id(&self) -> TxId;

    /// Timestamp of the transaction being executed.
    fn tx_timestamp(&self) -> Result<TxTimestamp, LedgerError>;

    /// Emit an event for the transaction.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError>;

    /// Serialized identity of the transaction submitter.
    fn creator(&self) -> Result<Vec<u8>, LedgerError>;

    /// Attach a side record to the current scope.
    fn record(&mut self, _record: ScopeRecord) {}

    /// Apply a write-set in order.
    ///
    /// Stores that can apply a write-set atomically should override this so
    /// that a failure leaves no write behind.
    fn apply_writes(&mut self, writes: &[StateWrite]) -> Result<(), LedgerError> {
        for write in writes {
            if write.is_deleted {
                self.del_state(&write.key)?;
            } else {
                self.put_state(&write.key, write.value.clone())?;
            }
        }
        Ok(())
    }
}

/// Read-only view over another [`LedgerState`], used to run queries.
///
/// Writes and events are refused with [`LedgerError::ReadOnly`].
pub struct ReadOnlyState<'a> {
    inner: &'a dyn LedgerState,
}

impl<'a> ReadOnlyState<'a> {
    pub fn new(inner: &'a dyn LedgerState) -> Self {
        Self { inner }
    }
}

impl LedgerState for ReadOnlyState<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.inner.get_state(key)
    }

    fn put_state(&mut self, _key: &str, _value: Vec<u8>) -> Result<(), LedgerError> {
        Err(LedgerError::ReadOnly)
    }

    fn del_state(&mut self, _key: &str) -> Result<(), LedgerError> {
        Err(LedgerError::ReadOnly)
    }

    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage, LedgerError> {
        self.inner
            .get_state_by_range_with_pagination(start, end, page_size, bookmark)
    }

    fn tx_id(&self) -> TxId {
        self.inner.tx_id()
    }

    fn tx_timestamp(&self) -> Result<TxTimestamp, LedgerError> {
        self.inner.tx_timestamp()
    }

    fn set_event(&mut self, _name: &str, _payload: Vec<u8>) -> Result<(), LedgerError> {
        Err(LedgerError::ReadOnly)
    }

    fn creator(&self) -> Result<Vec<u8>, LedgerError> {
        self.inner.creator()
    }
}
