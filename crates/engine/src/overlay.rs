//! Write-buffering scopes over a [`LedgerState`].

use crate::{ScopeError, ScopeSnapshot};
use chainbatch_core::{LedgerError, LedgerState, RangePage, ScopeRecord, TxTimestamp};
use chainbatch_types::{ContractEvent, MultiSwapRecord, StateWrite, SwapRecord, TxId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Buffered effects of a scope.
///
/// `None` in `writes` marks a deletion, so a deleted key shadows the parent.
#[derive(Debug, Default)]
struct WriteBuffer {
    writes: BTreeMap<String, Option<Vec<u8>>>,
    events: Vec<ContractEvent>,
    records: Vec<ScopeRecord>,
}

impl WriteBuffer {
    /// `Some(value)` if the key was touched in this scope.
    fn lookup(&self, key: &str) -> Option<Option<Vec<u8>>> {
        self.writes.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey("empty key".into()));
        }
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.writes.insert(key.to_string(), None);
    }

    fn write_set(&self) -> Vec<StateWrite> {
        self.writes
            .iter()
            .map(|(key, value)| match value {
                Some(value) => StateWrite::put(key.clone(), value.clone()),
                None => StateWrite::delete(key.clone()),
            })
            .collect()
    }

    fn into_snapshot(self) -> ScopeSnapshot {
        ScopeSnapshot {
            writes: self.write_set(),
            events: self.events,
            records: self.records,
        }
    }
}

/// Scope for one call.
///
/// Range queries are answered by the parent and do not see this scope's
/// buffered writes. The transaction id is the id of the pending call rather
/// than the batch transaction.
pub struct CallScope<'p> {
    parent: &'p mut dyn LedgerState,
    tx_id: TxId,
    buffer: WriteBuffer,
}

impl<'p> CallScope<'p> {
    pub fn new(parent: &'p mut dyn LedgerState, tx_id: TxId) -> Self {
        Self {
            parent,
            tx_id,
            buffer: WriteBuffer::default(),
        }
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.buffer.writes.len()
    }

    /// Merge the buffer into the parent and return what was merged.
    pub fn commit(self) -> Result<ScopeSnapshot, ScopeError> {
        let Self {
            parent,
            tx_id,
            buffer,
        } = self;
        let snapshot = buffer.into_snapshot();

        for write in &snapshot.writes {
            let result = if write.is_deleted {
                parent.del_state(&write.key)
            } else {
                parent.put_state(&write.key, write.value.clone())
            };
            result.map_err(|source| ScopeError::Merge {
                key: write.key.clone(),
                source,
            })?;
        }
        for event in &snapshot.events {
            parent
                .set_event(&event.name, event.payload.clone())
                .map_err(|source| ScopeError::Merge {
                    key: format!("event {}", event.name),
                    source,
                })?;
        }
        for record in &snapshot.records {
            parent.record(record.clone());
        }

        trace!(
            tx_id = %tx_id,
            writes = snapshot.writes.len(),
            events = snapshot.events.len(),
            "Call scope committed"
        );
        Ok(snapshot)
    }

    /// Drop the buffer without touching the parent.
    pub fn discard(self) {
        trace!(
            tx_id = %self.tx_id,
            writes = self.buffer.writes.len(),
            "Call scope discarded"
        );
    }
}

impl LedgerState for CallScope<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        match self.buffer.lookup(key) {
            Some(value) => Ok(value),
            None => self.parent.get_state(key),
        }
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.buffer.put(key, value)
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.buffer.delete(key);
        Ok(())
    }

    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage, LedgerError> {
        self.parent
            .get_state_by_range_with_pagination(start, end, page_size, bookmark)
    }

    fn tx_id(&self) -> TxId {
        self.tx_id.clone()
    }

    fn tx_timestamp(&self) -> Result<TxTimestamp, LedgerError> {
        self.parent.tx_timestamp()
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.buffer.events.push(ContractEvent::new(name, payload));
        Ok(())
    }

    fn creator(&self) -> Result<Vec<u8>, LedgerError> {
        self.parent.creator()
    }

    fn record(&mut self, record: ScopeRecord) {
        self.buffer.records.push(record);
    }
}

/// Scope for a whole batch.
///
/// Collects committed call scopes and writes them to the ledger once, in
/// [`commit`](Self::commit). Events set on this scope are returned in the
/// snapshot, not emitted.
pub struct BatchScope<'a> {
    ledger: &'a mut dyn LedgerState,
    buffer: WriteBuffer,
}

impl<'a> BatchScope<'a> {
    pub fn new(ledger: &'a mut dyn LedgerState) -> Self {
        Self {
            ledger,
            buffer: WriteBuffer::default(),
        }
    }

    /// Direct access to the ledger, bypassing the buffer.
    ///
    /// Writes made here land even if the batch never commits.
    pub fn ledger(&mut self) -> &mut dyn LedgerState {
        &mut *self.ledger
    }

    /// Swaps created by calls committed so far.
    pub fn created_swaps(&self) -> Vec<SwapRecord> {
        self.buffer
            .records
            .iter()
            .filter_map(|r| match r {
                ScopeRecord::CreatedSwap(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn created_multi_swaps(&self) -> Vec<MultiSwapRecord> {
        self.buffer
            .records
            .iter()
            .filter_map(|r| match r {
                ScopeRecord::CreatedMultiSwap(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Write the accumulated write-set to the ledger.
    pub fn commit(self) -> Result<ScopeSnapshot, ScopeError> {
        let Self { ledger, buffer } = self;
        let snapshot = buffer.into_snapshot();
        ledger
            .apply_writes(&snapshot.writes)
            .map_err(ScopeError::Commit)?;
        debug!(writes = snapshot.writes.len(), "Batch scope committed");
        Ok(snapshot)
    }
}

impl LedgerState for BatchScope<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        match self.buffer.lookup(key) {
            Some(value) => Ok(value),
            None => self.ledger.get_state(key),
        }
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.buffer.put(key, value)
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.buffer.delete(key);
        Ok(())
    }

    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage, LedgerError> {
        self.ledger
            .get_state_by_range_with_pagination(start, end, page_size, bookmark)
    }

    fn tx_id(&self) -> TxId {
        self.ledger.tx_id()
    }

    fn tx_timestamp(&self) -> Result<TxTimestamp, LedgerError> {
        self.ledger.tx_timestamp()
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.buffer.events.push(ContractEvent::new(name, payload));
        Ok(())
    }

    fn creator(&self) -> Result<Vec<u8>, LedgerError> {
        self.ledger.creator()
    }

    fn record(&mut self, record: ScopeRecord) {
        self.buffer.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainbatch_core::MemoryLedger;
    use chainbatch_types::{AccountingRecord, Address, Amount};
    use tracing_test::traced_test;

    fn ledger() -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        ledger.put_state("base", b"0".to_vec()).unwrap();
        ledger.begin_tx(TxId(vec![0xba]), TxTimestamp::new(50, 0), b"robot".to_vec());
        ledger
    }

    fn accounting() -> ScopeRecord {
        ScopeRecord::Accounting(AccountingRecord {
            token: "VT".into(),
            sender: None,
            recipient: Some(Address([2; 32])),
            amount: Amount::new(1),
            reason: "test".into(),
        })
    }

    #[test]
    fn test_call_scope_reads_through_and_shadows() {
        let mut ledger = ledger();
        let mut batch = BatchScope::new(&mut ledger);
        let mut call = CallScope::new(&mut batch, TxId(vec![1]));

        assert_eq!(call.get_state("base").unwrap(), Some(b"0".to_vec()));
        call.put_state("base", b"1".to_vec()).unwrap();
        assert_eq!(call.get_state("base").unwrap(), Some(b"1".to_vec()));
        call.del_state("base").unwrap();
        assert_eq!(call.get_state("base").unwrap(), None);

        assert_eq!(call.tx_id(), TxId(vec![1]));
        assert_eq!(call.tx_timestamp().unwrap().seconds, 50);
        assert_eq!(call.creator().unwrap(), b"robot".to_vec());
    }

    #[test]
    fn test_discarded_call_leaves_no_trace() {
        let mut ledger = ledger();
        let mut batch = BatchScope::new(&mut ledger);

        let mut call = CallScope::new(&mut batch, TxId(vec![1]));
        call.put_state("x", b"1".to_vec()).unwrap();
        call.set_event("e", vec![]).unwrap();
        call.record(accounting());
        call.discard();

        assert_eq!(batch.get_state("x").unwrap(), None);
        let snapshot = batch.commit().unwrap();
        assert!(snapshot.writes.is_empty());
        assert!(snapshot.events.is_empty());
        assert!(snapshot.records.is_empty());
        assert_eq!(ledger.get_state("x").unwrap(), None);
    }

    #[test]
    #[traced_test]
    fn test_committed_call_merges_into_batch() {
        let mut ledger = ledger();
        let mut batch = BatchScope::new(&mut ledger);

        let mut call = CallScope::new(&mut batch, TxId(vec![1]));
        call.put_state("x", b"1".to_vec()).unwrap();
        call.del_state("base").unwrap();
        call.set_event("e", b"p".to_vec()).unwrap();
        call.record(accounting());
        let snapshot = call.commit().unwrap();

        assert_eq!(
            snapshot.writes,
            vec![StateWrite::delete("base"), StateWrite::put("x", b"1".to_vec())]
        );
        assert_eq!(snapshot.events, vec![ContractEvent::new("e", b"p".to_vec())]);
        assert_eq!(snapshot.accounting().len(), 1);

        // Visible in the batch, not yet on the ledger.
        assert_eq!(batch.get_state("x").unwrap(), Some(b"1".to_vec()));
        assert_eq!(batch.ledger().get_state("x").unwrap(), None);

        let batch_snapshot = batch.commit().unwrap();
        assert_eq!(batch_snapshot.writes.len(), 2);
        assert_eq!(ledger.get_state("x").unwrap(), Some(b"1".to_vec()));
        assert_eq!(ledger.get_state("base").unwrap(), None);
        // Batch events are returned, not emitted.
        assert!(ledger.events().is_empty());
        assert!(logs_contain("Batch scope committed"));
    }

    #[test]
    fn test_batch_commit_failure_writes_nothing() {
        let mut ledger = ledger();
        ledger.fail_writes_with_prefix("bad");
        let mut batch = BatchScope::new(&mut ledger);
        batch.put_state("a", vec![1]).unwrap();
        batch.put_state("bad", vec![1]).unwrap();

        assert!(matches!(batch.commit(), Err(ScopeError::Commit(_))));
        assert_eq!(ledger.get_state("a").unwrap(), None);
    }

    #[test]
    fn test_direct_ledger_access_bypasses_buffer() {
        let mut ledger = ledger();
        {
            let mut batch = BatchScope::new(&mut ledger);
            batch.ledger().del_state("base").unwrap();
            batch.put_state("buffered", vec![1]).unwrap();
            // Dropped without commit.
        }
        assert_eq!(ledger.get_state("base").unwrap(), None);
        assert_eq!(ledger.get_state("buffered").unwrap(), None);
    }

    #[test]
    fn test_created_swaps_are_collected() {
        let mut ledger = ledger();
        let mut batch = BatchScope::new(&mut ledger);
        let swap = SwapRecord {
            id: TxId(vec![9]),
            creator: Address([1; 32]),
            owner: Address([1; 32]),
            token: "VT".into(),
            amount: Amount::new(5),
            from: "VT".into(),
            to: "CC".into(),
            hash: chainbatch_types::Hash::digest(b"secret"),
            timeout: 0,
        };

        let mut call = CallScope::new(&mut batch, TxId(vec![9]));
        call.record(ScopeRecord::CreatedSwap(swap.clone()));
        call.commit().unwrap();

        assert_eq!(batch.created_swaps(), vec![swap]);
        assert!(batch.created_multi_swaps().is_empty());
    }
}
