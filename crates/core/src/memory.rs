//! In-memory ledger backed by a persistent ordered map.

use crate::{LedgerError, LedgerState, RangeEntry, RangePage, TxTimestamp};
use chainbatch_types::{ContractEvent, StateWrite, TxId};
use im::OrdMap;
use std::ops::Bound;

/// A [`LedgerState`] kept entirely in memory.
///
/// Cloning is cheap (structural sharing), which makes it easy to run the same
/// sequence of operations against two replicas and compare the results.
/// Events emitted through [`LedgerState::set_event`] are kept in order until
/// [`take_events`](Self::take_events) is called.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: OrdMap<String, Vec<u8>>,
    tx_id: TxId,
    timestamp: TxTimestamp,
    creator: Vec<u8>,
    events: Vec<ContractEvent>,
    /// Keys with this prefix fail on write. Used to exercise commit failures.
    failing_prefix: Option<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new transaction: set its id, timestamp and submitter identity.
    pub fn begin_tx(&mut self, tx_id: TxId, timestamp: TxTimestamp, creator: Vec<u8>) {
        self.tx_id = tx_id;
        self.timestamp = timestamp;
        self.creator = creator;
    }

    /// Make every write to a key starting with `prefix` fail.
    pub fn fail_writes_with_prefix(&mut self, prefix: impl Into<String>) {
        self.failing_prefix = Some(prefix.into());
    }

    pub fn clear_write_failures(&mut self) {
        self.failing_prefix = None;
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over all stored entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.state.iter()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Whether two ledgers hold identical key/value state.
    pub fn same_state(&self, other: &MemoryLedger) -> bool {
        self.state == other.state
    }

    fn check_writable(&self, key: &str) -> Result<(), LedgerError> {
        match &self.failing_prefix {
            Some(prefix) if key.starts_with(prefix.as_str()) => Err(LedgerError::Backend(
                format!("write to {key} rejected"),
            )),
            _ => Ok(()),
        }
    }
}

impl LedgerState for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey("empty key".into()));
        }
        self.check_writable(key)?;
        self.state.insert(key.to_string(), value);
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.check_writable(key)?;
        self.state.remove(key);
        Ok(())
    }

    fn get_state_by_range_with_pagination(
        &self,
        start: &str,
        end: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage, LedgerError> {
        let from = if bookmark.is_empty() { start } else { bookmark };
        if from < start || (!end.is_empty() && from > end) {
            return Err(LedgerError::InvalidKey(format!(
                "bookmark {bookmark} outside range"
            )));
        }

        let lower = Bound::Included(from.to_string());
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.to_string())
        };

        let limit = if page_size == 0 { usize::MAX } else { page_size };
        let mut entries = Vec::new();
        let mut bookmark = String::new();
        for (key, value) in self.state.range((lower, upper)) {
            if entries.len() == limit {
                bookmark = key.clone();
                break;
            }
            entries.push(RangeEntry {
                key: key.clone(),
                value: value.clone(),
            });
        }

        Ok(RangePage { entries, bookmark })
    }

    fn tx_id(&self) -> TxId {
        self.tx_id.clone()
    }

    fn tx_timestamp(&self) -> Result<TxTimestamp, LedgerError> {
        Ok(self.timestamp)
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.events.push(ContractEvent::new(name, payload));
        Ok(())
    }

    fn creator(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(self.creator.clone())
    }

    fn apply_writes(&mut self, writes: &[StateWrite]) -> Result<(), LedgerError> {
        let mut next = self.state.clone();
        for write in writes {
            self.check_writable(&write.key)?;
            if write.is_deleted {
                next.remove(&write.key);
            } else {
                next.insert(write.key.clone(), write.value.clone());
            }
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(keys: &[&str]) -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        for key in keys {
            ledger.put_state(key, key.as_bytes().to_vec()).unwrap();
        }
        ledger
    }

    #[test]
    fn test_put_get_delete() {
        let mut ledger = MemoryLedger::new();
        ledger.put_state("a", vec![1]).unwrap();
        assert_eq!(ledger.get_state("a").unwrap(), Some(vec![1]));

        ledger.del_state("a").unwrap();
        assert_eq!(ledger.get_state("a").unwrap(), None);
        assert!(ledger.del_state("a").is_ok());
    }

    #[test]
    fn test_range_pagination() {
        let ledger = ledger_with(&["p/1", "p/2", "p/3", "q/1"]);

        let page = ledger
            .get_state_by_range_with_pagination("p/", "p/~", 2, "")
            .unwrap();
        let keys: Vec<_> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["p/1", "p/2"]);
        assert_eq!(page.bookmark, "p/3");

        let page = ledger
            .get_state_by_range_with_pagination("p/", "p/~", 2, &page.bookmark)
            .unwrap();
        let keys: Vec<_> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["p/3"]);
        assert!(page.bookmark.is_empty());
    }

    #[test]
    fn test_range_rejects_bookmark_outside_range() {
        let ledger = ledger_with(&["p/1"]);
        assert!(ledger
            .get_state_by_range_with_pagination("p/", "p/~", 2, "a")
            .is_err());
    }

    #[test]
    fn test_failing_prefix() {
        let mut ledger = MemoryLedger::new();
        ledger.fail_writes_with_prefix("bad");
        assert!(ledger.put_state("bad/1", vec![]).is_err());
        assert!(ledger.put_state("good/1", vec![]).is_ok());

        ledger.clear_write_failures();
        assert!(ledger.put_state("bad/1", vec![]).is_ok());
    }

    #[test]
    fn test_apply_writes_is_atomic() {
        let mut ledger = ledger_with(&["keep"]);
        ledger.fail_writes_with_prefix("bad");

        let writes = vec![
            StateWrite::put("a", vec![1]),
            StateWrite::delete("keep"),
            StateWrite::put("bad/1", vec![2]),
        ];
        assert!(ledger.apply_writes(&writes).is_err());
        assert_eq!(ledger.get_state("a").unwrap(), None);
        assert!(ledger.get_state("keep").unwrap().is_some());

        ledger.clear_write_failures();
        ledger.apply_writes(&writes).unwrap();
        assert_eq!(ledger.get_state("a").unwrap(), Some(vec![1]));
        assert_eq!(ledger.get_state("keep").unwrap(), None);
    }

    #[test]
    fn test_clone_is_independent_replica() {
        let mut a = ledger_with(&["x"]);
        let b = a.clone();
        a.put_state("y", vec![]).unwrap();
        assert!(!a.same_state(&b));
        assert_eq!(b.len(), 1);
    }
}
