//! State writes, events and accounting records produced by execution.

use crate::{serde_hex, Address, Amount};
use serde::{Deserialize, Serialize};

/// One entry of a write-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWrite {
    /// State key.
    pub key: String,

    /// New value (empty when deleted).
    #[serde(with = "serde_hex")]
    pub value: Vec<u8>,

    /// Whether the key was deleted.
    pub is_deleted: bool,
}

impl StateWrite {
    /// A put of `value` under `key`.
    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
            is_deleted: false,
        }
    }

    /// A deletion of `key`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Vec::new(),
            is_deleted: true,
        }
    }
}

/// A named event emitted by a contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Event name.
    pub name: String,

    /// Opaque payload.
    #[serde(with = "serde_hex")]
    pub payload: Vec<u8>,
}

impl ContractEvent {
    /// Create an event.
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// A balance movement recorded for off-chain accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRecord {
    /// Token moved.
    pub token: String,

    /// Debited address, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,

    /// Credited address, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Address>,

    /// Amount moved.
    pub amount: Amount,

    /// Free-form reason, e.g. `"ch-transfer"` or `"swap"`.
    pub reason: String,
}

impl AccountingRecord {
    /// Stable lexical key used to order records within a call.
    pub fn sort_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.token,
            self.sender.map(|a| a.to_hex()).unwrap_or_default(),
            self.recipient.map(|a| a.to_hex()).unwrap_or_default(),
            self.amount,
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounting_sort_key_is_stable() {
        let rec = AccountingRecord {
            token: "VT".into(),
            sender: Some(Address([1; 32])),
            recipient: None,
            amount: Amount::new(5),
            reason: "swap".into(),
        };
        assert_eq!(rec.sort_key(), rec.clone().sort_key());
        assert!(rec.sort_key().starts_with("VT|0101"));
        assert!(rec.sort_key().ends_with("||5|swap"));
    }

    #[test]
    fn test_state_write_constructors() {
        let put = StateWrite::put("k", b"v".to_vec());
        assert!(!put.is_deleted);
        let del = StateWrite::delete("k");
        assert!(del.is_deleted);
        assert!(del.value.is_empty());
    }
}
