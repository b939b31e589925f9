//! Pending-call persistence.

use crate::{LoadFailure, NonceGuard, PendingError};
use chainbatch_core::{keys, ContractConfig, LedgerState, MethodRegistry};
use chainbatch_types::{Address, PendingCall, TxId};
use tracing::{debug, warn};

/// Stores pending calls under `composite_key(prefix, [tx id hex])`.
#[derive(Debug, Clone)]
pub struct PendingStore {
    prefix: String,
    /// Seconds. 0 disables expiry.
    tx_ttl: u64,
}

impl PendingStore {
    pub fn new(prefix: impl Into<String>, tx_ttl: u64) -> Self {
        Self {
            prefix: prefix.into(),
            tx_ttl,
        }
    }

    pub fn from_config(config: &ContractConfig) -> Self {
        Self::new(config.batch_prefix.clone(), config.tx_ttl)
    }

    pub fn key(&self, tx_id: &TxId) -> Result<String, PendingError> {
        Ok(keys::composite_key(&self.prefix, &[&tx_id.to_hex()])?)
    }

    /// Validate an invocation against the registry and store it under the
    /// current transaction id.
    pub fn submit(
        &self,
        state: &mut dyn LedgerState,
        registry: &MethodRegistry,
        method: &str,
        sender: Option<Address>,
        args: &[String],
        nonce: u64,
    ) -> Result<TxId, PendingError> {
        let info = registry
            .resolve(method)
            .ok_or_else(|| PendingError::MethodNotFound(method.to_string()))?;
        if info.needs_auth && sender.is_none() {
            return Err(PendingError::MissingSender);
        }
        let args = registry
            .convert_arguments(method, args)
            .map_err(|e| PendingError::ArgumentError(e.to_string()))?;

        let tx_id = state.tx_id();
        let pending = PendingCall {
            tx_id: tx_id.clone(),
            method: method.to_string(),
            sender,
            args,
            timestamp: state.tx_timestamp()?.seconds,
            nonce,
        };
        let raw = serde_json::to_vec(&pending).map_err(|e| PendingError::Decode(e.to_string()))?;
        state.put_state(&self.key(&tx_id)?, raw)?;

        debug!(tx_id = %tx_id, method, "Pending call stored");
        Ok(tx_id)
    }

    /// Whether a pending call is stored for `tx_id`.
    pub fn contains(&self, state: &dyn LedgerState, tx_id: &TxId) -> Result<bool, PendingError> {
        Ok(state
            .get_state(&self.key(tx_id)?)?
            .is_some_and(|raw| !raw.is_empty()))
    }

    /// Read, delete and validate the pending call for `tx_id`.
    ///
    /// `state` should be the ledger itself: the deletion is meant to land
    /// even if the surrounding batch later fails. A record that exists is
    /// deleted whether or not validation passes. The sender's nonce is not
    /// checked here, see [`admit`](Self::admit).
    pub fn load(
        &self,
        state: &mut dyn LedgerState,
        registry: &MethodRegistry,
        tx_id: &TxId,
        batch_timestamp: i64,
    ) -> Result<PendingCall, LoadFailure> {
        let key = self.key(tx_id).map_err(|e| LoadFailure::new(None, e))?;
        let raw = match state.get_state(&key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                warn!(tx_id = %tx_id, "Pending call not found");
                return Err(LoadFailure::new(
                    None,
                    PendingError::TransactionNotFound(tx_id.clone()),
                ));
            }
            Err(e) => return Err(LoadFailure::new(None, e)),
        };
        state.del_state(&key).map_err(|e| LoadFailure::new(None, e))?;

        let mut pending = decode(&raw).map_err(|e| LoadFailure::new(None, e))?;
        pending.tx_id = tx_id.clone();
        let method = Some(pending.method.as_str());

        let age = batch_timestamp.saturating_sub(pending.timestamp);
        if self.tx_ttl > 0 && age > ttl_seconds(self.tx_ttl) {
            warn!(
                tx_id = %tx_id,
                submitted = pending.timestamp,
                batch_timestamp,
                "Pending call expired"
            );
            return Err(LoadFailure::new(
                method,
                PendingError::TransactionExpired {
                    batch_timestamp,
                    submitted: pending.timestamp,
                    ttl: self.tx_ttl,
                },
            ));
        }

        let info = registry.resolve(&pending.method).ok_or_else(|| {
            LoadFailure::new(method, PendingError::UnknownMethod(pending.method.clone()))
        })?;
        if !info.needs_auth {
            return Ok(pending);
        }
        if pending.sender.is_none() {
            return Err(LoadFailure::new(method, PendingError::MissingSender));
        }

        Ok(pending)
    }

    /// Check and record the nonce of a loaded call.
    ///
    /// `state` should be the batch scope, so the nonce record only lands
    /// when the batch commits.
    pub fn admit(
        &self,
        state: &mut dyn LedgerState,
        registry: &MethodRegistry,
        guard: &NonceGuard,
        pending: &PendingCall,
    ) -> Result<(), LoadFailure> {
        let method = Some(pending.method.as_str());
        let needs_auth = registry
            .resolve(&pending.method)
            .is_some_and(|info| info.needs_auth);
        let (true, Some(sender)) = (needs_auth, pending.sender.as_ref()) else {
            return Ok(());
        };
        guard
            .check(state, sender, pending.nonce)
            .map_err(|e| LoadFailure::new(method, e))
    }
}

fn ttl_seconds(ttl: u64) -> i64 {
    i64::try_from(ttl).unwrap_or(i64::MAX)
}

/// Current encoding is a JSON object; legacy records are a JSON array
/// `[method, sender, arg0, arg1, ...]` with an empty string for no sender.
fn decode(raw: &[u8]) -> Result<PendingCall, PendingError> {
    if let Ok(pending) = serde_json::from_slice::<PendingCall>(raw) {
        return Ok(pending);
    }

    let legacy: Vec<String> =
        serde_json::from_slice(raw).map_err(|e| PendingError::Decode(e.to_string()))?;
    let mut parts = legacy.into_iter();
    let (Some(method), Some(sender)) = (parts.next(), parts.next()) else {
        return Err(PendingError::Decode(
            "legacy record needs a method and a sender".into(),
        ));
    };
    let sender = if sender.is_empty() {
        None
    } else {
        Some(Address::from_hex(&sender).map_err(|e| PendingError::Decode(e.to_string()))?)
    };

    Ok(PendingCall {
        tx_id: TxId::default(),
        method,
        sender,
        args: parts.collect(),
        timestamp: 0,
        nonce: 0,
    })
}
