//! Per-sender replay protection.

use crate::NonceError;
use chainbatch_core::{keys, ContractConfig, LedgerState, NoncePrefix};
use chainbatch_types::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stored form: recently accepted nonces, ascending, newest last.
#[derive(Debug, Default, Serialize, Deserialize)]
struct NonceRecord {
    nonce: Vec<u64>,
}

/// Checks that each sender's nonces strictly increase.
///
/// Nonces are expected to be millisecond timestamps. With a TTL of `n`
/// seconds, the record keeps the nonces within `n * 1000` of the newest one;
/// with a TTL of zero only the newest nonce is kept and the check moves to
/// submit time ([`check_at_submit`](Self::check_at_submit)).
#[derive(Debug, Clone)]
pub struct NonceGuard {
    prefix: NoncePrefix,
    ttl: u64,
}

impl NonceGuard {
    pub fn new(prefix: NoncePrefix, ttl: u64) -> Self {
        Self { prefix, ttl }
    }

    pub fn from_config(config: &ContractConfig) -> Self {
        Self::new(config.nonce_prefix, config.nonce_ttl)
    }

    /// Whether nonces are checked when a pending call is loaded.
    pub fn is_ttl_enabled(&self) -> bool {
        self.ttl != 0
    }

    pub fn key(&self, sender: &Address) -> Result<String, NonceError> {
        Ok(keys::composite_key(
            self.prefix.object_type(),
            &[&sender.to_hex()],
        )?)
    }

    /// Load-time check. Accepts everything when no TTL is configured.
    pub fn check(
        &self,
        state: &mut dyn LedgerState,
        sender: &Address,
        nonce: u64,
    ) -> Result<(), NonceError> {
        if !self.is_ttl_enabled() {
            return Ok(());
        }

        let key = self.key(sender)?;
        let mut history = self.load(&*state, &key)?;
        if let Some(&last) = history.last() {
            if nonce <= last {
                warn!(sender = %sender, nonce, last, "Nonce rejected");
                return Err(NonceError::Stale { nonce, last });
            }
        }

        let window = self.ttl.saturating_mul(1000);
        history.push(nonce);
        history.retain(|&n| nonce - n <= window);
        self.store(state, &key, history)?;
        debug!(sender = %sender, nonce, "Nonce accepted");
        Ok(())
    }

    /// Submit-time check used when no TTL is configured.
    pub fn check_at_submit(
        &self,
        state: &mut dyn LedgerState,
        sender: &Address,
        nonce: u64,
    ) -> Result<(), NonceError> {
        if self.is_ttl_enabled() {
            return Ok(());
        }

        let key = self.key(sender)?;
        let history = self.load(&*state, &key)?;
        if let Some(&last) = history.last() {
            if last >= nonce {
                warn!(sender = %sender, nonce, last, "Nonce rejected at submit");
                return Err(NonceError::Stale { nonce, last });
            }
        }
        self.store(state, &key, vec![nonce])
    }

    /// Most recent nonce of `sender` as a decimal string, `"0"` if none.
    pub fn query(&self, state: &dyn LedgerState, sender: &Address) -> Result<String, NonceError> {
        let key = self.key(sender)?;
        let history = self.load(state, &key)?;
        Ok(history.last().copied().unwrap_or(0).to_string())
    }

    fn load(&self, state: &dyn LedgerState, key: &str) -> Result<Vec<u64>, NonceError> {
        let raw = match state.get_state(key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        if let Ok(record) = serde_json::from_slice::<NonceRecord>(&raw) {
            return Ok(record.nonce);
        }
        decode_legacy(&raw).map(|n| vec![n])
    }

    fn store(
        &self,
        state: &mut dyn LedgerState,
        key: &str,
        nonce: Vec<u64>,
    ) -> Result<(), NonceError> {
        let raw = serde_json::to_vec(&NonceRecord { nonce })
            .map_err(|e| NonceError::Decode(e.to_string()))?;
        state.put_state(key, raw)?;
        Ok(())
    }
}

/// Legacy records hold one big-endian unsigned integer. Only the low 64 bits
/// are kept.
fn decode_legacy(raw: &[u8]) -> Result<u64, NonceError> {
    let significant: Vec<u8> = raw.iter().copied().skip_while(|&b| b == 0).collect();
    if significant.len() > 8 {
        return Err(NonceError::Decode(format!(
            "legacy nonce of {} bytes does not fit in 64 bits",
            significant.len()
        )));
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}
