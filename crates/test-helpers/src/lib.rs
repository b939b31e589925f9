//! Test fixtures shared by the chainbatch crates.
//!
//! - [`test_address`] derives deterministic addresses from a seed.
//! - [`TestChannel`] wraps an in-memory ledger with a clock and a transaction
//!   counter, and can fund accounts and submit pending calls.
//! - [`demo_registry`] registers a small contract whose methods exercise
//!   writes, events, balances, failures and panics.

use chainbatch_core::{
    balance, keys, parse_arg, require_sender, ContractConfig, ContractContext, ContractError,
    LedgerState, MemoryLedger, MethodInfo, MethodRegistry, TxTimestamp,
};
use chainbatch_mempool::{PendingError, PendingStore};
use chainbatch_types::{Address, Amount, TxId};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Identity of the channel-transfer service used by fixtures.
pub const ROBOT_IDENTITY: &[u8] = b"robot-service-identity";

/// Deterministic address for `seed`.
pub fn test_address(seed: u64) -> Address {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    Address(bytes)
}

/// `count` distinct deterministic addresses.
pub fn test_addresses(count: usize, seed: u64) -> Vec<Address> {
    (0..count as u64).map(|i| test_address(seed.wrapping_add(i))).collect()
}

/// Convert string literals to owned arguments.
pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// A channel backed by an in-memory ledger.
///
/// Every call to [`next_tx`](Self::next_tx) starts a new ledger transaction
/// with a fresh id at the channel's current time.
pub struct TestChannel {
    pub config: ContractConfig,
    pub ledger: MemoryLedger,
    tx_counter: u64,
    seconds: i64,
}

impl TestChannel {
    /// Channel `name` at time 1_000_000 with no admin.
    pub fn new(name: &str) -> Self {
        Self::with_config(ContractConfig::for_channel(name))
    }

    pub fn with_config(config: ContractConfig) -> Self {
        let mut channel = Self {
            config,
            ledger: MemoryLedger::new(),
            tx_counter: 0,
            seconds: 1_000_000,
        };
        channel.next_tx();
        channel
    }

    pub fn now(&self) -> i64 {
        self.seconds
    }

    /// Move the clock forward. Takes effect from the next transaction.
    pub fn advance(&mut self, seconds: i64) {
        self.seconds += seconds;
    }

    /// Start a new transaction signed by an ordinary client.
    pub fn next_tx(&mut self) -> TxId {
        self.next_tx_as(Vec::new())
    }

    /// Start a new transaction signed by the channel-transfer service.
    pub fn next_robot_tx(&mut self) -> TxId {
        self.next_tx_as(ROBOT_IDENTITY.to_vec())
    }

    fn next_tx_as(&mut self, creator: Vec<u8>) -> TxId {
        self.tx_counter += 1;
        let tx_id = TxId(self.tx_counter.to_be_bytes().to_vec());
        self.ledger
            .begin_tx(tx_id.clone(), TxTimestamp::new(self.seconds, 0), creator);
        tx_id
    }

    /// Credit `amount` of `token` to `address`, outside of any batch.
    pub fn fund(&mut self, token: &str, address: &Address, amount: u128) {
        let mut ctx = ContractContext::new(&mut self.ledger, &self.config);
        ctx.token_balance_add(token, address, Amount::new(amount), "emission")
            .expect("funding cannot overflow in fixtures");
    }

    pub fn balance(&self, token: &str, address: &Address) -> Amount {
        balance::token_balance(&self.ledger, token, address).expect("balance readable")
    }

    pub fn allowed_balance(&self, token: &str, address: &Address) -> Amount {
        balance::allowed_balance(&self.ledger, token, address).expect("balance readable")
    }

    /// Submit a pending call in a new transaction and return its id.
    pub fn submit(
        &mut self,
        registry: &MethodRegistry,
        method: &str,
        sender: Option<Address>,
        args: &[String],
        nonce: u64,
    ) -> Result<TxId, PendingError> {
        self.next_tx();
        PendingStore::from_config(&self.config).submit(
            &mut self.ledger,
            registry,
            method,
            sender,
            args,
            nonce,
        )
    }
}

/// Key under which the demo `put` method stores `name`.
pub fn demo_key(name: &str) -> String {
    keys::composite_key("demo", &[name]).expect("fixture names have no NUL")
}

/// Register the demo contract methods on `registry`.
///
/// | method        | args                  | effect                                   |
/// |---------------|-----------------------|------------------------------------------|
/// | `put`         | name, value           | stores `value` under [`demo_key`]        |
/// | `putThenFail` | name, value           | stores, then fails                       |
/// | `explode`     | -                     | stores, then panics                      |
/// | `emit`        | name                  | emits event `name`                       |
/// | `transfer`    | to, token, amount     | moves tokens from the sender             |
/// | `ping`        | -                     | nothing, no sender required              |
pub fn register_demo_methods(registry: &mut MethodRegistry) -> Result<(), chainbatch_core::RegistryError> {
    registry.register(
        MethodInfo::tx("put", 2),
        |raw: &[String]| Ok((raw[0].clone(), raw[1].clone())),
        |ctx: &mut ContractContext<'_>, _, (name, value): (String, String)| {
            ctx.state().put_state(&demo_key(&name), value.into_bytes())?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::tx("putThenFail", 2),
        |raw: &[String]| Ok((raw[0].clone(), raw[1].clone())),
        |ctx: &mut ContractContext<'_>, _, (name, value): (String, String)| {
            ctx.state().put_state(&demo_key(&name), value.into_bytes())?;
            Err(ContractError::invalid_argument("demo failure after write"))
        },
    )?;
    registry.register(
        MethodInfo::tx("explode", 0),
        |_: &[String]| Ok(()),
        |ctx: &mut ContractContext<'_>, _, ()| {
            ctx.state().put_state(&demo_key("exploded"), b"1".to_vec())?;
            panic!("demo panic");
        },
    )?;
    registry.register(
        MethodInfo::tx("emit", 1),
        |raw: &[String]| Ok(raw[0].clone()),
        |ctx: &mut ContractContext<'_>, _, name: String| {
            ctx.emit_event(&name, b"demo".to_vec())?;
            Ok(Some(name))
        },
    )?;
    registry.register(
        MethodInfo::tx("transfer", 3),
        |raw: &[String]| {
            Ok((
                parse_arg::<Address>(raw, 0, "to")?,
                raw[1].clone(),
                parse_arg::<Amount>(raw, 2, "amount")?,
            ))
        },
        |ctx: &mut ContractContext<'_>, sender: Option<&Address>, (to, token, amount): (Address, String, Amount)| {
            let sender = *require_sender(sender)?;
            ctx.token_balance_sub(&token, &sender, amount, "transfer")?;
            ctx.token_balance_add(&token, &to, amount, "transfer")?;
            Ok(None)
        },
    )?;
    registry.register(
        MethodInfo::tx("ping", 0).with_auth(false),
        |_: &[String]| Ok(()),
        |_: &mut ContractContext<'_>, _, ()| Ok(Some("pong".to_string())),
    )?;
    Ok(())
}

/// A registry holding only the demo methods.
pub fn demo_registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    register_demo_methods(&mut registry).expect("demo method names are unique");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_deterministic_and_distinct() {
        assert_eq!(test_address(7), test_address(7));
        let all = test_addresses(5, 1);
        let mut unique = all.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_submit_uses_fresh_tx_ids() {
        let registry = demo_registry();
        let mut channel = TestChannel::new("CC");
        let a = channel.submit(&registry, "ping", None, &[], 0).unwrap();
        let b = channel.submit(&registry, "ping", None, &[], 0).unwrap();
        assert_ne!(a, b);
    }
}
