//! Per-invocation contract context.

use crate::{balance, ContractConfig, ContractError, LedgerState, ScopeRecord, TxTimestamp};
use chainbatch_types::{Address, Amount, ChannelId, TxId};

/// What a method handler sees: the state it runs against and the contract
/// configuration.
///
/// A fresh context is built for every invocation. The state is whatever the
/// caller hands in: the ledger itself, a read-only view, or a per-call scope
/// inside a batch.
pub struct ContractContext<'a> {
    state: &'a mut dyn LedgerState,
    config: &'a ContractConfig,
}

impl<'a> ContractContext<'a> {
    pub fn new(state: &'a mut dyn LedgerState, config: &'a ContractConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&mut self) -> &mut dyn LedgerState {
        &mut *self.state
    }

    pub fn state_ref(&self) -> &dyn LedgerState {
        &*self.state
    }

    pub fn config(&self) -> &'a ContractConfig {
        self.config
    }

    /// This channel.
    pub fn channel(&self) -> &'a ChannelId {
        &self.config.channel
    }

    pub fn tx_id(&self) -> TxId {
        self.state.tx_id()
    }

    pub fn timestamp(&self) -> Result<TxTimestamp, ContractError> {
        Ok(self.state.tx_timestamp()?)
    }

    pub fn emit_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), ContractError> {
        Ok(self.state.set_event(name, payload)?)
    }

    pub fn record(&mut self, record: ScopeRecord) {
        self.state.record(record);
    }

    pub fn token_balance(&self, token: &str, address: &Address) -> Result<Amount, ContractError> {
        Ok(balance::token_balance(&*self.state, token, address)?)
    }

    pub fn token_balance_add(
        &mut self,
        token: &str,
        address: &Address,
        amount: Amount,
        reason: &str,
    ) -> Result<(), ContractError> {
        Ok(balance::token_balance_add(&mut *self.state, token, address, amount, reason)?)
    }

    pub fn token_balance_sub(
        &mut self,
        token: &str,
        address: &Address,
        amount: Amount,
        reason: &str,
    ) -> Result<(), ContractError> {
        Ok(balance::token_balance_sub(&mut *self.state, token, address, amount, reason)?)
    }

    pub fn allowed_balance(&self, token: &str, address: &Address) -> Result<Amount, ContractError> {
        Ok(balance::allowed_balance(&*self.state, token, address)?)
    }

    pub fn allowed_balance_add(
        &mut self,
        token: &str,
        address: &Address,
        amount: Amount,
        reason: &str,
    ) -> Result<(), ContractError> {
        Ok(balance::allowed_balance_add(&mut *self.state, token, address, amount, reason)?)
    }

    pub fn allowed_balance_sub(
        &mut self,
        token: &str,
        address: &Address,
        amount: Amount,
        reason: &str,
    ) -> Result<(), ContractError> {
        Ok(balance::allowed_balance_sub(&mut *self.state, token, address, amount, reason)?)
    }

    pub fn given_balance(&self, channel: &ChannelId) -> Result<Amount, ContractError> {
        Ok(balance::given_balance(&*self.state, channel)?)
    }

    pub fn given_balance_add(&mut self, channel: &ChannelId, amount: Amount) -> Result<(), ContractError> {
        Ok(balance::given_balance_add(&mut *self.state, channel, amount)?)
    }

    pub fn given_balance_sub(&mut self, channel: &ChannelId, amount: Amount) -> Result<(), ContractError> {
        Ok(balance::given_balance_sub(&mut *self.state, channel, amount)?)
    }
}
