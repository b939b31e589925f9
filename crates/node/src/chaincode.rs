//! Invocation routing.

use crate::methods::{register_base_methods, ROBOT_METHODS};
use crate::{Invocation, NodeError, Response};
use chainbatch_core::{
    ContractConfig, ContractContext, ContractError, LedgerState, MethodInfo, MethodKind,
    MethodRegistry, ReadOnlyState,
};
use chainbatch_engine::{contain, CallScope};
use chainbatch_execution::BatchExecutor;
use chainbatch_types::Hash;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Function name of batch execution.
pub const BATCH_EXECUTE: &str = "batchExecute";

/// The contract of one channel.
pub struct Chaincode {
    executor: BatchExecutor,
    registry: Arc<MethodRegistry>,
}

impl Chaincode {
    /// Build a contract from `config` and the application's own methods.
    ///
    /// The base transfer, swap and query methods are added to `registry`, and
    /// every function listed in `config.disabled_functions` is disabled.
    pub fn new(config: ContractConfig, mut registry: MethodRegistry) -> Result<Self, NodeError> {
        config.validate()?;
        register_base_methods(&mut registry, &config)?;
        for name in &config.disabled_functions {
            registry.disable(name.clone());
        }

        let registry = Arc::new(registry);
        Ok(Self {
            executor: BatchExecutor::new(config, Arc::clone(&registry)),
            registry,
        })
    }

    pub fn config(&self) -> &ContractConfig {
        self.executor.config()
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }

    /// Handle one invocation against `ledger`.
    pub fn invoke(&self, ledger: &mut dyn LedgerState, invocation: &Invocation) -> Response {
        let function = invocation.function.as_str();
        match contain(|| self.dispatch(ledger, invocation)) {
            Ok(Ok(payload)) => Response::Success(payload),
            Ok(Err(e)) => {
                debug!(function, error = %e, kind = ?e.kind(), "Invocation failed");
                Response::Error(e.to_string())
            }
            Err(panic) => {
                error!(function, panic = %panic, "Invocation panicked");
                Response::Error(format!("panic {function}: {panic}"))
            }
        }
    }

    fn dispatch(
        &self,
        ledger: &mut dyn LedgerState,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, ContractError> {
        let function = invocation.function.as_str();
        if function == BATCH_EXECUTE {
            self.require_robot(&*ledger)?;
            let payload = invocation
                .args
                .first()
                .ok_or_else(|| ContractError::invalid_argument("batch payload is required"))?;
            return Ok(self.executor.execute_payload(ledger, payload.as_bytes())?);
        }

        let info = self
            .registry
            .resolve(function)
            .ok_or_else(|| ContractError::NotFound(format!("method '{function}' not found")))?
            .clone();
        if ROBOT_METHODS.contains(&function) {
            self.require_robot(&*ledger)?;
        }

        match info.kind {
            MethodKind::Query => self.query(&*ledger, invocation),
            MethodKind::NoBatchTx => self.execute_now(ledger, invocation),
            MethodKind::Tx => self.submit(ledger, &info, invocation),
        }
    }

    fn query(&self, ledger: &dyn LedgerState, invocation: &Invocation) -> Result<Vec<u8>, ContractError> {
        let mut view = ReadOnlyState::new(ledger);
        let mut ctx = ContractContext::new(&mut view, self.config());
        let result = self.registry.call(
            &invocation.function,
            &mut ctx,
            invocation.sender.as_ref(),
            &invocation.args,
        )?;
        Ok(result.unwrap_or_default().into_bytes())
    }

    fn execute_now(
        &self,
        ledger: &mut dyn LedgerState,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, ContractError> {
        let result = atomically(ledger, |state| {
            let mut ctx = ContractContext::new(state, self.config());
            self.registry.call(
                &invocation.function,
                &mut ctx,
                invocation.sender.as_ref(),
                &invocation.args,
            )
        })?;
        debug!(function = %invocation.function, "No-batch method executed");
        Ok(result.unwrap_or_default().into_bytes())
    }

    fn submit(
        &self,
        ledger: &mut dyn LedgerState,
        info: &MethodInfo,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, ContractError> {
        let tx_id = atomically(ledger, |state| {
            if let (true, Some(sender)) = (info.needs_auth, invocation.sender.as_ref()) {
                self.executor
                    .guard()
                    .check_at_submit(state, sender, invocation.nonce)?;
            }
            Ok(self.executor.store().submit(
                state,
                &self.registry,
                &info.name,
                invocation.sender,
                &invocation.args,
                invocation.nonce,
            )?)
        })?;
        debug!(tx_id = %tx_id, method = %info.name, "Pending call submitted");
        Ok(tx_id.to_hex().into_bytes())
    }

    /// Accept the caller only if it is the configured channel-transfer service.
    ///
    /// The service is identified either by its raw identity or by the SHA3-256
    /// digest of it.
    fn require_robot(&self, ledger: &dyn LedgerState) -> Result<(), ContractError> {
        let ski = self
            .config()
            .robot_ski
            .as_deref()
            .ok_or_else(|| ContractError::unauthorized("channel-transfer service is not configured"))?;
        let creator = ledger.creator()?;
        if creator.as_slice() == ski || Hash::digest(&creator).as_bytes().as_slice() == ski {
            return Ok(());
        }
        warn!("Caller is not the channel-transfer service");
        Err(ContractError::unauthorized(
            "unauthorized: caller is not the channel-transfer service",
        ))
    }
}

/// Run `f` in a call scope over `ledger`, committing only on success.
fn atomically<T>(
    ledger: &mut dyn LedgerState,
    f: impl FnOnce(&mut dyn LedgerState) -> Result<T, ContractError>,
) -> Result<T, ContractError> {
    let tx_id = ledger.tx_id();
    let mut scope = CallScope::new(ledger, tx_id);
    match f(&mut scope) {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(e) => {
            scope.discard();
            Err(e)
        }
    }
}
