//! Execution of one pending call inside a batch.

use chainbatch_core::{ContractConfig, ContractContext, MethodRegistry};
use chainbatch_engine::{contain, BatchScope, CallScope};
use chainbatch_mempool::{NonceGuard, PendingStore};
use chainbatch_types::{CallResult, TxId};
use tracing::{debug, error, warn};

pub(crate) struct CallRunner<'r> {
    pub config: &'r ContractConfig,
    pub registry: &'r MethodRegistry,
    pub store: &'r PendingStore,
    pub guard: &'r NonceGuard,
}

impl CallRunner<'_> {
    /// Consume the pending call `tx_id` and run it on top of `batch`.
    ///
    /// Never fails: every fault is reported in the returned result, and a
    /// failed call leaves at most its nonce record in `batch`.
    pub fn run(&self, batch: &mut BatchScope<'_>, tx_id: &TxId, batch_timestamp: i64) -> CallResult {
        // The pending record is consumed on the ledger itself; the nonce
        // record is buffered with the batch.
        let loaded = match self
            .store
            .load(batch.ledger(), self.registry, tx_id, batch_timestamp)
        {
            Ok(pending) => self
                .store
                .admit(&mut *batch, self.registry, self.guard, &pending)
                .map(|()| pending),
            Err(failure) => Err(failure),
        };
        let pending = match loaded {
            Ok(pending) => pending,
            Err(failure) => {
                warn!(tx_id = %tx_id, error = %failure, "Pending call rejected");
                return CallResult::failed(
                    tx_id.clone(),
                    failure.method.unwrap_or_default(),
                    format!("function and args loading error: {}", failure.error),
                );
            }
        };

        let mut scope = CallScope::new(batch, tx_id.clone());
        let outcome = contain(|| {
            let mut ctx = ContractContext::new(&mut scope, self.config);
            self.registry
                .call(&pending.method, &mut ctx, pending.sender.as_ref(), &pending.args)
        });

        match outcome {
            Ok(Ok(result)) => match scope.commit() {
                Ok(snapshot) => {
                    debug!(
                        tx_id = %tx_id,
                        method = %pending.method,
                        writes = snapshot.writes.len(),
                        events = snapshot.events.len(),
                        "Call executed"
                    );
                    let accounting = snapshot.accounting();
                    CallResult {
                        id: tx_id.clone(),
                        method: pending.method,
                        error: None,
                        writes: snapshot.writes,
                        events: snapshot.events,
                        accounting,
                        result,
                    }
                }
                Err(e) => {
                    error!(tx_id = %tx_id, error = %e, "Call scope merge failed");
                    CallResult::failed(tx_id.clone(), pending.method, e.to_string())
                }
            },
            Ok(Err(e)) => {
                scope.discard();
                debug!(tx_id = %tx_id, method = %pending.method, error = %e, "Call failed");
                CallResult::failed(tx_id.clone(), pending.method, e.to_string())
            }
            Err(panic) => {
                scope.discard();
                error!(tx_id = %tx_id, method = %pending.method, panic = %panic, "Call panicked");
                CallResult::failed(tx_id.clone(), pending.method, "panic batchedTxExecute")
            }
        }
    }
}
