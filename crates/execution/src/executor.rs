//! The batch executor.

use crate::call::CallRunner;
use crate::BatchError;
use chainbatch_core::{ContractConfig, LedgerState, MethodRegistry};
use chainbatch_engine::BatchScope;
use chainbatch_mempool::{NonceGuard, PendingStore};
use chainbatch_types::{Batch, BatchEvent, BatchResponse, CallResult, SwapResponse, TransferResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Name of the aggregated event emitted by every successful batch.
pub const BATCH_EVENT: &str = "batchExecute";

/// Executes batches of pending calls against a ledger.
///
/// Holds no per-batch state; one executor serves every batch of a channel.
pub struct BatchExecutor {
    config: ContractConfig,
    registry: Arc<MethodRegistry>,
    store: PendingStore,
    guard: NonceGuard,
}

impl BatchExecutor {
    pub fn new(config: ContractConfig, registry: Arc<MethodRegistry>) -> Self {
        Self {
            store: PendingStore::from_config(&config),
            guard: NonceGuard::from_config(&config),
            config,
            registry,
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn store(&self) -> &PendingStore {
        &self.store
    }

    pub fn guard(&self) -> &NonceGuard {
        &self.guard
    }

    /// Decode a JSON batch, execute it, and encode the response as JSON.
    pub fn execute_payload(
        &self,
        ledger: &mut dyn LedgerState,
        payload: &[u8],
    ) -> Result<Vec<u8>, BatchError> {
        let batch: Batch =
            serde_json::from_slice(payload).map_err(|e| BatchError::Decode(e.to_string()))?;
        let response = self.execute(ledger, &batch)?;
        serde_json::to_vec(&response).map_err(|e| BatchError::Encode(e.to_string()))
    }

    /// Execute `batch` against `ledger`.
    ///
    /// On success the net effect of every successful call and transition is
    /// written to `ledger` at once and the `batchExecute` event is set. On
    /// error nothing is written, except that pending calls already attempted
    /// have been consumed.
    pub fn execute(
        &self,
        ledger: &mut dyn LedgerState,
        batch: &Batch,
    ) -> Result<BatchResponse, BatchError> {
        let started = Instant::now();
        let batch_timestamp = ledger.tx_timestamp().map_err(BatchError::Timestamp)?.seconds;
        info!(
            calls = batch.tx_ids.len(),
            swaps = batch.swaps.len() + batch.multi_swaps.len(),
            keys = batch.keys.len() + batch.multi_swap_keys.len(),
            transfers = batch.transfer_commands.len(),
            "Executing batch"
        );

        let mut scope = BatchScope::new(ledger);
        let runner = CallRunner {
            config: &self.config,
            registry: &self.registry,
            store: &self.store,
            guard: &self.guard,
        };

        let tx_responses: Vec<CallResult> = batch
            .tx_ids
            .iter()
            .map(|tx_id| runner.run(&mut scope, tx_id, batch_timestamp))
            .collect();

        let (swap_responses, swap_key_responses) = self.run_swaps(&mut scope, batch);
        let transfer_responses = self.run_transfers(&mut scope, batch);

        let created_swaps = scope.created_swaps();
        let created_multi_swaps = scope.created_multi_swaps();

        scope.commit().map_err(|e| {
            error!(error = %e, "Batch commit failed");
            BatchError::Commit(e)
        })?;

        let event = BatchEvent {
            events: tx_responses.iter().map(CallResult::to_event).collect(),
        };
        let payload = serde_json::to_vec(&event).map_err(|e| BatchError::Encode(e.to_string()))?;
        ledger
            .set_event(BATCH_EVENT, payload)
            .map_err(BatchError::Event)?;

        let failed = tx_responses.iter().filter(|r| !r.is_success()).count();
        info!(
            calls = tx_responses.len(),
            failed,
            created_swaps = created_swaps.len() + created_multi_swaps.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch executed"
        );

        Ok(BatchResponse {
            tx_responses,
            swap_responses,
            swap_key_responses,
            transfer_responses,
            created_swaps,
            created_multi_swaps,
        })
    }

    fn run_swaps(
        &self,
        scope: &mut BatchScope<'_>,
        batch: &Batch,
    ) -> (Vec<SwapResponse>, Vec<SwapResponse>) {
        let mut answers = Vec::new();
        let mut keys = Vec::new();

        if !self.config.disable_swaps {
            answers.extend(
                batch
                    .swaps
                    .iter()
                    .map(|swap| chainbatch_swap::swap_answer(scope, &self.config, swap)),
            );
            keys.extend(
                batch
                    .keys
                    .iter()
                    .map(|key| chainbatch_swap::swap_robot_done(scope, &self.config, key)),
            );
        } else if !batch.swaps.is_empty() || !batch.keys.is_empty() {
            debug!("Swaps disabled, skipping swap transitions");
        }

        if !self.config.disable_multi_swaps {
            answers.extend(
                batch
                    .multi_swaps
                    .iter()
                    .map(|swap| chainbatch_swap::multi_swap_answer(scope, &self.config, swap)),
            );
            keys.extend(
                batch
                    .multi_swap_keys
                    .iter()
                    .map(|key| chainbatch_swap::multi_swap_robot_done(scope, &self.config, key)),
            );
        } else if !batch.multi_swaps.is_empty() || !batch.multi_swap_keys.is_empty() {
            debug!("Multi swaps disabled, skipping multi swap transitions");
        }

        (answers, keys)
    }

    fn run_transfers(&self, scope: &mut BatchScope<'_>, batch: &Batch) -> Vec<TransferResponse> {
        if self.config.disable_channel_transfers {
            if !batch.transfer_commands.is_empty() {
                debug!("Channel transfers disabled, skipping transfer commands");
            }
            return Vec::new();
        }
        batch
            .transfer_commands
            .iter()
            .map(|command| chainbatch_transfer::apply_command(scope, &self.config, command))
            .collect()
    }
}
