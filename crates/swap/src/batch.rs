//! Running swap transitions carried by a batch.

use crate::SwapError;
use chainbatch_core::{ContractConfig, ContractContext, LedgerState};
use chainbatch_engine::{contain, CallScope};
use chainbatch_types::{ResponseError, SwapResponse, TxId};
use tracing::{debug, error, warn};

/// Run `op` in a call scope over `parent` identified by the swap id.
///
/// The scope is committed into `parent` only if `op` succeeds.
pub(crate) fn run_in_scope<F>(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    id: &TxId,
    op: F,
) -> SwapResponse
where
    F: FnOnce(&mut ContractContext<'_>) -> Result<(), SwapError>,
{
    let mut scope = CallScope::new(parent, id.clone());

    let outcome = contain(|| {
        let mut ctx = ContractContext::new(&mut scope, config);
        op(&mut ctx)
    });

    let failure = match outcome {
        Ok(Ok(())) => match scope.commit() {
            Ok(snapshot) => {
                debug!(swap = %id, writes = snapshot.writes.len(), "Swap transition applied");
                return SwapResponse {
                    id: id.clone(),
                    error: None,
                    writes: snapshot.writes,
                };
            }
            Err(e) => e.to_string(),
        },
        Ok(Err(e)) => {
            warn!(swap = %id, error = %e, "Swap transition failed");
            e.to_string()
        }
        Err(panic) => {
            error!(swap = %id, panic = %panic, "Swap transition panicked");
            format!("panic swap: {panic}")
        }
    };

    SwapResponse {
        id: id.clone(),
        error: Some(ResponseError::new(failure)),
        writes: Vec::new(),
    }
}
