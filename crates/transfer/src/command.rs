//! Transfer commands carried by a batch.

use crate::{protocol, TransferError};
use chainbatch_core::{ContractConfig, ContractContext, LedgerState};
use chainbatch_engine::{contain, CallScope};
use chainbatch_types::{ResponseError, TransferCommand, TransferResponse};
use tracing::{debug, error, warn};

/// Apply one command in its own call scope on top of `parent`.
///
/// The scope is committed into `parent` only if the command succeeds.
pub fn apply_command(
    parent: &mut dyn LedgerState,
    config: &ContractConfig,
    command: &TransferCommand,
) -> TransferResponse {
    let id = command.transfer_id().to_string();
    let tx_id = parent.tx_id();
    let mut scope = CallScope::new(parent, tx_id);

    let outcome = contain(|| {
        let mut ctx = ContractContext::new(&mut scope, config);
        run(&mut ctx, command)
    });

    let failure = match outcome {
        Ok(Ok(())) => match scope.commit() {
            Ok(snapshot) => {
                debug!(id = %id, writes = snapshot.writes.len(), "Transfer command applied");
                return TransferResponse {
                    id,
                    error: None,
                    writes: snapshot.writes,
                };
            }
            Err(e) => e.to_string(),
        },
        Ok(Err(e)) => {
            warn!(id = %id, error = %e, "Transfer command failed");
            e.to_string()
        }
        Err(panic) => {
            error!(id = %id, panic = %panic, "Transfer command panicked");
            format!("panic transfer command: {panic}")
        }
    };

    TransferResponse {
        id,
        error: Some(ResponseError::new(failure)),
        writes: Vec::new(),
    }
}

fn run(ctx: &mut ContractContext<'_>, command: &TransferCommand) -> Result<(), TransferError> {
    match command {
        TransferCommand::CreateTo { transfer } => {
            protocol::create_to(ctx, transfer.clone()).map(|_| ())
        }
        TransferCommand::CommitFrom { id } => protocol::commit_from(ctx, id),
        TransferCommand::CancelFrom { id } => protocol::cancel_from(ctx, id),
        TransferCommand::DeleteFrom { id } => protocol::delete_from(ctx, id),
        TransferCommand::DeleteTo { id } => protocol::delete_to(ctx, id),
    }
}
