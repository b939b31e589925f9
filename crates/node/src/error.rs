use chainbatch_core::{ConfigError, RegistryError};
use thiserror::Error;

/// Errors constructing a [`Chaincode`](crate::Chaincode).
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
