//! Contract entry point.
//!
//! [`Chaincode`] owns the method registry and the batch executor of one
//! channel and routes every invocation:
//!
//! - `batchExecute` runs a batch (channel-transfer service only);
//! - query methods run against a read-only view;
//! - no-batch methods run at once and commit on success;
//! - batched methods are validated and stored as pending calls.
//!
//! Every invocation yields a [`Response`]; errors and panics never escape.

mod chaincode;
mod error;
mod invocation;
mod methods;

pub use chaincode::{Chaincode, BATCH_EXECUTE};
pub use error::NodeError;
pub use invocation::{Invocation, Response};
pub use methods::{register_base_methods, ROBOT_METHODS};
