//! Invocation and response envelopes.

use chainbatch_types::Address;
use serde::{Deserialize, Serialize};

/// One call into the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Authenticated caller, if the invocation was signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    #[serde(default)]
    pub nonce: u64,
}

impl Invocation {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            sender: None,
            nonce: 0,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn signed_by(mut self, sender: Address, nonce: u64) -> Self {
        self.sender = Some(sender);
        self.nonce = nonce;
        self
    }
}

/// Outcome of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Success(Vec<u8>),
    Error(String),
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Success(payload) => Some(payload),
            Response::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(message) => Some(message),
        }
    }
}
