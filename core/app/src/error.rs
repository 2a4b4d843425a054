//! Caller-facing errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lainvault_common::Error;

/// Error returned across the command boundary.
///
/// `kind` is one of `InvalidName`, `InvalidParameters`, `NotFound`,
/// `VaultUnavailable` or `StorageUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct CommandError {
    pub kind: String,
    pub message: String,
}

impl CommandError {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    /// A request that could not be understood at all.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new("InvalidParameters", message)
    }
}

impl From<Error> for CommandError {
    fn from(err: Error) -> Self {
        let kind = match &err {
            // Internal kinds that escaped the vault layer are storage faults.
            Error::Crypto(_) | Error::Serialization(_) | Error::Io(_) => "VaultUnavailable",
            other => other.kind(),
        };
        Self::new(kind, err.to_string())
    }
}
