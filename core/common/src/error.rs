//! Common error types for Lain's Vault.

use thiserror::Error;

/// Top-level error type for vault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsafe profile or document name.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Missing or malformed cipher parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A profile's vault root could not be reached.
    #[error("Vault unavailable: {0}")]
    VaultUnavailable(String),

    /// Shared storage (the profile registry) could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable name of the error kind, as reported to external callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidName(_) => "InvalidName",
            Error::InvalidParameters(_) => "InvalidParameters",
            Error::NotFound(_) => "NotFound",
            Error::VaultUnavailable(_) => "VaultUnavailable",
            Error::StorageUnavailable(_) => "StorageUnavailable",
            Error::Crypto(_) => "Crypto",
            Error::Serialization(_) => "Serialization",
            Error::Io(_) => "Io",
        }
    }

    /// Re-classify a low-level storage failure as `VaultUnavailable`.
    ///
    /// Validation and not-found errors pass through unchanged.
    pub fn into_vault_unavailable(self, context: &str) -> Self {
        match self {
            Error::Io(e) => Error::VaultUnavailable(format!("{}: {}", context, e)),
            Error::Serialization(msg) => Error::VaultUnavailable(format!("{}: {}", context, msg)),
            other => other,
        }
    }

    /// Re-classify a low-level storage failure as `StorageUnavailable`.
    pub fn into_storage_unavailable(self, context: &str) -> Self {
        match self {
            Error::Io(e) => Error::StorageUnavailable(format!("{}: {}", context, e)),
            Error::Serialization(msg) => {
                Error::StorageUnavailable(format!("{}: {}", context, msg))
            }
            Error::VaultUnavailable(msg) => {
                Error::StorageUnavailable(format!("{}: {}", context, msg))
            }
            other => other,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_maps_to_vault_unavailable() {
        let err = Error::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let mapped = err.into_vault_unavailable("listing vault");
        assert_eq!(mapped.kind(), "VaultUnavailable");
        assert!(mapped.to_string().contains("listing vault"));
    }

    #[test]
    fn test_not_found_passes_through() {
        let err = Error::NotFound("a.md".to_string());
        assert_eq!(err.into_storage_unavailable("reading").kind(), "NotFound");
    }
}
