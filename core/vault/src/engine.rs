//! Encryption engine: in-place bulk transform of a vault.
//!
//! One invocation is a single-shot batch over every regular file directly
//! under a vault root, minus an exact-name exclusion set. A failing file is
//! recorded and skipped; the rest of the batch still runs.
//!
//! # Caller obligations
//! The engine keeps no state about what is already encrypted. Encrypting a
//! vault twice double-encrypts every file; decrypting plaintext fails each
//! file's authentication check and leaves it untouched. Track the vault's
//! state yourself.
//!
//! The same (key, IV) pair seals every file of a batch. With an IV-based
//! cipher this reveals relationships between files that share prefixes.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lainvault_common::{Error, Result, SecretString, VaultPath};
use lainvault_crypto::{CipherParams, Direction};
use lainvault_storage::StorageProvider;

/// Parameters of one transform batch.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// Exact file names never read or rewritten.
    pub exclusions: Vec<String>,
    /// Key material.
    pub key: SecretString,
    /// IV material.
    pub iv: SecretString,
    /// Encrypt or decrypt.
    pub direction: Direction,
}

/// A file the batch could not transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub filename: String,
    pub reason: String,
}

/// Terminal state of a batch that got past validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformOutcome {
    /// Every eligible file was transformed.
    FullSuccess,
    /// At least one file failed or was not attempted.
    PartialSuccess,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub direction: Direction,
    pub succeeded: usize,
    pub failed: Vec<FileFailure>,
    /// Files left untouched because the batch was cancelled first.
    pub not_attempted: Vec<String>,
}

impl TransformReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            succeeded: 0,
            failed: Vec::new(),
            not_attempted: Vec::new(),
        }
    }

    /// Classify the batch.
    pub fn outcome(&self) -> TransformOutcome {
        if self.failed.is_empty() && self.not_attempted.is_empty() {
            TransformOutcome::FullSuccess
        } else {
            TransformOutcome::PartialSuccess
        }
    }

    /// Whether every eligible file was transformed.
    pub fn is_complete(&self) -> bool {
        self.outcome() == TransformOutcome::FullSuccess
    }
}

/// Runs transform batches against a storage provider.
pub struct EncryptionEngine {
    provider: Arc<dyn StorageProvider>,
    cancel: Option<CancellationToken>,
}

impl EncryptionEngine {
    /// Create an engine backed by `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            cancel: None,
        }
    }

    /// Stop between files once `token` is cancelled.
    ///
    /// A file already in flight always completes; the rest are reported as
    /// not attempted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Transform every eligible file under `root` in place.
    ///
    /// # Preconditions
    /// - Key and IV are non-empty
    ///
    /// # Postconditions
    /// - Excluded files, subdirectories and file names are never touched
    /// - No file is created or deleted
    /// - Each rewritten file is replaced atomically
    ///
    /// # Errors
    /// - `InvalidParameters` before any I/O if the key or IV is empty
    /// - `VaultUnavailable` if the root cannot be listed; nothing is touched
    ///
    /// Per-file failures are not errors; they are listed in the report.
    pub async fn run(&self, root: &VaultPath, request: &TransformRequest) -> Result<TransformReport> {
        let params = CipherParams::new(&request.key, &request.iv)?;
        let excluded: HashSet<&str> = request.exclusions.iter().map(String::as_str).collect();

        let listing = self.provider.list(root).await.map_err(|e| match e {
            Error::NotFound(_) => Error::VaultUnavailable(format!("Vault not found: {}", root)),
            other => other.into_vault_unavailable("Failed to list vault"),
        })?;

        let mut eligible: Vec<String> = listing
            .into_iter()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.name)
            .filter(|name| !excluded.contains(name.as_str()))
            .collect();
        eligible.sort();

        info!(
            vault = %root,
            direction = %request.direction,
            files = eligible.len(),
            excluded = excluded.len(),
            "Starting vault transform"
        );

        let mut report = TransformReport::new(request.direction);
        let mut pending = eligible.into_iter();
        while let Some(filename) = pending.next() {
            if self.is_cancelled() {
                report.not_attempted.push(filename);
                report.not_attempted.extend(pending.by_ref());
                warn!(vault = %root, remaining = report.not_attempted.len(), "Transform cancelled");
                break;
            }

            match self.transform_file(root, &filename, &params, request.direction).await {
                Ok(()) => {
                    debug!(file = %filename, "File transformed");
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(file = %filename, error = %e, "File transform failed");
                    report.failed.push(FileFailure {
                        filename,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            vault = %root,
            direction = %request.direction,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            not_attempted = report.not_attempted.len(),
            "Vault transform finished"
        );
        Ok(report)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    async fn transform_file(
        &self,
        root: &VaultPath,
        filename: &str,
        params: &CipherParams,
        direction: Direction,
    ) -> Result<()> {
        let path = root.join(filename)?;
        let input = self.provider.read(&path).await?;
        let output = params.apply(direction, &input)?;
        self.provider.replace(&path, output).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lainvault_storage::MemoryProvider;

    fn root() -> VaultPath {
        VaultPath::parse("/lain").unwrap()
    }

    fn request(direction: Direction, key: &str) -> TransformRequest {
        TransformRequest {
            exclusions: vec!["config.json".to_string()],
            key: SecretString::new(key),
            iv: SecretString::new("navi-iv"),
            direction,
        }
    }

    async fn seeded() -> Arc<MemoryProvider> {
        let provider = Arc::new(MemoryProvider::new());
        provider.create_dir(&root()).await.unwrap();
        for (name, body) in [
            ("a.md", "# alpha"),
            ("b.md", "# beta"),
            ("config.json", "{\"theme\":\"dark\"}"),
        ] {
            provider
                .replace(&root().join(name).unwrap(), body.as_bytes().to_vec())
                .await
                .unwrap();
        }
        provider
    }

    async fn read(provider: &MemoryProvider, name: &str) -> Vec<u8> {
        provider.read(&root().join(name).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_encrypt_skips_excluded() {
        let provider = seeded().await;
        let engine = EncryptionEngine::new(provider.clone());

        let report = engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.outcome(), TransformOutcome::FullSuccess);
        assert_ne!(read(&provider, "a.md").await, b"# alpha");
        assert_ne!(read(&provider, "b.md").await, b"# beta");
        assert_eq!(read(&provider, "config.json").await, b"{\"theme\":\"dark\"}");
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt_restores() {
        let provider = seeded().await;
        let engine = EncryptionEngine::new(provider.clone());

        engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap();
        let report = engine.run(&root(), &request(Direction::Decrypt, "k")).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(read(&provider, "a.md").await, b"# alpha");
        assert_eq!(read(&provider, "b.md").await, b"# beta");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_isolated() {
        let provider = seeded().await;
        provider.deny_access(&root().join("a.md").unwrap());
        let engine = EncryptionEngine::new(provider.clone());

        let report = engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].filename, "a.md");
        assert!(!report.failed[0].reason.is_empty());
        assert_eq!(report.outcome(), TransformOutcome::PartialSuccess);
        assert_ne!(read(&provider, "b.md").await, b"# beta");
    }

    #[tokio::test]
    async fn test_empty_key_touches_nothing() {
        let provider = seeded().await;
        provider.deny_access(&root());
        let engine = EncryptionEngine::new(provider.clone());

        // Validation happens before the (denied) listing is attempted.
        let err = engine.run(&root(), &request(Direction::Encrypt, "")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_wrong_key_decrypt_fails_per_file() {
        let provider = seeded().await;
        let engine = EncryptionEngine::new(provider.clone());
        engine.run(&root(), &request(Direction::Encrypt, "right")).await.unwrap();
        let sealed = read(&provider, "a.md").await;

        let report = engine.run(&root(), &request(Direction::Decrypt, "wrong")).await.unwrap();

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.outcome(), TransformOutcome::PartialSuccess);
        assert_eq!(read(&provider, "a.md").await, sealed);
    }

    #[tokio::test]
    async fn test_subdirectories_are_not_entered() {
        let provider = seeded().await;
        let nested = root().join("archive").unwrap();
        provider.create_dir(&nested).await.unwrap();
        provider
            .replace(&nested.join("old.md").unwrap(), b"old".to_vec())
            .await
            .unwrap();
        let engine = EncryptionEngine::new(provider.clone());

        let report = engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(
            provider.read(&nested.join("old.md").unwrap()).await.unwrap(),
            b"old"
        );
    }

    #[tokio::test]
    async fn test_missing_root_is_vault_unavailable() {
        let engine = EncryptionEngine::new(Arc::new(MemoryProvider::new()));
        let err = engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap_err();
        assert!(matches!(err, Error::VaultUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_batch_reports_not_attempted() {
        let provider = seeded().await;
        let token = CancellationToken::new();
        token.cancel();
        let engine = EncryptionEngine::new(provider.clone()).with_cancellation(token);

        let report = engine.run(&root(), &request(Direction::Encrypt, "k")).await.unwrap();

        assert_eq!(report.succeeded, 0);
        assert!(report.failed.is_empty());
        assert_eq!(report.not_attempted, vec!["a.md", "b.md"]);
        assert_eq!(report.outcome(), TransformOutcome::PartialSuccess);
        assert_eq!(read(&provider, "a.md").await, b"# alpha");
    }
}
