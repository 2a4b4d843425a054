//! Vault manifest: the documents a vault currently holds.
//!
//! Nothing is cached. Every listing reads the vault root, so files added or
//! removed out of band show up on the next call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use lainvault_common::{DocumentName, Error, Result, VaultPath};
use lainvault_storage::StorageProvider;

/// One markdown document in a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    /// File name including the markdown extension.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Enumerates the markdown documents under a vault root.
pub struct VaultManifest {
    provider: Arc<dyn StorageProvider>,
}

impl VaultManifest {
    /// Create a manifest reader backed by `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Create the vault root if it does not exist yet.
    ///
    /// # Errors
    /// - `VaultUnavailable` if the root cannot be created or is not a directory
    pub async fn ensure_root(&self, root: &VaultPath) -> Result<()> {
        self.provider
            .create_dir(root)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                Error::NotFound(msg) => Error::VaultUnavailable(msg),
                other => other.into_vault_unavailable("Failed to prepare vault"),
            })
    }

    /// List markdown documents directly under `root`, sorted by name.
    ///
    /// The root is created on first use, so a fresh profile yields an empty
    /// listing. Non-markdown files and subdirectories are left out.
    ///
    /// # Errors
    /// - `VaultUnavailable` if the root cannot be created or read
    pub async fn list_documents(&self, root: &VaultPath) -> Result<Vec<DocumentEntry>> {
        self.ensure_root(root).await?;

        let listing = self.provider.list(root).await.map_err(|e| match e {
            Error::NotFound(_) => Error::VaultUnavailable(format!("Vault root vanished: {}", root)),
            other => other.into_vault_unavailable("Failed to list vault"),
        })?;

        let mut documents: Vec<DocumentEntry> = listing
            .into_iter()
            .filter(|meta| meta.is_file() && DocumentName::is_markdown(&meta.name))
            .map(|meta| DocumentEntry {
                size: meta.size.unwrap_or(0),
                name: meta.name,
                modified: meta.modified,
            })
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(vault = %root, count = documents.len(), "Listed documents");
        Ok(documents)
    }
}
