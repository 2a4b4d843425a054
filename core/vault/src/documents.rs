//! Document store: whole-value reads and writes of markdown files.

use std::sync::Arc;
use tracing::{debug, info};

use crate::manifest::VaultManifest;
use lainvault_common::{DocumentName, Error, Result, VaultPath};
use lainvault_storage::StorageProvider;

/// Reads and writes documents inside one vault root at a time.
pub struct DocumentStore {
    provider: Arc<dyn StorageProvider>,
    manifest: VaultManifest,
}

impl DocumentStore {
    /// Create a document store backed by `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            manifest: VaultManifest::new(provider.clone()),
            provider,
        }
    }

    /// Write `content` to `name`, creating the vault root and file as needed.
    ///
    /// # Postconditions
    /// - The document holds exactly `content`; any previous content is fully
    ///   replaced in one atomic step
    ///
    /// # Errors
    /// - `VaultUnavailable` if the vault root cannot be created or written
    pub async fn save(&self, root: &VaultPath, name: &DocumentName, content: &str) -> Result<()> {
        self.manifest.ensure_root(root).await?;

        let path = root.join(name.as_str())?;
        self.provider
            .replace(&path, content.as_bytes().to_vec())
            .await
            .map_err(|e| match e {
                Error::NotFound(msg) => Error::VaultUnavailable(msg),
                other => other.into_vault_unavailable("Failed to save document"),
            })?;

        info!(vault = %root, document = %name, size = content.len(), "Document saved");
        Ok(())
    }

    /// Read the full content of `name`.
    ///
    /// # Errors
    /// - `NotFound` if the document (or the whole vault) does not exist
    /// - `VaultUnavailable` if the vault cannot be read
    /// - `Serialization` if the stored bytes are not UTF-8 text
    pub async fn load(&self, root: &VaultPath, name: &DocumentName) -> Result<String> {
        let path = root.join(name.as_str())?;
        let bytes = self.provider.read(&path).await.map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("Document not found: {}", name)),
            other => other.into_vault_unavailable("Failed to load document"),
        })?;

        let content = String::from_utf8(bytes).map_err(|_| {
            Error::Serialization(format!("Document {} is not valid UTF-8 text", name))
        })?;

        debug!(vault = %root, document = %name, size = content.len(), "Document loaded");
        Ok(content)
    }
}
