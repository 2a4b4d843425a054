//! Vault manager: resolves profiles to vault roots and dispatches operations.

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::documents::DocumentStore;
use crate::engine::{EncryptionEngine, TransformReport, TransformRequest};
use crate::layout::{vault_root, VaultTarget};
use crate::locks::VaultLocks;
use crate::manifest::{DocumentEntry, VaultManifest};
use crate::profiles::ProfileRegistry;
use lainvault_common::{DocumentName, Error, ProfileName, Result, VaultPath};
use lainvault_crypto::CipherParams;
use lainvault_storage::{LocalProvider, StorageProvider};

/// Entry point for every per-profile vault operation.
///
/// Holds no "current profile"; each call names the profile it acts on.
pub struct VaultManager {
    provider: Arc<dyn StorageProvider>,
    registry: ProfileRegistry,
    manifest: VaultManifest,
    documents: DocumentStore,
    locks: VaultLocks,
}

impl VaultManager {
    /// Create a manager over any storage provider.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            registry: ProfileRegistry::new(provider.clone()),
            manifest: VaultManifest::new(provider.clone()),
            documents: DocumentStore::new(provider.clone()),
            locks: VaultLocks::new(),
            provider,
        }
    }

    /// Create a manager over a data root on the local filesystem.
    ///
    /// # Errors
    /// - `StorageUnavailable` if the data root cannot be created
    pub fn local(data_root: impl AsRef<Path>) -> Result<Self> {
        let provider = LocalProvider::new(data_root.as_ref()).map_err(|e| {
            e.into_storage_unavailable(&format!(
                "Cannot open data root {}",
                data_root.as_ref().display()
            ))
        })?;
        Ok(Self::new(Arc::new(provider)))
    }

    /// Add a profile to the registry. Registering a known profile is a no-op.
    pub async fn register_profile(&self, name: &str) -> Result<()> {
        let profile = ProfileName::new(name)?;
        self.registry.register(&profile).await?;
        Ok(())
    }

    /// Known profiles in registration order.
    pub async fn list_profiles(&self) -> Result<Vec<String>> {
        self.registry.list().await
    }

    /// Markdown documents in a profile's vault, sorted by name.
    pub async fn list_documents(&self, profile: &str) -> Result<Vec<DocumentEntry>> {
        let root = Self::resolve(profile)?;
        self.manifest.list_documents(&root).await
    }

    /// Save a document, returning the normalised file name it was stored under.
    ///
    /// The first save under a profile name registers that profile, once its
    /// vault root exists. Holds the vault's write lock for the duration of the
    /// write.
    pub async fn save_document(
        &self,
        profile: &str,
        filename: &str,
        content: &str,
    ) -> Result<DocumentName> {
        let profile = ProfileName::new(profile)?;
        let root = vault_root(&profile)?;
        let name = DocumentName::parse(filename)?;
        self.manifest.ensure_root(&root).await?;
        self.registry.register(&profile).await?;

        let key = Self::lock_key(self.provider.as_ref(), &root).await;
        let _guard = self.locks.acquire(&key).await;
        self.documents.save(&root, &name, content).await?;
        Ok(name)
    }

    /// Load a document's full content.
    pub async fn load_document(&self, profile: &str, filename: &str) -> Result<String> {
        let root = Self::resolve(profile)?;
        let name = DocumentName::parse(filename)?;
        self.documents.load(&root, &name).await
    }

    /// Encrypt or decrypt every eligible file of a vault in place.
    ///
    /// Key and IV are validated before the target is resolved or any lock is
    /// taken. The vault's write lock is held for the whole batch.
    ///
    /// See [`EncryptionEngine::run`] for the partial-failure contract and the
    /// caller's obligation to track whether a vault is currently encrypted.
    pub async fn transform_vault(
        &self,
        target: &VaultTarget,
        request: &TransformRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<TransformReport> {
        CipherParams::new(&request.key, &request.iv)?;

        let (provider, root) = match target {
            VaultTarget::Profile(profile) => (self.provider.clone(), Self::resolve(profile)?),
            VaultTarget::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(Error::VaultUnavailable(format!(
                        "Vault directory not found: {}",
                        dir.display()
                    )));
                }
                let canonical = dir.canonicalize().map_err(|e| {
                    Error::VaultUnavailable(format!("{}: {}", dir.display(), e))
                })?;
                let provider: Arc<dyn StorageProvider> = Arc::new(
                    LocalProvider::new(&canonical)
                        .map_err(|e| e.into_vault_unavailable("Cannot open vault directory"))?,
                );
                (provider, VaultPath::root())
            }
        };
        let lock_key = Self::lock_key(provider.as_ref(), &root).await;

        let mut engine = EncryptionEngine::new(provider);
        if let Some(token) = cancel {
            engine = engine.with_cancellation(token);
        }

        let _guard = self.locks.acquire(&lock_key).await;
        let report = engine.run(&root, request).await?;

        info!(
            target = ?target,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Vault transform complete"
        );
        Ok(report)
    }

    fn resolve(profile: &str) -> Result<VaultPath> {
        vault_root(&ProfileName::new(profile)?)
    }

    /// Lock identity of a vault root.
    ///
    /// Directory-backed vaults are keyed by their canonical path, so a profile
    /// and an explicit directory naming the same place share one lock.
    async fn lock_key(provider: &dyn StorageProvider, root: &VaultPath) -> String {
        match provider.local_path(root) {
            Some(dir) => tokio::fs::canonicalize(&dir)
                .await
                .unwrap_or(dir)
                .display()
                .to_string(),
            None => root.to_string_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lainvault_crypto::Direction;
    use lainvault_common::SecretString;
    use lainvault_storage::MemoryProvider;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tempfile::TempDir;

    fn request(direction: Direction, key: &str) -> TransformRequest {
        TransformRequest {
            exclusions: vec!["config.json".to_string()],
            key: SecretString::new(key),
            iv: SecretString::new("0123456789abcdef"),
            direction,
        }
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| {
                (
                    e.file_name().into_string().unwrap(),
                    std::fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    async fn seeded(temp: &TempDir) -> VaultManager {
        let manager = VaultManager::local(temp.path()).unwrap();
        manager.register_profile("lain").await.unwrap();
        manager.save_document("lain", "a", "# alpha\n").await.unwrap();
        manager.save_document("lain", "b.md", "# beta\n").await.unwrap();
        std::fs::write(temp.path().join("lain").join("config.json"), b"{\"k\":1}").unwrap();
        manager
    }

    #[tokio::test]
    async fn test_register_twice_lists_once() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        manager.register_profile("lain").await.unwrap();
        manager.register_profile("lain").await.unwrap();

        let profiles = manager.list_profiles().await.unwrap();
        assert_eq!(profiles.iter().filter(|p| *p == "lain").count(), 1);
    }

    #[tokio::test]
    async fn test_register_empty_name_fails() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        let err = manager.register_profile("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_fresh_profile_has_no_documents() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        manager.register_profile("lain").await.unwrap();
        assert!(manager.list_documents("lain").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        let stored = manager.save_document("lain", "diary", "entry one").await.unwrap();

        assert_eq!(stored.as_str(), "diary.md");
        assert_eq!(manager.load_document("lain", "diary").await.unwrap(), "entry one");
        let docs = manager.list_documents("lain").await.unwrap();
        assert_eq!(docs[0].name, "diary.md");
    }

    #[tokio::test]
    async fn test_first_save_registers_profile() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        manager.save_document("alice", "a", "x").await.unwrap();
        manager.save_document("alice", "b", "y").await.unwrap();

        assert_eq!(manager.list_profiles().await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_longest_document_name_saves_on_disk() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path()).unwrap();
        let base = "a".repeat(252);

        let stored = manager.save_document("lain", &base, "x").await.unwrap();
        assert_eq!(stored.as_str().len(), 255);
        assert_eq!(manager.load_document("lain", &base).await.unwrap(), "x");

        let err = manager
            .save_document("lain", &"a".repeat(253), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_oversized_profile_is_never_registered() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path()).unwrap();

        let err = manager
            .save_document(&"あ".repeat(30), "a", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidName(_)));
        assert!(manager.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_vault_root_is_not_registered() {
        let provider = Arc::new(MemoryProvider::new());
        provider.deny_access(&VaultPath::parse("/lain").unwrap());
        let manager = VaultManager::new(provider);

        let err = manager.save_document("lain", "a", "x").await.unwrap_err();

        assert!(matches!(err, Error::VaultUnavailable(_)));
        assert!(manager.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_target_shares_profile_lock() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(seeded(&temp).await);
        let dir = LocalProvider::new(temp.path().join("lain")).unwrap();
        let profile_root = VaultPath::parse("/lain").unwrap();
        let profile_key = VaultManager::lock_key(manager.provider.as_ref(), &profile_root).await;
        let dir_key = VaultManager::lock_key(&dir, &VaultPath::root()).await;
        assert_eq!(profile_key, dir_key);

        // Held as a directory-target transform would hold it.
        let guard = manager.locks.acquire(&dir_key).await;
        let saver = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.save_document("lain", "c", "late").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!saver.is_finished());

        drop(guard);
        saver.await.unwrap().unwrap();
        assert_eq!(manager.load_document("lain", "c").await.unwrap(), "late");
    }

    #[tokio::test]
    async fn test_profiles_are_isolated() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        manager.save_document("Lain", "n", "upper").await.unwrap();
        manager.save_document("lain", "n", "lower").await.unwrap();

        assert_eq!(manager.load_document("Lain", "n").await.unwrap(), "upper");
        assert_eq!(manager.load_document("lain", "n").await.unwrap(), "lower");
    }

    #[tokio::test]
    async fn test_path_escape_rejected_before_write() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path()).unwrap();

        let err = manager.save_document("lain", "../escape", "x").await.unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
        assert!(!temp.path().join("escape.md").exists());
        assert!(!temp.path().join("lain").exists());
    }

    #[tokio::test]
    async fn test_load_never_saved_is_not_found() {
        let manager = VaultManager::new(Arc::new(MemoryProvider::new()));
        let err = manager.load_document("lain", "ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transform_profile_roundtrip_on_disk() {
        let temp = TempDir::new().unwrap();
        let manager = seeded(&temp).await;
        let vault_dir = temp.path().join("lain");
        let before = snapshot(&vault_dir);
        let target = VaultTarget::Profile("lain".to_string());

        let report = manager
            .transform_vault(&target, &request(Direction::Encrypt, "key"), None)
            .await
            .unwrap();
        assert_eq!(report.succeeded, 2);
        assert!(report.failed.is_empty());

        let encrypted = snapshot(&vault_dir);
        assert_eq!(encrypted["config.json"], before["config.json"]);
        assert_ne!(encrypted["a.md"], before["a.md"]);
        assert_ne!(encrypted["b.md"], before["b.md"]);
        // Encrypted documents still load as text.
        assert!(manager.load_document("lain", "a").await.is_ok());

        manager
            .transform_vault(&target, &request(Direction::Decrypt, "key"), None)
            .await
            .unwrap();
        assert_eq!(snapshot(&vault_dir), before);
    }

    #[tokio::test]
    async fn test_transform_empty_key_leaves_vault_untouched() {
        let temp = TempDir::new().unwrap();
        let manager = seeded(&temp).await;
        let vault_dir = temp.path().join("lain");
        let before = snapshot(&vault_dir);

        let err = manager
            .transform_vault(
                &VaultTarget::Profile("lain".to_string()),
                &request(Direction::Encrypt, ""),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidParameters(_)));
        assert_eq!(snapshot(&vault_dir), before);
    }

    #[tokio::test]
    async fn test_transform_directory_target() {
        let temp = TempDir::new().unwrap();
        let manager = seeded(&temp).await;
        let vault_dir = temp.path().join("lain");
        let before = snapshot(&vault_dir);
        let target = VaultTarget::Directory(vault_dir.clone());

        manager
            .transform_vault(&target, &request(Direction::Encrypt, "key"), None)
            .await
            .unwrap();
        let report = manager
            .transform_vault(&target, &request(Direction::Decrypt, "key"), None)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(snapshot(&vault_dir), before);
    }

    #[tokio::test]
    async fn test_transform_corrupt_file_is_isolated_on_disk() {
        let temp = TempDir::new().unwrap();
        let manager = seeded(&temp).await;
        let target = VaultTarget::Profile("lain".to_string());
        manager
            .transform_vault(&target, &request(Direction::Encrypt, "key"), None)
            .await
            .unwrap();
        // Out-of-band plaintext file that cannot be decrypted.
        std::fs::write(temp.path().join("lain").join("c.md"), "# not encrypted").unwrap();

        let report = manager
            .transform_vault(&target, &request(Direction::Decrypt, "key"), None)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].filename, "c.md");
        assert_eq!(manager.load_document("lain", "a").await.unwrap(), "# alpha\n");
        assert_eq!(
            manager.load_document("lain", "c").await.unwrap(),
            "# not encrypted"
        );
    }

    #[tokio::test]
    async fn test_transform_missing_directory_is_vault_unavailable() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path()).unwrap();
        let err = manager
            .transform_vault(
                &VaultTarget::Directory(temp.path().join("nowhere")),
                &request(Direction::Encrypt, "key"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VaultUnavailable(_)));
    }
}
