//! Profile registry persisted in the data root.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::layout::registry_path;
use lainvault_common::{Error, ProfileName, Result};
use lainvault_storage::StorageProvider;

/// Current registry record format.
pub const REGISTRY_VERSION: u32 = 1;

/// On-store registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Record format version.
    #[serde(default = "current_version")]
    pub version: u32,
    /// Known profile names in registration order.
    #[serde(default)]
    pub profiles: Vec<String>,
}

fn current_version() -> u32 {
    REGISTRY_VERSION
}

impl Default for RegistryRecord {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            profiles: Vec::new(),
        }
    }
}

/// Ordered set of known profile names.
///
/// Writes go through the provider's atomic replace, so a failed update leaves
/// the previous record intact.
pub struct ProfileRegistry {
    provider: Arc<dyn StorageProvider>,
    // Serialises read-modify-write so concurrent registrations are not lost.
    update: Mutex<()>,
}

impl ProfileRegistry {
    /// Create a registry backed by `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            update: Mutex::new(()),
        }
    }

    /// Add `name` if absent and persist the record.
    ///
    /// Returns `true` when the name was newly added. Registering a known name
    /// succeeds without writing.
    ///
    /// # Errors
    /// - `StorageUnavailable` if the record cannot be read or written
    pub async fn register(&self, name: &ProfileName) -> Result<bool> {
        let _guard = self.update.lock().await;

        let mut record = self.load().await?;
        if record.profiles.iter().any(|p| p == name.as_str()) {
            debug!(profile = %name, "Profile already registered");
            return Ok(false);
        }

        record.profiles.push(name.as_str().to_string());
        record.version = REGISTRY_VERSION;
        self.store(&record).await?;

        info!(profile = %name, total = record.profiles.len(), "Profile registered");
        Ok(true)
    }

    /// Known profile names in registration order.
    ///
    /// An absent record is the empty registry, not an error.
    pub async fn list(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.profiles)
    }

    async fn load(&self) -> Result<RegistryRecord> {
        let path = registry_path()?;
        let bytes = match self.provider.read(&path).await {
            Ok(bytes) => bytes,
            Err(Error::NotFound(_)) => return Ok(RegistryRecord::default()),
            Err(e) => return Err(e.into_storage_unavailable("Failed to read profile registry")),
        };

        let record: RegistryRecord = serde_json::from_slice(&bytes).map_err(|e| {
            Error::StorageUnavailable(format!("Profile registry is corrupt: {}", e))
        })?;

        if record.version > REGISTRY_VERSION {
            return Err(Error::StorageUnavailable(format!(
                "Profile registry version {} is newer than supported version {}",
                record.version, REGISTRY_VERSION
            )));
        }

        Ok(record)
    }

    async fn store(&self, record: &RegistryRecord) -> Result<()> {
        let path = registry_path()?;
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.provider
            .replace(&path, bytes)
            .await
            .map(|_| ())
            .map_err(|e| e.into_storage_unavailable("Failed to write profile registry"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lainvault_common::VaultPath;
    use lainvault_storage::MemoryProvider;

    fn name(s: &str) -> ProfileName {
        ProfileName::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_empty_registry_lists_nothing() {
        let registry = ProfileRegistry::new(Arc::new(MemoryProvider::new()));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_is_idempotent_and_ordered() {
        let registry = ProfileRegistry::new(Arc::new(MemoryProvider::new()));

        assert!(registry.register(&name("lain")).await.unwrap());
        assert!(registry.register(&name("alice")).await.unwrap());
        assert!(!registry.register(&name("lain")).await.unwrap());

        assert_eq!(registry.list().await.unwrap(), vec!["lain", "alice"]);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_are_not_lost() {
        let registry = Arc::new(ProfileRegistry::new(Arc::new(MemoryProvider::new())));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.register(&name(&format!("p{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(registry.list().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_storage_unavailable() {
        let provider = Arc::new(MemoryProvider::new());
        provider
            .replace(&registry_path().unwrap(), b"{not json".to_vec())
            .await
            .unwrap();

        let registry = ProfileRegistry::new(provider);
        let err = registry.list().await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreadable_record_is_storage_unavailable() {
        let provider = Arc::new(MemoryProvider::new());
        provider.deny_access(&VaultPath::parse("/markdown_config.json").unwrap());

        let registry = ProfileRegistry::new(provider);
        let err = registry.register(&name("lain")).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[test]
    fn test_record_defaults_missing_fields() {
        let record: RegistryRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, RegistryRecord::default());
    }
}
