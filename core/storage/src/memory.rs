//! In-memory storage provider for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use crate::provider::{Metadata, StorageProvider};
use lainvault_common::{Error, Result, VaultPath};

/// In-memory storage entry.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, metadata: Metadata },
    Directory { metadata: Metadata },
}

impl Entry {
    fn metadata(&self) -> &Metadata {
        match self {
            Entry::File { metadata, .. } => metadata,
            Entry::Directory { metadata } => metadata,
        }
    }
}

/// In-memory storage provider.
///
/// Useful for testing and development. All data is stored in memory
/// and lost on drop. Paths can be marked inaccessible with
/// [`MemoryProvider::deny_access`] to simulate permission failures.
pub struct MemoryProvider {
    storage: Arc<RwLock<HashMap<String, Entry>>>,
    denied: Arc<RwLock<HashSet<String>>>,
}

impl MemoryProvider {
    /// Create a new empty memory provider.
    pub fn new() -> Self {
        let mut storage = HashMap::new();
        storage.insert(
            "/".to_string(),
            Entry::Directory {
                metadata: Self::dir_metadata("/"),
            },
        );

        Self {
            storage: Arc::new(RwLock::new(storage)),
            denied: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make every read, write and listing of `path` fail with permission denied.
    pub fn deny_access(&self, path: &VaultPath) {
        self.denied
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::path_to_key(path));
    }

    /// Remove a file behind the vault's back, as an outside program would.
    pub fn remove_file(&self, path: &VaultPath) -> Result<()> {
        self.check_access(path)?;
        let key = Self::path_to_key(path);
        let mut storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);

        match storage.get(&key) {
            Some(Entry::File { .. }) => {
                storage.remove(&key);
                Ok(())
            }
            Some(Entry::Directory { .. }) => Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("Cannot delete directory {}", path),
            ))),
            None => Err(Error::NotFound(format!("File not found: {}", path))),
        }
    }

    fn path_to_key(path: &VaultPath) -> String {
        path.to_string_path()
    }

    fn dir_metadata(name: &str) -> Metadata {
        Metadata {
            name: name.to_string(),
            size: None,
            is_directory: true,
            modified: Utc::now(),
        }
    }

    fn check_access(&self, path: &VaultPath) -> Result<()> {
        let denied = self.denied.read().unwrap_or_else(PoisonError::into_inner);
        if denied.contains(&Self::path_to_key(path)) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Permission denied: {}", path),
            )));
        }
        Ok(())
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    async fn replace(&self, path: &VaultPath, data: Vec<u8>) -> Result<Metadata> {
        self.check_access(path)?;
        let key = Self::path_to_key(path);
        let name = path
            .name()
            .ok_or_else(|| Error::InvalidName("Cannot write to the storage root".to_string()))?;

        let mut storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);

        // Check parent exists
        if let Some(parent) = path.parent() {
            match storage.get(&Self::path_to_key(&parent)) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::Other,
                        "Parent is a file",
                    )));
                }
                None => {
                    return Err(Error::NotFound("Parent directory not found".to_string()));
                }
            }
        }

        if let Some(Entry::Directory { .. }) = storage.get(&key) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("Cannot overwrite directory {}", path),
            )));
        }

        let metadata = Metadata {
            name: name.to_string(),
            size: Some(data.len() as u64),
            is_directory: false,
            modified: Utc::now(),
        };

        storage.insert(
            key,
            Entry::File {
                data,
                metadata: metadata.clone(),
            },
        );

        Ok(metadata)
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        self.check_access(path)?;
        let storage = self.storage.read().unwrap_or_else(PoisonError::into_inner);

        match storage.get(&Self::path_to_key(path)) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "Cannot read a directory",
            ))),
            None => Err(Error::NotFound(format!("File not found: {}", path))),
        }
    }

    async fn list(&self, path: &VaultPath) -> Result<Vec<Metadata>> {
        self.check_access(path)?;
        let key = Self::path_to_key(path);
        let storage = self.storage.read().unwrap_or_else(PoisonError::into_inner);

        // Verify path is a directory
        match storage.get(&key) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "Not a directory",
                )));
            }
            None => {
                return Err(Error::NotFound(format!("Directory not found: {}", path)));
            }
        }

        let prefix = if path.is_root() {
            "/".to_string()
        } else {
            format!("{}/", key)
        };

        let results = storage
            .iter()
            .filter(|(entry_key, _)| *entry_key != &key)
            .filter_map(|(entry_key, entry)| {
                let relative = entry_key.strip_prefix(&prefix)?;
                // Only direct children
                (!relative.contains('/')).then(|| entry.metadata().clone())
            })
            .collect();

        Ok(results)
    }

    async fn create_dir(&self, path: &VaultPath) -> Result<Metadata> {
        self.check_access(path)?;
        let mut storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);

        // Walk from the root creating missing ancestors.
        let mut current = VaultPath::root();
        let mut last = Self::dir_metadata("/");
        for component in path.components() {
            current = current.join(component)?;
            let key = Self::path_to_key(&current);
            match storage.get(&key) {
                Some(Entry::Directory { metadata }) => last = metadata.clone(),
                Some(Entry::File { .. }) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("A file is in the way of directory {}", current),
                    )));
                }
                None => {
                    last = Self::dir_metadata(component);
                    storage.insert(
                        key,
                        Entry::Directory {
                            metadata: last.clone(),
                        },
                    );
                }
            }
        }

        Ok(last)
    }
}
