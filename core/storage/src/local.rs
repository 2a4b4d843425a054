//! Directory-backed storage: the data root and explicit vault directories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::provider::{Metadata, StorageProvider};
use lainvault_common::{Error, Result, VaultPath};

/// Stores objects as plain files under `root`.
///
/// A [`VaultPath`] maps component by component onto the directory tree.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Open `root`, creating it and its parents if needed.
    ///
    /// # Postconditions
    /// - `root` exists as a directory
    ///
    /// # Errors
    /// - Permission denied or a file in the way of the root
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    fn to_fs_path(&self, path: &VaultPath) -> PathBuf {
        let mut fs_path = self.root.clone();
        for component in path.components() {
            fs_path.push(component);
        }
        fs_path
    }

    /// Listing entry for `name`; falls back to now when mtime is unsupported.
    fn create_metadata(name: &str, fs_meta: &std::fs::Metadata) -> Metadata {
        let modified: DateTime<Utc> = fs_meta
            .modified()
            .map(|t| t.into())
            .unwrap_or_else(|_| Utc::now());

        Metadata {
            name: name.to_string(),
            size: if fs_meta.is_file() {
                Some(fs_meta.len())
            } else {
                None
            },
            is_directory: fs_meta.is_dir(),
            modified,
        }
    }
}

/// Map a filesystem error, keeping "missing" distinct from other failures.
fn map_io(err: io::Error, what: &VaultPath) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(format!("Path not found: {}", what))
    } else {
        Error::Io(err)
    }
}

/// Write `data` to `path` and flush it to disk before returning.
async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Move a fully written temp file over `destination`.
///
/// `rename` replaces atomically here, so a failure leaves the old content in
/// place and the temp file is dropped.
#[cfg(unix)]
async fn replace_with(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(temp_path, destination).await {
        let _ = fs::remove_file(temp_path).await;
        return Err(e);
    }
    Ok(())
}

/// Move a fully written temp file over `destination`.
///
/// Rename may refuse to overwrite on these platforms, so the destination is
/// removed and the rename retried. If the retry fails too, the temp file is
/// kept because it then holds the only copy of the content.
#[cfg(not(unix))]
async fn replace_with(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination).await {
        let _ = fs::remove_file(destination).await;
        if let Err(retry_err) = fs::rename(temp_path, destination).await {
            return Err(io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {}); content kept at {}",
                    initial_err,
                    retry_err,
                    temp_path.display()
                ),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl StorageProvider for LocalProvider {
    fn local_path(&self, path: &VaultPath) -> Option<PathBuf> {
        Some(self.to_fs_path(path))
    }

    async fn replace(&self, path: &VaultPath, data: Vec<u8>) -> Result<Metadata> {
        let name = path
            .name()
            .ok_or_else(|| Error::InvalidName("Cannot write to the storage root".to_string()))?;
        let fs_path = self.to_fs_path(path);
        let parent = fs_path
            .parent()
            .ok_or_else(|| Error::InvalidName(format!("No parent for {}", path)))?;

        if !parent.is_dir() {
            return Err(Error::NotFound("Parent directory not found".to_string()));
        }
        if fs_path.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("Cannot overwrite directory {}", path),
            )));
        }

        // Stage next to the destination so the final rename stays on one
        // filesystem. The temp name has a fixed length so any name that fits
        // the directory also has a temp name that fits.
        let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::Io(e));
        }
        replace_with(&temp_path, &fs_path).await?;

        debug!(path = %path, size = data.len(), "Object written");

        let fs_meta = fs::metadata(&fs_path).await?;
        Ok(Self::create_metadata(name, &fs_meta))
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        let fs_path = self.to_fs_path(path);
        fs::read(&fs_path).await.map_err(|e| map_io(e, path))
    }

    async fn list(&self, path: &VaultPath) -> Result<Vec<Metadata>> {
        let fs_path = self.to_fs_path(path);
        let mut entries = fs::read_dir(&fs_path).await.map_err(|e| map_io(e, path))?;

        let mut results = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() && !file_type.is_dir() {
                debug!(entry = ?entry.path(), "Skipping non-regular entry");
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(String::from) else {
                warn!(entry = ?entry.path(), "Skipping entry with non UTF-8 name");
                continue;
            };

            let fs_meta = entry.metadata().await?;
            results.push(Self::create_metadata(&name, &fs_meta));
        }

        Ok(results)
    }

    async fn create_dir(&self, path: &VaultPath) -> Result<Metadata> {
        let fs_path = self.to_fs_path(path);

        match fs::metadata(&fs_path).await {
            Ok(meta) if meta.is_dir() => {
                return Ok(Self::create_metadata(path.name().unwrap_or("/"), &meta));
            }
            Ok(_) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("A file is in the way of directory {}", path),
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        fs::create_dir_all(&fs_path).await?;

        let fs_meta = fs::metadata(&fs_path).await?;
        Ok(Self::create_metadata(path.name().unwrap_or("/"), &fs_meta))
    }
}
