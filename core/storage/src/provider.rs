//! The storage seam shared by the registry, the document store and the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use lainvault_common::{Result, VaultPath};

/// What a listing reports about one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Entry name, without its parent path.
    pub name: String,
    /// Byte length; `None` for directories.
    pub size: Option<u64>,
    pub is_directory: bool,
    pub modified: DateTime<Utc>,
}

impl Metadata {
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}

/// Whole-value object store addressed by [`VaultPath`].
///
/// Documents are small, so every read and write moves the full content.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Filesystem location backing `path`, for providers that have one.
    fn local_path(&self, _path: &VaultPath) -> Option<PathBuf> {
        None
    }

    /// Read the full content stored at `path`.
    ///
    /// # Errors
    /// - `NotFound` if nothing is stored at `path`
    /// - `Io` for any other failure, including `path` being a directory
    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>>;

    /// Store `data` at `path`, swapping out any previous content in one step.
    ///
    /// A reader running at the same time sees the old content or the new
    /// content, never a truncated mix. The parent directory must exist.
    ///
    /// # Errors
    /// - `NotFound` if the parent directory is missing
    /// - `Io` if `path` is a directory or the write fails
    async fn replace(&self, path: &VaultPath, data: Vec<u8>) -> Result<Metadata>;

    /// Direct children of the directory at `path`, in no particular order.
    ///
    /// # Errors
    /// - `NotFound` if the directory does not exist
    /// - `Io` if `path` is a file or cannot be read
    async fn list(&self, path: &VaultPath) -> Result<Vec<Metadata>>;

    /// Make sure a directory exists at `path`, creating missing ancestors.
    ///
    /// Calling it on an existing directory changes nothing. A file in the way
    /// is an `Io` error.
    async fn create_dir(&self, path: &VaultPath) -> Result<Metadata>;
}
