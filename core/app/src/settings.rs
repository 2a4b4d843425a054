//! Runtime settings.

use std::path::PathBuf;

use lainvault_common::{Error, Result};
use lainvault_vault::{DEFAULT_DATA_DIRNAME, REGISTRY_FILENAME};

/// Environment variable overriding the data root.
pub const ROOT_ENV: &str = "LAINVAULT_ROOT";

const APP_DIRNAME: &str = "lainvault";

/// Where data lives and which files a transform always skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the profile registry and every profile's vault.
    pub data_root: PathBuf,
    /// File names excluded from every transform in addition to the caller's.
    pub default_exclusions: Vec<String>,
}

impl Settings {
    /// Settings rooted at `data_root` with the default exclusions.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            default_exclusions: vec![REGISTRY_FILENAME.to_string()],
        }
    }

    /// Use `data_root` if given, otherwise the platform data directory.
    ///
    /// # Errors
    /// - `StorageUnavailable` if no override is given and the platform has no
    ///   data directory
    pub fn resolve(data_root: Option<PathBuf>) -> Result<Self> {
        match data_root {
            Some(root) => Ok(Self::new(root)),
            None => Ok(Self::new(Self::default_data_root()?)),
        }
    }

    /// `<platform data dir>/lainvault/markdown_files`.
    pub fn default_data_root() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIRNAME).join(DEFAULT_DATA_DIRNAME))
            .ok_or_else(|| {
                Error::StorageUnavailable("No platform data directory available".to_string())
            })
    }

    /// Caller exclusions merged with the defaults, without duplicates.
    pub fn exclusions_with(&self, extra: &[String]) -> Vec<String> {
        let mut merged = self.default_exclusions.clone();
        for name in extra {
            if !merged.contains(name) {
                merged.push(name.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let settings = Settings::resolve(Some(PathBuf::from("/tmp/wired"))).unwrap();
        assert_eq!(settings.data_root, PathBuf::from("/tmp/wired"));
        assert_eq!(settings.default_exclusions, vec!["markdown_config.json"]);
    }

    #[test]
    fn test_exclusions_are_merged_once() {
        let settings = Settings::new("/tmp/wired");
        let merged = settings.exclusions_with(&[
            "notes.json".to_string(),
            "markdown_config.json".to_string(),
        ]);
        assert_eq!(merged, vec!["markdown_config.json", "notes.json"]);
    }
}
