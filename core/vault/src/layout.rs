//! On-store layout of the data root.
//!
//! ```text
//! <data root>/
//!   markdown_config.json      profile registry
//!   <encoded profile>/        one flat vault per profile
//!     notes.md
//! ```

use std::path::PathBuf;

use lainvault_common::{ProfileName, Result, VaultPath};

/// Profile registry file name in the data root.
pub const REGISTRY_FILENAME: &str = "markdown_config.json";

/// Default name of the data root directory.
pub const DEFAULT_DATA_DIRNAME: &str = "markdown_files";

/// Path of the profile registry record.
pub fn registry_path() -> Result<VaultPath> {
    VaultPath::root().join(REGISTRY_FILENAME)
}

/// Vault root for a profile.
///
/// Distinct profile names always map to distinct, non-nested roots.
pub fn vault_root(profile: &ProfileName) -> Result<VaultPath> {
    VaultPath::root().join(&profile.dir_name())
}

/// Where a vault transform should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultTarget {
    /// Resolve the vault root from the profile name.
    Profile(String),
    /// Use a vault root the caller resolved out of band.
    Directory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vault_roots_are_disjoint_from_registry() {
        let registry = registry_path().unwrap();
        for name in ["markdown_config.json", "markdown_config", "a", "A"] {
            let root = vault_root(&ProfileName::new(name).unwrap()).unwrap();
            assert_ne!(root, registry);
            assert_eq!(root.components().len(), 1);
        }
    }

    #[test]
    fn test_vault_root_is_deterministic() {
        let p = ProfileName::new("lain").unwrap();
        assert_eq!(vault_root(&p).unwrap(), vault_root(&p).unwrap());
        assert_eq!(vault_root(&p).unwrap().to_string_path(), "/lain");
    }

    proptest! {
        #[test]
        fn prop_distinct_profiles_get_distinct_roots(a in "[^\\p{Cc}]{1,16}", b in "[^\\p{Cc}]{1,16}") {
            prop_assume!(a != b);
            let ra = vault_root(&ProfileName::new(a).unwrap()).unwrap();
            let rb = vault_root(&ProfileName::new(b).unwrap()).unwrap();
            prop_assert_ne!(ra, rb);
        }
    }
}
