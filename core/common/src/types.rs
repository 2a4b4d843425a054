//! Common types used throughout Lain's Vault.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Suffix every stored document carries.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Longest file name most filesystems accept, in bytes.
const MAX_NAME_BYTES: usize = 255;

/// Bytes that are percent-encoded when turning a profile name into a directory name.
///
/// Upper-case letters are encoded too so that the result stays unique on
/// case-insensitive filesystems.
const PROFILE_DIR_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .add(b'A')
    .add(b'B')
    .add(b'C')
    .add(b'D')
    .add(b'E')
    .add(b'F')
    .add(b'G')
    .add(b'H')
    .add(b'I')
    .add(b'J')
    .add(b'K')
    .add(b'L')
    .add(b'M')
    .add(b'N')
    .add(b'O')
    .add(b'P')
    .add(b'Q')
    .add(b'R')
    .add(b'S')
    .add(b'T')
    .add(b'U')
    .add(b'V')
    .add(b'W')
    .add(b'X')
    .add(b'Y')
    .add(b'Z');

/// Name of a profile, the namespace that owns one vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileName(String);

impl ProfileName {
    /// Create a new ProfileName from a string.
    ///
    /// # Preconditions
    /// - `name` must be non-empty
    /// - `name` must not contain control characters
    /// - the encoded directory name must fit in one path component
    ///
    /// # Errors
    /// - Returns `InvalidName` if a precondition is violated
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidName(
                "Profile name cannot be empty".to_string(),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(crate::Error::InvalidName(
                "Profile name cannot contain control characters".to_string(),
            ));
        }

        let profile = Self(name);
        if profile.dir_name().len() > MAX_NAME_BYTES {
            return Err(crate::Error::InvalidName(format!(
                "Profile name is too long once encoded for the filesystem (limit {} bytes)",
                MAX_NAME_BYTES
            )));
        }
        Ok(profile)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe directory name for this profile's vault.
    ///
    /// The mapping is injective, so two different profiles never share a
    /// vault root, and the output never contains `.` or a path separator.
    pub fn dir_name(&self) -> String {
        utf8_percent_encode(&self.0, PROFILE_DIR_SET).to_string()
    }
}

impl TryFrom<String> for ProfileName {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<ProfileName> for String {
    fn from(name: ProfileName) -> Self {
        name.0
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated markdown document file name.
///
/// Always ends in [`MARKDOWN_EXTENSION`]; a name given without it gets the
/// suffix appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentName(String);

impl DocumentName {
    /// Validate a caller-supplied file name and enforce the markdown suffix.
    ///
    /// # Errors
    /// - `InvalidName` if the name is empty, `.` or `..`, contains a path
    ///   separator or control character, or is too long
    pub fn parse(raw: &str) -> crate::Result<Self> {
        if raw.trim().is_empty() {
            return Err(crate::Error::InvalidName(
                "Document name cannot be empty".to_string(),
            ));
        }
        if raw == "." || raw == ".." {
            return Err(crate::Error::InvalidName(format!(
                "Document name cannot be '{}'",
                raw
            )));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(crate::Error::InvalidName(
                "Document name cannot contain path separators".to_string(),
            ));
        }
        if raw.chars().any(char::is_control) {
            return Err(crate::Error::InvalidName(
                "Document name cannot contain control characters".to_string(),
            ));
        }

        let name = if raw.ends_with(MARKDOWN_EXTENSION) {
            if raw.len() == MARKDOWN_EXTENSION.len() {
                return Err(crate::Error::InvalidName(
                    "Document name needs a base name before the extension".to_string(),
                ));
            }
            raw.to_string()
        } else {
            format!("{}{}", raw, MARKDOWN_EXTENSION)
        };

        if name.len() > MAX_NAME_BYTES {
            return Err(crate::Error::InvalidName(format!(
                "Document name exceeds {} bytes",
                MAX_NAME_BYTES
            )));
        }

        Ok(Self(name))
    }

    /// Whether a stored file name follows the markdown convention.
    pub fn is_markdown(file_name: &str) -> bool {
        file_name.len() > MARKDOWN_EXTENSION.len() && file_name.ends_with(MARKDOWN_EXTENSION)
    }

    /// Full file name, including the extension.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path within the data root, independent of underlying storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultPath {
    components: Vec<String>,
}

impl VaultPath {
    /// Create a root path.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a path from string components.
    ///
    /// # Preconditions
    /// - Components must not contain path separators
    /// - Components must not be empty strings, `.` or `..`
    ///
    /// # Errors
    /// - Returns error if any component is invalid
    pub fn from_components(components: Vec<String>) -> crate::Result<Self> {
        for comp in &components {
            Self::check_component(comp)?;
        }
        Ok(Self { components })
    }

    /// Parse a path string into VaultPath.
    ///
    /// Uses '/' as separator.
    pub fn parse(path: &str) -> crate::Result<Self> {
        let path = path.trim_start_matches('/').trim_end_matches('/');
        if path.is_empty() {
            return Ok(Self::root());
        }

        let components: Vec<String> = path.split('/').map(String::from).collect();
        Self::from_components(components)
    }

    fn check_component(comp: &str) -> crate::Result<()> {
        if comp.is_empty() {
            return Err(crate::Error::InvalidName(
                "Path component cannot be empty".to_string(),
            ));
        }
        if comp == "." || comp == ".." {
            return Err(crate::Error::InvalidName(
                "Path component cannot be a relative reference".to_string(),
            ));
        }
        if comp.contains('/') || comp.contains('\\') {
            return Err(crate::Error::InvalidName(
                "Path component cannot contain separators".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the parent path, if any.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let mut components = self.components.clone();
            components.pop();
            Some(Self { components })
        }
    }

    /// Get the file/directory name (last component).
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|s| s.as_str())
    }

    /// Join this path with a child component.
    pub fn join(&self, child: &str) -> crate::Result<Self> {
        Self::check_component(child)?;
        let mut components = self.components.clone();
        components.push(child.to_string());
        Ok(Self { components })
    }

    /// Get the path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Convert to a string representation.
    pub fn to_string_path(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("/{}", self.components.join("/"))
        }
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_path())
    }
}

/// Secret text (key or IV material) that zeroizes on drop and never prints.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap secret text.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret. Use immediately and do not store.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}
