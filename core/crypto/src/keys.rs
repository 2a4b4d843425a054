//! Key types with secure memory handling.
//!
//! Keys and IVs arrive as opaque caller text of any length. They are
//! normalised to the cipher's sizes with BLAKE2b under distinct domain
//! labels. This is a length adapter, not a password KDF: weak input stays weak.

use blake2::digest::consts::{U24, U32};
use blake2::{Blake2b, Digest};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::NONCE_SIZE;
use lainvault_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

const KEY_DOMAIN: &[u8] = b"lainvault/key/v1";
const IV_DOMAIN: &[u8] = b"lainvault/iv/v1";

/// Cipher key derived from caller key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    key: [u8; KEY_LENGTH],
}

impl CipherKey {
    /// Normalise caller key material to a 256-bit key.
    ///
    /// # Errors
    /// - `InvalidParameters` if `material` is empty
    pub fn from_material(material: &[u8]) -> Result<Self> {
        if material.is_empty() {
            return Err(Error::InvalidParameters(
                "Encryption key cannot be empty".to_string(),
            ));
        }

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(KEY_DOMAIN);
        hasher.update(material);

        let result = hasher.finalize();
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&result);
        Ok(Self { key })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey([REDACTED])")
    }
}

/// Nonce derived from caller IV material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherIv {
    iv: [u8; NONCE_SIZE],
}

impl CipherIv {
    /// Normalise caller IV material to a 192-bit nonce.
    ///
    /// # Errors
    /// - `InvalidParameters` if `material` is empty
    pub fn from_material(material: &[u8]) -> Result<Self> {
        if material.is_empty() {
            return Err(Error::InvalidParameters(
                "Initialization vector cannot be empty".to_string(),
            ));
        }

        let mut hasher = Blake2b::<U24>::new();
        hasher.update(IV_DOMAIN);
        hasher.update(material);

        let result = hasher.finalize();
        let mut iv = [0u8; NONCE_SIZE];
        iv.copy_from_slice(&result);
        Ok(Self { iv })
    }

    /// Get the nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.iv
    }
}

impl fmt::Debug for CipherIv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherIv([REDACTED])")
    }
}
