//! Authenticated encryption using XChaCha20-Poly1305 with a supplied nonce.
//!
//! Ciphertext is stored as standard base64 text so an encrypted document is
//! still valid UTF-8 and loads through the ordinary document path.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    XChaCha20Poly1305,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::{CipherIv, CipherKey, KEY_LENGTH};
use lainvault_common::{Error, Result, SecretString};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Direction of a vault transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Plaintext to armoured ciphertext.
    Encrypt,
    /// Armoured ciphertext to plaintext.
    Decrypt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => write!(f, "encrypt"),
            Direction::Decrypt => write!(f, "decrypt"),
        }
    }
}

/// Encrypt plaintext with a specific nonce.
///
/// # Warning
/// Reusing a nonce with the same key leaks the XOR of the plaintexts and
/// weakens authentication. The vault transform does exactly that across the
/// files of one batch; callers that need stronger guarantees must vary the IV.
///
/// # Postconditions
/// - Returns ciphertext || tag, `plaintext.len() + TAG_SIZE` bytes
pub fn seal(key: &[u8], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));
    let nonce_array = GenericArray::from_slice(nonce);

    cipher
        .encrypt(nonce_array, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))
}

/// Decrypt ciphertext with a specific nonce.
///
/// # Errors
/// - Ciphertext shorter than the tag
/// - Authentication failure (wrong key or IV, tampered or not encrypted)
pub fn open(key: &[u8], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(Error::Crypto("Ciphertext too short".to_string()));
    }

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));
    let nonce_array = GenericArray::from_slice(nonce);

    cipher
        .decrypt(nonce_array, ciphertext)
        .map_err(|_| Error::Crypto("Decryption failed: wrong key or IV, or data is not encrypted".to_string()))
}

/// Validated (key, IV) pair for one transform invocation.
///
/// Never persisted; the derived material zeroizes on drop.
#[derive(Debug, Clone)]
pub struct CipherParams {
    key: CipherKey,
    iv: CipherIv,
}

impl CipherParams {
    /// Validate and normalise caller key and IV.
    ///
    /// # Errors
    /// - `InvalidParameters` if either the key or the IV is empty; both are
    ///   checked before any derivation work
    pub fn new(key: &SecretString, iv: &SecretString) -> Result<Self> {
        match (key.is_empty(), iv.is_empty()) {
            (true, true) => {
                return Err(Error::InvalidParameters(
                    "Encryption key and initialization vector are required".to_string(),
                ))
            }
            (true, false) => {
                return Err(Error::InvalidParameters(
                    "Encryption key is required".to_string(),
                ))
            }
            (false, true) => {
                return Err(Error::InvalidParameters(
                    "Initialization vector is required".to_string(),
                ))
            }
            (false, false) => {}
        }

        Ok(Self {
            key: CipherKey::from_material(key.expose().as_bytes())?,
            iv: CipherIv::from_material(iv.expose().as_bytes())?,
        })
    }

    /// Encrypt raw bytes into base64 ciphertext text.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let sealed = seal(self.key.as_bytes(), self.iv.as_bytes(), plaintext)?;
        Ok(STANDARD.encode(sealed).into_bytes())
    }

    /// Decrypt base64 ciphertext text back into raw bytes.
    ///
    /// Surrounding ASCII whitespace (e.g. a trailing newline added by an
    /// editor) is ignored.
    pub fn decrypt(&self, armoured: &[u8]) -> Result<Vec<u8>> {
        let trimmed = armoured.trim_ascii();
        let sealed = STANDARD
            .decode(trimmed)
            .map_err(|e| Error::Crypto(format!("Content is not encrypted text: {}", e)))?;
        open(self.key.as_bytes(), self.iv.as_bytes(), &sealed)
    }

    /// Apply the transform in the requested direction.
    pub fn apply(&self, direction: Direction, input: &[u8]) -> Result<Vec<u8>> {
        match direction {
            Direction::Encrypt => self.encrypt(input),
            Direction::Decrypt => self.decrypt(input),
        }
    }
}
