//! Cryptographic primitives for Lain's Vault.
//!
//! This module provides:
//! - Normalisation of caller-supplied key and IV material to cipher sizes
//! - Authenticated encryption using XChaCha20-Poly1305 with a caller-chosen nonce
//! - Text-safe (base64) armouring of ciphertext so documents stay readable as strings
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//!
//! # Caller obligations
//! The same (key, IV) pair is reused for every file of a batch, and the
//! transform keeps no record of what is already encrypted. Encrypting twice
//! double-encrypts; decrypting plaintext fails authentication.

pub mod cipher;
pub mod keys;

pub use cipher::{open, seal, CipherParams, Direction, NONCE_SIZE, TAG_SIZE};
pub use keys::{CipherIv, CipherKey, KEY_LENGTH};
