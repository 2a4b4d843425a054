//! Per-profile vault manager for Lain's Vault.
//!
//! This module provides:
//! - The profile registry, persisted apart from document content
//! - The vault manifest, derived from storage on every call
//! - The document store, with validated names and atomic saves
//! - The encryption engine, a partial-failure-aware batch transform
//!
//! # Architecture
//! [`VaultManager`] resolves a profile name to its vault root and dispatches
//! to the component that owns the operation. It holds no notion of an
//! "active" profile; callers pass the profile on every call.

pub mod documents;
pub mod engine;
pub mod layout;
pub mod locks;
pub mod manager;
pub mod manifest;
pub mod profiles;

pub use documents::DocumentStore;
pub use engine::{EncryptionEngine, FileFailure, TransformOutcome, TransformReport, TransformRequest};
pub use layout::{VaultTarget, DEFAULT_DATA_DIRNAME, REGISTRY_FILENAME};
pub use locks::VaultLocks;
pub use manager::VaultManager;
pub use manifest::{DocumentEntry, VaultManifest};
pub use profiles::ProfileRegistry;
