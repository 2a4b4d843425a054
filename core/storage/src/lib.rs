//! Storage provider abstraction for Lain's Vault.
//!
//! This module provides a trait-based interface over the place documents and
//! the profile registry live, with two backends:
//! - [`LocalProvider`]: a directory on the local filesystem
//! - [`MemoryProvider`]: an in-memory tree for tests
//!
//! # Design Principles
//! - Provider isolation: no provider-specific logic in vault or crypto modules
//! - Whole-object writes: `replace` swaps in a whole object atomically, so readers
//!   never observe a partially written file
//! - Unified error semantics: a missing object is `NotFound`, any other
//!   failure is `Io`

pub mod local;
pub mod memory;
pub mod provider;

pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use provider::{Metadata, StorageProvider};
