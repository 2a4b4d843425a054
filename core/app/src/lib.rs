//! Command interface for Lain's Vault.
//!
//! This crate is the boundary an external client talks to. Every call names
//! the profile it acts on; nothing about the caller's identity is held here.

pub mod commands;
pub mod error;
pub mod settings;

pub use commands::{Command, CommandInterface, Response, TransformSummary};
pub use error::CommandError;
pub use settings::{Settings, ROOT_ENV};
