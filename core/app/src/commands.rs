//! Command dispatch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CommandError;
use crate::settings::Settings;
use lainvault_common::SecretString;
use lainvault_crypto::Direction;
use lainvault_vault::{
    FileFailure, TransformOutcome, TransformReport, TransformRequest, VaultManager, VaultTarget,
};

/// One request from an external client.
///
/// Unknown or misspelled argument keys are rejected.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", deny_unknown_fields)]
pub enum Command {
    RegisterProfile {
        name: String,
    },
    ListProfiles,
    ListDocuments {
        profile: String,
    },
    SaveDocument {
        profile: String,
        filename: String,
        content: String,
    },
    LoadDocument {
        profile: String,
        filename: String,
    },
    TransformVault {
        profile: String,
        #[serde(default)]
        exclusions: Vec<String>,
        key: SecretString,
        iv: SecretString,
        direction: Direction,
        /// Vault root resolved by the client instead of from the profile.
        #[serde(default, rename = "vaultDir")]
        vault_dir: Option<PathBuf>,
    },
}

impl Command {
    /// Operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterProfile { .. } => "registerProfile",
            Command::ListProfiles => "listProfiles",
            Command::ListDocuments { .. } => "listDocuments",
            Command::SaveDocument { .. } => "saveDocument",
            Command::LoadDocument { .. } => "loadDocument",
            Command::TransformVault { .. } => "transformVault",
        }
    }
}

/// Result of a transform batch as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSummary {
    pub direction: Direction,
    pub succeeded: usize,
    pub failed: Vec<FileFailure>,
    pub not_attempted: Vec<String>,
    pub outcome: TransformOutcome,
}

impl From<TransformReport> for TransformSummary {
    fn from(report: TransformReport) -> Self {
        Self {
            outcome: report.outcome(),
            direction: report.direction,
            succeeded: report.succeeded,
            failed: report.failed,
            not_attempted: report.not_attempted,
        }
    }
}

/// Successful reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Response {
    Ok,
    Saved { filename: String },
    Profiles { profiles: Vec<String> },
    Documents { documents: Vec<String> },
    Document { content: String },
    Transform(TransformSummary),
}

/// Stateless dispatcher over a [`VaultManager`].
pub struct CommandInterface {
    manager: VaultManager,
    settings: Settings,
    cancel: CancellationToken,
}

impl CommandInterface {
    /// Open the data root named by `settings` on the local filesystem.
    pub fn new(settings: Settings) -> Result<Self, CommandError> {
        let manager = VaultManager::local(&settings.data_root)?;
        Ok(Self::with_manager(manager, settings))
    }

    /// Dispatch to an existing manager.
    pub fn with_manager(manager: VaultManager, settings: Settings) -> Self {
        Self {
            manager,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops running transforms between files when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one command.
    pub async fn dispatch(&self, command: Command) -> Result<Response, CommandError> {
        let op = command.name();
        debug!(op, "Dispatching command");

        let response = match command {
            Command::RegisterProfile { name } => {
                self.register_profile(&name).await?;
                Response::Ok
            }
            Command::ListProfiles => Response::Profiles {
                profiles: self.list_profiles().await?,
            },
            Command::ListDocuments { profile } => Response::Documents {
                documents: self.list_documents(&profile).await?,
            },
            Command::SaveDocument {
                profile,
                filename,
                content,
            } => Response::Saved {
                filename: self.save_document(&profile, &filename, &content).await?,
            },
            Command::LoadDocument { profile, filename } => Response::Document {
                content: self.load_document(&profile, &filename).await?,
            },
            Command::TransformVault {
                profile,
                exclusions,
                key,
                iv,
                direction,
                vault_dir,
            } => {
                let request = TransformRequest {
                    exclusions,
                    key,
                    iv,
                    direction,
                };
                Response::Transform(self.transform_vault(&profile, request, vault_dir).await?)
            }
        };

        info!(op, "Command completed");
        Ok(response)
    }

    /// Parse one JSON command, run it, and render the reply as JSON.
    ///
    /// Failures render as `{"error": {"kind": ..., "message": ...}}`.
    pub async fn dispatch_json(&self, input: &str) -> (bool, String) {
        let result = match serde_json::from_str::<Command>(input) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => Err(CommandError::malformed(format!("Malformed command: {}", e))),
        };

        let (ok, value) = match result {
            Ok(response) => (true, serde_json::to_value(&response)),
            Err(err) => (false, serde_json::to_value(&err).map(|e| serde_json::json!({ "error": e }))),
        };
        let rendered = value
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or_else(|e| {
                serde_json::json!({ "error": CommandError::new("VaultUnavailable", e.to_string()) })
                    .to_string()
            });
        (ok, rendered)
    }

    pub async fn register_profile(&self, name: &str) -> Result<(), CommandError> {
        Ok(self.manager.register_profile(name).await?)
    }

    pub async fn list_profiles(&self) -> Result<Vec<String>, CommandError> {
        Ok(self.manager.list_profiles().await?)
    }

    /// File names of the profile's markdown documents.
    pub async fn list_documents(&self, profile: &str) -> Result<Vec<String>, CommandError> {
        let entries = self.manager.list_documents(profile).await?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Save a document and return the file name it was stored under.
    pub async fn save_document(
        &self,
        profile: &str,
        filename: &str,
        content: &str,
    ) -> Result<String, CommandError> {
        let name = self.manager.save_document(profile, filename, content).await?;
        Ok(name.as_str().to_string())
    }

    pub async fn load_document(&self, profile: &str, filename: &str) -> Result<String, CommandError> {
        Ok(self.manager.load_document(profile, filename).await?)
    }

    /// Encrypt or decrypt a profile's vault in place.
    ///
    /// The configured default exclusions are always added to the request's.
    /// When `vault_dir` is given it is used as the vault root instead of the
    /// profile's directory.
    pub async fn transform_vault(
        &self,
        profile: &str,
        mut request: TransformRequest,
        vault_dir: Option<PathBuf>,
    ) -> Result<TransformSummary, CommandError> {
        request.exclusions = self.settings.exclusions_with(&request.exclusions);
        let target = match vault_dir {
            Some(dir) => VaultTarget::Directory(dir),
            None => VaultTarget::Profile(profile.to_string()),
        };

        let report = self
            .manager
            .transform_vault(&target, &request, Some(self.cancel.child_token()))
            .await?;
        Ok(report.into())
    }
}
