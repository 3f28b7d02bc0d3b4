//! Bridge types shared by the shell, its background workers and collaborators.
//!
//! These types provide a stable surface for presenters and update sources,
//! hiding the orchestration internals.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Unique identifier for a workspace tab (UUID v4 string)
pub type WorkspaceId = String;

/// Unique identifier for a tile within a workspace (UUID v4 string)
pub type TileId = String;

/// Stable plugin identifier (e.g., "base-widgets", "camera-server")
pub type PluginId = String;

/// Name of a component kind contributed by a plugin (e.g., "Graph", "Camera Stream")
pub type ComponentName = String;

/// Unique identifier for one update workflow (UUID v4 string)
pub type OperationId = String;

/// Static description of a plugin instance, created by the plugin loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// Plugin identifier (validated, see `PluginRegistry::validate_plugin_id`)
    pub plugin_id: PluginId,
    /// Human readable name
    pub display_name: String,
    /// Version string as reported by the plugin
    pub version: String,
    /// Component names this plugin registers with the host
    pub components: BTreeSet<ComponentName>,
}

impl PluginDescriptor {
    pub fn new<I, S>(plugin_id: impl Into<PluginId>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ComponentName>,
    {
        let plugin_id = plugin_id.into();
        Self {
            display_name: plugin_id.clone(),
            plugin_id,
            version: "0.0.0".to_string(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `component` is one of the names this plugin registered.
    ///
    /// Exact string equality; no prefix or hierarchy matching.
    pub fn contributes(&self, component: &str) -> bool {
        self.components.contains(component)
    }
}

/// A release published by the update source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    /// Version of the release (semver string)
    pub version: String,
    /// Where the artifact can be fetched from (path or URL, source specific)
    pub artifact_location: String,
}

/// Outcome of a single version check. Produced once per check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UpdateCheckResult {
    UpToDate,
    UpdateAvailable(ReleaseInfo),
    Failed { cause: String },
}

/// A downloaded update, ready to be applied on restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedUpdate {
    pub version: String,
    pub path: PathBuf,
}

/// How a check reports its outcome to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckMode {
    /// Automatic check: only acts when an update is actually available
    Subdued,
    /// User-initiated check: every outcome is surfaced, including failures
    Explicit,
}

/// Phase of the update workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum UpdatePhase {
    Idle,
    Checking { mode: CheckMode },
    NoUpdate,
    /// A subdued check found a release and offered it without downloading
    Offered { version: String },
    Downloading { version: String },
    PromptRestart { version: String },
    Failed { message: String },
}

impl UpdatePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdatePhase::NoUpdate
                | UpdatePhase::Offered { .. }
                | UpdatePhase::PromptRestart { .. }
                | UpdatePhase::Failed { .. }
        )
    }
}

/// Returned when an update workflow was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStarted {
    pub operation_id: OperationId,
}

/// Errors surfaced by the shell core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type")]
pub enum ShellError {
    /// The update source could not determine the latest version
    #[error("Update check failed: {cause}")]
    UpdateCheckFailed { cause: String },
    /// The update artifact could not be downloaded
    #[error("Download failed: {cause}")]
    DownloadFailed { cause: String },
    /// An operation needed an open workspace but none exists
    #[error("No workspace is open")]
    NoWorkspaceOpen,
    /// An update workflow is already running
    #[error("An update check is already in progress")]
    UpdateInProgress,
    /// Invalid input parameter
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
    /// Plugin is not in the known-plugins collection
    #[error("Plugin not found: {plugin_id}")]
    PluginNotFound { plugin_id: PluginId },
    /// Plugin instance was unloaded and cannot be loaded again
    #[error("Plugin instance already unloaded: {plugin_id}")]
    PluginRetired { plugin_id: PluginId },
    /// Workspace not found by ID
    #[error("Workspace not found: {workspace_id}")]
    WorkspaceNotFound { workspace_id: WorkspaceId },
    /// IO error during file system operation
    #[error("IO error: {message}")]
    IoError { message: String },
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ShellError {
    /// Underlying cause without the variant prefix, as shown to the user.
    pub fn cause(&self) -> String {
        match self {
            ShellError::UpdateCheckFailed { cause } | ShellError::DownloadFailed { cause } => {
                cause.clone()
            }
            other => other.to_string(),
        }
    }
}
