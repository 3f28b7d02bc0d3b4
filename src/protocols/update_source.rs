//! UpdateSource trait: orchestrator → update provider abstraction boundary.
//!
//! The orchestrator drives the workflow without knowing where releases come
//! from or how artifacts are transferred.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::api::types::{ReleaseInfo, ShellError, UpdateCheckResult};
use crate::runtime::progress::ProgressReporter;

/// Abstract interface for a source of application updates.
///
/// Implemented by concrete providers (e.g., `ManifestUpdateSource`).
/// Methods run on the background context and may take arbitrarily long.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Determine whether a version newer than the running one exists.
    ///
    /// Failures are reported as `UpdateCheckResult::Failed`, not as `Err`.
    async fn check_latest_version(&self) -> UpdateCheckResult;

    /// Fetch the artifact for `release`, reporting progress in `[0, 1]`.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Where the downloaded artifact was stored
    /// * `Err(ShellError::DownloadFailed)` - Transfer failed
    async fn download(
        &self,
        release: &ReleaseInfo,
        progress: ProgressReporter<'_>,
    ) -> Result<PathBuf, ShellError>;
}
