//! ManifestUpdateSource - UpdateSource backed by a JSON release manifest on disk.
//!
//! The manifest names the latest version and where its artifact lives:
//!
//! ```json
//! { "version": "1.4.0", "artifact": "dashboard-1.4.0.bin" }
//! ```
//!
//! Relative artifact paths are resolved against the manifest's directory.
//! Downloading copies the artifact into the download directory in chunks,
//! reporting progress after each chunk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::api::types::{ReleaseInfo, ShellError, UpdateCheckResult};
use crate::protocols::update_source::UpdateSource;
use crate::runtime::progress::ProgressReporter;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Highest value reported while copying. Completion is signalled by the
/// caller once the artifact is on disk.
const MAX_COPY_PROGRESS: f64 = 0.99;

/// Release manifest as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    /// Latest published version (semver)
    pub version: String,
    /// Artifact location, absolute or relative to the manifest
    pub artifact: String,
    /// Optional release notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Update source reading a local manifest file.
#[derive(Debug, Clone)]
pub struct ManifestUpdateSource {
    manifest_path: PathBuf,
    current_version: Version,
    download_dir: PathBuf,
    chunk_size: usize,
}

impl ManifestUpdateSource {
    /// # Errors
    /// * `ShellError::Config` - If `current_version` is not valid semver
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        current_version: &str,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self, ShellError> {
        let current_version = Version::parse(current_version).map_err(|e| ShellError::Config {
            message: format!("Invalid current version '{current_version}': {e}"),
        })?;

        Ok(Self {
            manifest_path: manifest_path.into(),
            current_version,
            download_dir: download_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Copy granularity; smaller chunks mean more progress reports.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    async fn read_manifest(&self) -> Result<UpdateManifest, ShellError> {
        let content = tokio::fs::read_to_string(&self.manifest_path)
            .await
            .map_err(|e| ShellError::UpdateCheckFailed {
                cause: format!(
                    "Failed to read update manifest '{}': {e}",
                    self.manifest_path.display()
                ),
            })?;

        serde_json::from_str(&content).map_err(|e| ShellError::UpdateCheckFailed {
            cause: format!("Failed to parse update manifest: {e}"),
        })
    }

    fn resolve_artifact(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.manifest_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }

    async fn copy_with_progress(
        &self,
        source: &Path,
        destination: &Path,
        progress: ProgressReporter<'_>,
    ) -> std::io::Result<()> {
        let mut reader = tokio::fs::File::open(source).await?;
        let total = reader.metadata().await?.len();
        let mut writer = tokio::fs::File::create(destination).await?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut copied: u64 = 0;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).await?;
            copied += n as u64;
            if total > 0 {
                progress.report((copied as f64 / total as f64).min(MAX_COPY_PROGRESS));
            }
        }
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for ManifestUpdateSource {
    async fn check_latest_version(&self) -> UpdateCheckResult {
        let manifest = match self.read_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("Update manifest unavailable: {e}");
                return UpdateCheckResult::Failed { cause: e.cause() };
            }
        };

        let latest = match Version::parse(&manifest.version) {
            Ok(version) => version,
            Err(e) => {
                return UpdateCheckResult::Failed {
                    cause: format!("Invalid version '{}' in manifest: {e}", manifest.version),
                }
            }
        };

        log::debug!(
            "Update manifest read: current={}, latest={latest}",
            self.current_version
        );

        if latest > self.current_version {
            let artifact = self.resolve_artifact(&manifest.artifact);
            UpdateCheckResult::UpdateAvailable(ReleaseInfo {
                version: latest.to_string(),
                artifact_location: artifact.display().to_string(),
            })
        } else {
            UpdateCheckResult::UpToDate
        }
    }

    async fn download(
        &self,
        release: &ReleaseInfo,
        progress: ProgressReporter<'_>,
    ) -> Result<PathBuf, ShellError> {
        let source = PathBuf::from(&release.artifact_location);
        let file_name = source
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| ShellError::DownloadFailed {
                cause: format!(
                    "Artifact location has no file name: {}",
                    release.artifact_location
                ),
            })?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| ShellError::DownloadFailed {
                cause: format!(
                    "Failed to create download directory '{}': {e}",
                    self.download_dir.display()
                ),
            })?;

        let destination = self.download_dir.join(file_name);
        log::info!(
            "Downloading update: version={}, from={}, to={}",
            release.version,
            source.display(),
            destination.display()
        );

        if let Err(e) = self.copy_with_progress(&source, &destination, progress).await {
            // Leave no partial artifact behind
            let _ = tokio::fs::remove_file(&destination).await;
            return Err(ShellError::DownloadFailed {
                cause: format!("Failed to copy artifact '{}': {e}", source.display()),
            });
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::progress::{progress_channel, ProgressEvent};

    fn write_manifest(dir: &Path, version: &str, artifact: &str) -> PathBuf {
        let path = dir.join("latest.json");
        let manifest = UpdateManifest {
            version: version.to_string(),
            artifact: artifact.to_string(),
            notes: None,
        };
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_new_rejects_invalid_current_version() {
        let result = ManifestUpdateSource::new("latest.json", "not-a-version", "downloads");
        assert!(matches!(result, Err(ShellError::Config { .. })));
    }

    #[tokio::test]
    async fn test_check_finds_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "1.5.0", "app-1.5.0.bin");
        let source = ManifestUpdateSource::new(manifest, "1.4.2", dir.path().join("dl")).unwrap();

        match source.check_latest_version().await {
            UpdateCheckResult::UpdateAvailable(release) => {
                assert_eq!(release.version, "1.5.0");
                assert!(release.artifact_location.ends_with("app-1.5.0.bin"));
            }
            other => panic!("Expected UpdateAvailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_same_or_older_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "1.4.2", "app.bin");
        let source = ManifestUpdateSource::new(&manifest, "1.4.2", dir.path()).unwrap();
        assert_eq!(source.check_latest_version().await, UpdateCheckResult::UpToDate);

        let source = ManifestUpdateSource::new(&manifest, "2.0.0", dir.path()).unwrap();
        assert_eq!(source.check_latest_version().await, UpdateCheckResult::UpToDate);
    }

    #[tokio::test]
    async fn test_check_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            ManifestUpdateSource::new(dir.path().join("missing.json"), "1.0.0", dir.path())
                .unwrap();

        match source.check_latest_version().await {
            UpdateCheckResult::Failed { cause } => {
                assert!(cause.contains("Failed to read update manifest"));
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_invalid_remote_version_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "latest", "app.bin");
        let source = ManifestUpdateSource::new(manifest, "1.0.0", dir.path()).unwrap();

        assert!(matches!(
            source.check_latest_version().await,
            UpdateCheckResult::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_download_copies_artifact_with_progress() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![7u8; 10_000];
        std::fs::write(dir.path().join("app.bin"), &payload).unwrap();
        let manifest = write_manifest(dir.path(), "2.0.0", "app.bin");
        let source = ManifestUpdateSource::new(manifest, "1.0.0", dir.path().join("dl"))
            .unwrap()
            .with_chunk_size(1024);

        let release = match source.check_latest_version().await {
            UpdateCheckResult::UpdateAvailable(release) => release,
            other => panic!("Expected UpdateAvailable, got {other:?}"),
        };

        let (tx, mut rx) = progress_channel();
        let path = source.download(&release, tx.reporter()).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), payload);
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(events, vec![ProgressEvent::Progress(MAX_COPY_PROGRESS)]);
    }

    #[tokio::test]
    async fn test_download_leaves_completion_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.bin"), [1u8; 64]).unwrap();
        let manifest = write_manifest(dir.path(), "2.0.0", "app.bin");
        let source = ManifestUpdateSource::new(manifest, "1.0.0", dir.path().join("dl"))
            .unwrap()
            .with_chunk_size(64);
        let release = ReleaseInfo {
            version: "2.0.0".to_string(),
            artifact_location: dir.path().join("app.bin").display().to_string(),
        };

        let (tx, mut rx) = progress_channel();
        source.download(&release, tx.reporter()).await.unwrap();

        assert!(!tx.is_finished());
        tx.complete();
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Progress(MAX_COPY_PROGRESS),
                ProgressEvent::Completed
            ]
        );
    }

    #[tokio::test]
    async fn test_download_empty_artifact_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.bin"), b"").unwrap();
        let manifest = write_manifest(dir.path(), "2.0.0", "empty.bin");
        let source = ManifestUpdateSource::new(manifest, "1.0.0", dir.path().join("dl")).unwrap();
        let release = ReleaseInfo {
            version: "2.0.0".to_string(),
            artifact_location: dir.path().join("empty.bin").display().to_string(),
        };

        let (tx, mut rx) = progress_channel();
        source.download(&release, tx.reporter()).await.unwrap();

        assert!(!tx.is_finished());
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn test_download_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = ManifestUpdateSource::new(
            dir.path().join("latest.json"),
            "1.0.0",
            dir.path().join("dl"),
        )
        .unwrap();
        let release = ReleaseInfo {
            version: "2.0.0".to_string(),
            artifact_location: dir.path().join("gone.bin").display().to_string(),
        };

        let (tx, _rx) = progress_channel();
        let result = source.download(&release, tx.reporter()).await;

        assert!(matches!(result, Err(ShellError::DownloadFailed { .. })));
        assert!(!dir.path().join("dl").join("gone.bin").exists());
    }
}
