//! ShellPresenter trait: shell → dialog surface callback boundary.
//!
//! The shell decides *when* something becomes visible; the presenter decides
//! *how*. Implementations live on the visible-state thread and are never
//! touched by background workers, so the trait is not `Send`.

use crate::api::types::{DownloadedUpdate, ReleaseInfo};

/// Dialog surface driven by the shell.
pub trait ShellPresenter {
    /// Show the download progress dialog.
    fn show_download_progress(&mut self);

    /// Update the value displayed by the progress dialog (0.0 - 1.0).
    fn set_download_progress(&mut self, value: f64);

    /// Retire the progress dialog. Called even if it was never shown.
    fn close_download_progress(&mut self);

    /// Offer to restart the application to apply a downloaded update.
    fn prompt_restart(&mut self, update: &DownloadedUpdate);

    /// Surface an update failure. `cause` is the original error message.
    fn show_update_failure(&mut self, cause: &str);

    /// Tell the user the running version is the latest.
    fn show_up_to_date(&mut self);

    /// Show the unobtrusive footer offering to install `release`.
    fn show_update_footer(&mut self, release: &ReleaseInfo);
}

/// Presenter that only writes to the log. Used by the headless binary.
#[derive(Debug, Default)]
pub struct LogPresenter {
    last_logged_percent: Option<u32>,
}

impl ShellPresenter for LogPresenter {
    fn show_download_progress(&mut self) {
        log::info!("Downloading update...");
    }

    fn set_download_progress(&mut self, value: f64) {
        let percent = (value * 100.0).round() as u32;
        // Only log whole-percent changes
        if self.last_logged_percent != Some(percent) {
            self.last_logged_percent = Some(percent);
            log::info!("Download progress: {percent}%");
        }
    }

    fn close_download_progress(&mut self) {
        self.last_logged_percent = None;
        log::debug!("Download progress closed");
    }

    fn prompt_restart(&mut self, update: &DownloadedUpdate) {
        log::info!(
            "Update {} downloaded to {}; restart to apply",
            update.version,
            update.path.display()
        );
    }

    fn show_update_failure(&mut self, cause: &str) {
        log::error!("Update failed: {cause}");
    }

    fn show_up_to_date(&mut self) {
        log::info!("No update available");
    }

    fn show_update_footer(&mut self, release: &ReleaseInfo) {
        log::info!("Update available: version={}", release.version);
    }
}
