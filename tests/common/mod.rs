#![allow(dead_code)]

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use dashboard_shell::api::types::{
    DownloadedUpdate, PluginDescriptor, ReleaseInfo, ShellError, UpdateCheckResult,
};
use dashboard_shell::plugins::registry::PluginRegistry;
use dashboard_shell::protocols::{ShellPresenter, UpdateSource};
use dashboard_shell::runtime::progress::ProgressReporter;
use dashboard_shell::Shell;

/// Presenter that records every call as a short string.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn push(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ShellPresenter for Recorder {
    fn show_download_progress(&mut self) {
        self.push("show".to_string());
    }

    fn set_download_progress(&mut self, value: f64) {
        self.push(format!("set {value}"));
    }

    fn close_download_progress(&mut self) {
        self.push("close".to_string());
    }

    fn prompt_restart(&mut self, update: &DownloadedUpdate) {
        self.push(format!("restart {}", update.version));
    }

    fn show_update_failure(&mut self, cause: &str) {
        self.push(format!("failure {cause}"));
    }

    fn show_up_to_date(&mut self) {
        self.push("up-to-date".to_string());
    }

    fn show_update_footer(&mut self, release: &ReleaseInfo) {
        self.push(format!("footer {}", release.version));
    }
}

pub fn release(version: &str) -> ReleaseInfo {
    ReleaseInfo {
        version: version.to_string(),
        artifact_location: format!("releases/{version}.bin"),
    }
}

/// Update source answering with a fixed check result and download script.
pub struct FakeSource {
    pub check: UpdateCheckResult,
    /// Values reported before `pause` is honoured
    pub before_pause: Vec<f64>,
    /// Values reported after resuming
    pub after_pause: Vec<f64>,
    pub pause: Option<(Arc<Notify>, Arc<Notify>)>,
    pub download: Result<PathBuf, ShellError>,
}

impl FakeSource {
    pub fn new(check: UpdateCheckResult) -> Self {
        Self {
            check,
            before_pause: Vec::new(),
            after_pause: Vec::new(),
            pause: None,
            download: Ok(PathBuf::from("/tmp/dashboard-update.bin")),
        }
    }
}

#[async_trait]
impl UpdateSource for FakeSource {
    async fn check_latest_version(&self) -> UpdateCheckResult {
        self.check.clone()
    }

    async fn download(
        &self,
        _release: &ReleaseInfo,
        progress: ProgressReporter<'_>,
    ) -> Result<PathBuf, ShellError> {
        for value in &self.before_pause {
            progress.report(*value);
        }
        if let Some((reported, resume)) = &self.pause {
            reported.notify_one();
            resume.notified().await;
        }
        for value in &self.after_pause {
            progress.report(*value);
        }
        self.download.clone()
    }
}

pub fn shell_with_plugins(plugins: &[(&str, &[&str])]) -> (Shell, Recorder) {
    let mut registry = PluginRegistry::new();
    for (plugin_id, components) in plugins {
        registry
            .install_loaded(PluginDescriptor::new(*plugin_id, components.iter().copied()))
            .unwrap();
    }
    let recorder = Recorder::default();
    let shell = Shell::new(registry, Box::new(recorder.clone()));
    (shell, recorder)
}

pub fn shell_with_source(source: FakeSource) -> (Shell, Recorder) {
    let (shell, recorder) = shell_with_plugins(&[]);
    (shell.with_update_source(Arc::new(source)), recorder)
}
