//! Shell - the visible-state owner.
//!
//! Owns the open workspaces, the plugin registry and its lifecycle watcher,
//! the download progress dialog and the presenter. Everything here runs on
//! one thread; background workers reach it only through the `UiQueue` and the
//! progress channel.
//!
//! Progress is always drained before the next queued task, so the progress
//! terminal (close dialog) is observed before the restart or failure handoff
//! that the orchestrator posts after it.

use std::sync::Arc;

use crate::api::types::{PluginDescriptor, ReleaseInfo, ShellError, TileId, WorkspaceId};
use crate::plugins::registry::PluginRegistry;
use crate::plugins::watcher::PluginLifecycleWatcher;
use crate::protocols::presenter::ShellPresenter;
use crate::protocols::save_file::{DashboardData, SaveFileHandler};
use crate::protocols::update_source::UpdateSource;
use crate::runtime::progress::{DownloadProgressDialog, ProgressEvent, ProgressReceiver};
use crate::runtime::sweeper::{SweepReport, WorkspaceSweeper};
use crate::runtime::ui_queue::{UiHandle, UiQueue, UiTask};
use crate::runtime::updater::{UpdateOperation, UpdateOrchestrator};
use crate::runtime::workspace_manager::WorkspaceManager;

const DEFAULT_DIVIDER_POSITION: f64 = 0.25;

enum Wake {
    Progress(Option<ProgressEvent>),
    Task(Option<UiTask>),
}

/// Visible-state owner of the dashboard window.
pub struct Shell {
    workspaces: WorkspaceManager,
    registry: PluginRegistry,
    watcher: PluginLifecycleWatcher,
    sweeper: WorkspaceSweeper,
    presenter: Box<dyn ShellPresenter>,
    progress_dialog: DownloadProgressDialog,
    progress: Option<ProgressReceiver>,
    queue: UiQueue,
    ui: UiHandle,
    updater: Option<Arc<UpdateOrchestrator>>,
    save_file: Option<Box<dyn SaveFileHandler>>,
    tab_titles: Vec<String>,
    divider_position: f64,
    offered_update: Option<ReleaseInfo>,
}

impl Shell {
    /// Create the shell around an already populated plugin registry.
    ///
    /// Every plugin known at this point is watched for unload.
    pub fn new(mut registry: PluginRegistry, presenter: Box<dyn ShellPresenter>) -> Self {
        // Startup state is observed through `watch_known`, not replayed
        registry.drain_events();
        let mut watcher = PluginLifecycleWatcher::new();
        watcher.watch_known(&registry);

        log::info!(
            "Setting up plugins in the shell: watched={}",
            watcher.watched_count()
        );

        let (ui, queue) = UiQueue::channel();
        Self {
            workspaces: WorkspaceManager::new(),
            registry,
            watcher,
            sweeper: WorkspaceSweeper,
            presenter,
            progress_dialog: DownloadProgressDialog::new(),
            progress: None,
            queue,
            ui,
            updater: None,
            save_file: None,
            tab_titles: Vec::new(),
            divider_position: DEFAULT_DIVIDER_POSITION,
            offered_update: None,
        }
    }

    /// Enable self-updates from `source`.
    pub fn with_update_source(mut self, source: Arc<dyn UpdateSource>) -> Self {
        self.updater = Some(Arc::new(UpdateOrchestrator::new(source, self.ui.clone())));
        self
    }

    pub fn with_save_file_handler(mut self, handler: Box<dyn SaveFileHandler>) -> Self {
        self.save_file = Some(handler);
        self
    }

    /// Tab titles used by `new_layout`.
    pub fn with_tab_titles(mut self, titles: Vec<String>) -> Self {
        self.tab_titles = titles;
        self
    }

    /// Handle for background workers and plugin loaders.
    pub fn ui_handle(&self) -> UiHandle {
        self.ui.clone()
    }

    pub fn updater(&self) -> Option<&Arc<UpdateOrchestrator>> {
        self.updater.as_ref()
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn workspaces_mut(&mut self) -> &mut WorkspaceManager {
        &mut self.workspaces
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn offered_update(&self) -> Option<&ReleaseInfo> {
        self.offered_update.as_ref()
    }

    pub fn is_progress_showing(&self) -> bool {
        self.progress_dialog.is_showing()
    }

    // ------------------------------------------------------------------
    // Plugins
    // ------------------------------------------------------------------

    /// Install and load a plugin discovered during the session.
    pub fn install_plugin(&mut self, descriptor: PluginDescriptor) -> Result<(), ShellError> {
        let result = self.registry.install_loaded(descriptor);
        self.dispatch_registry_events();
        result
    }

    pub fn load_plugin(&mut self, plugin_id: &str) -> Result<(), ShellError> {
        let result = self.registry.load(plugin_id);
        self.dispatch_registry_events();
        result
    }

    /// Unload a plugin and remove every tile it contributed.
    pub fn unload_plugin(&mut self, plugin_id: &str) -> Result<SweepReport, ShellError> {
        let result = self.registry.unload(plugin_id);
        let report = self.dispatch_registry_events();
        result.map(|_| report)
    }

    fn dispatch_registry_events(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        for event in self.registry.drain_events() {
            if let Some(request) = self.watcher.handle(&event) {
                report.merge(self.sweeper.sweep(&mut self.workspaces, &request));
            }
        }
        report
    }

    // ------------------------------------------------------------------
    // Workspaces
    // ------------------------------------------------------------------

    pub fn new_tab(&mut self, title: &str) -> Result<WorkspaceId, ShellError> {
        self.workspaces.create_workspace(title)
    }

    pub fn close_current_tab(&mut self) -> Result<(), ShellError> {
        let workspace_id = self
            .workspaces
            .selected()
            .map(|w| w.workspace_id().clone())
            .ok_or(ShellError::NoWorkspaceOpen)?;
        self.workspaces.close_workspace(&workspace_id).map(|_| ())
    }

    /// Select the tab for a 1-based shortcut digit.
    pub fn select_tab_shortcut(&mut self, digit: u8) -> bool {
        digit >= 1 && self.workspaces.select(usize::from(digit) - 1)
    }

    pub fn add_component_to_active(&mut self, component: &str) -> Result<TileId, ShellError> {
        self.workspaces.add_component_to_active(component)
    }

    /// Replace the layout with fresh tabs and forget the current save file.
    pub fn new_layout(&mut self) {
        if let Some(handler) = self.save_file.as_mut() {
            handler.clear();
        }
        self.workspaces.new_layout(&self.tab_titles);
    }

    pub fn divider_position(&self) -> f64 {
        self.divider_position
    }

    /// Move the split between the side drawer and the tabs, clamped to `[0, 1]`.
    pub fn set_divider_position(&mut self, position: f64) {
        if position.is_finite() {
            self.divider_position = position.clamp(0.0, 1.0);
        }
    }

    pub fn dashboard_data(&self) -> DashboardData {
        DashboardData {
            divider_position: self.divider_position,
            workspaces: self.workspaces.workspaces().to_vec(),
        }
    }

    pub fn save(&mut self) -> Result<(), ShellError> {
        let data = self.dashboard_data();
        self.save_file_handler()?.save(&data)
    }

    pub fn save_as(&mut self) -> Result<(), ShellError> {
        let data = self.dashboard_data();
        self.save_file_handler()?.save_as(&data)
    }

    /// Load a layout. A cancelled load leaves the current one in place.
    pub fn load(&mut self) -> Result<(), ShellError> {
        let Some(data) = self.save_file_handler()?.load()? else {
            return Ok(());
        };
        self.divider_position = data.divider_position;
        self.workspaces.replace_all(data.workspaces);
        Ok(())
    }

    fn save_file_handler(&mut self) -> Result<&mut Box<dyn SaveFileHandler>, ShellError> {
        self.save_file.as_mut().ok_or_else(|| ShellError::Config {
            message: "No save file handler configured".to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Automatic check; silent unless an update is available.
    pub async fn check_for_updates_subdued(&self) -> Result<UpdateOperation, ShellError> {
        self.require_updater()?.check_for_updates_subdued().await
    }

    /// User-initiated check; every outcome is shown.
    pub async fn check_for_updates(&self) -> Result<UpdateOperation, ShellError> {
        self.require_updater()?.check_for_updates().await
    }

    /// The user accepted the update footer: download and prompt to restart.
    pub async fn accept_offered_update(&mut self) -> Result<UpdateOperation, ShellError> {
        let operation = self.require_updater()?.check_for_updates().await?;
        self.offered_update = None;
        Ok(operation)
    }

    /// The user closed the progress dialog. The download continues.
    pub fn dismiss_download_progress(&mut self) {
        self.progress_dialog.dismissed_by_user();
    }

    fn require_updater(&self) -> Result<Arc<UpdateOrchestrator>, ShellError> {
        self.updater.clone().ok_or_else(|| ShellError::Config {
            message: "Updates are not configured".to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Visible-state loop
    // ------------------------------------------------------------------

    /// Apply everything already delivered, without waiting. Returns the
    /// number of queued tasks handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            self.pump_progress();
            match self.queue.try_next() {
                Some(task) => {
                    self.handle(task);
                    handled += 1;
                }
                None => break,
            }
        }
        handled
    }

    /// Run until a `UiTask::Shutdown` is handled.
    pub async fn run(&mut self) {
        loop {
            let wake = tokio::select! {
                biased;
                event = next_progress(&mut self.progress) => Wake::Progress(event),
                task = self.queue.next() => Wake::Task(task),
            };

            match wake {
                Wake::Progress(Some(event)) => self.observe_progress(event),
                Wake::Progress(None) => self.progress = None,
                Wake::Task(Some(UiTask::Shutdown)) | Wake::Task(None) => {
                    self.pump_progress();
                    log::info!("Visible-state loop stopped");
                    return;
                }
                Wake::Task(Some(task)) => {
                    self.pump_progress();
                    self.handle(task);
                }
            }
        }
    }

    fn pump_progress(&mut self) {
        let Some(receiver) = self.progress.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        while let Some(event) = receiver.try_recv() {
            events.push(event);
        }
        if receiver.is_finished() {
            self.progress = None;
        }
        for event in events {
            self.observe_progress(event);
        }
    }

    fn observe_progress(&mut self, event: ProgressEvent) {
        self.progress_dialog
            .observe(&event, self.presenter.as_mut());
    }

    fn handle(&mut self, task: UiTask) {
        match task {
            UiTask::AttachProgress {
                operation_id,
                receiver,
            } => {
                log::debug!("Download progress attached: operation_id={operation_id}");
                self.progress_dialog.begin_session();
                self.progress = Some(receiver);
                self.pump_progress();
            }
            UiTask::OfferUpdate { release } => {
                let already_offered = self
                    .offered_update
                    .as_ref()
                    .is_some_and(|offered| offered.version == release.version);
                if already_offered {
                    log::debug!("Update already offered: version={}", release.version);
                    return;
                }
                self.presenter.show_update_footer(&release);
                self.offered_update = Some(release);
            }
            UiTask::NoUpdateAvailable => {
                self.offered_update = None;
                self.presenter.show_up_to_date();
            }
            UiTask::PromptRestart { update } => {
                self.offered_update = None;
                self.presenter.prompt_restart(&update);
            }
            UiTask::UpdateFailed { cause } => self.presenter.show_update_failure(&cause),
            UiTask::PluginInstalled { descriptor } => {
                let plugin_id = descriptor.plugin_id.clone();
                if let Err(e) = self.install_plugin(descriptor) {
                    log::warn!("Failed to install plugin: plugin_id={plugin_id}, error={e}");
                }
            }
            UiTask::PluginUnloaded { plugin_id } => {
                if let Err(e) = self.unload_plugin(&plugin_id) {
                    log::warn!("Failed to unload plugin: plugin_id={plugin_id}, error={e}");
                }
            }
            UiTask::Shutdown => log::debug!("Shutdown requested outside the run loop"),
        }
    }
}

async fn next_progress(progress: &mut Option<ProgressReceiver>) -> Option<ProgressEvent> {
    match progress {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
