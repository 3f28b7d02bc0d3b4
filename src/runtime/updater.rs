//! Update Orchestrator - drives check → download → prompt-to-restart off the visible thread.
//!
//! The orchestrator manages the async update workflow:
//! 1. Rejects the request if a workflow is already in flight
//! 2. Returns immediately with an operation handle
//! 3. Spawns a background task that queries the update source
//! 4. Downloads the release when the check was explicit
//! 5. Hands every user-visible outcome to the visible-state context via `UiHandle`
//!
//! The background task never touches visible state. It returns the phase to
//! `Idle` itself, so the workflow retires even if the progress dialog was
//! closed or the visible-state owner stopped listening.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::api::types::{
    CheckMode, DownloadedUpdate, OperationId, OperationStarted, ReleaseInfo, ShellError,
    UpdateCheckResult, UpdatePhase,
};
use crate::protocols::update_source::UpdateSource;
use crate::runtime::progress::progress_channel;
use crate::runtime::ui_queue::{UiHandle, UiTask};

/// Handle to an accepted update workflow.
#[derive(Debug)]
pub struct UpdateOperation {
    operation_id: OperationId,
    task: JoinHandle<UpdatePhase>,
}

impl UpdateOperation {
    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    pub fn started(&self) -> OperationStarted {
        OperationStarted {
            operation_id: self.operation_id.clone(),
        }
    }

    /// Wait for the workflow to retire and return its terminal phase.
    pub async fn wait(self) -> UpdatePhase {
        self.task.await.unwrap_or_else(|e| UpdatePhase::Failed {
            message: format!("Update task did not complete: {e}"),
        })
    }
}

/// Orchestrator for the self-update workflow.
///
/// Constructed once at startup and shared as `Arc<UpdateOrchestrator>`.
pub struct UpdateOrchestrator {
    /// Where releases come from
    source: Arc<dyn UpdateSource>,
    /// Handoff into the visible-state context
    ui: UiHandle,
    /// Current workflow phase; anything but `Idle` means in flight
    phase: Mutex<UpdatePhase>,
    /// Terminal phase of the most recent workflow
    last_outcome: Mutex<Option<UpdatePhase>>,
}

impl UpdateOrchestrator {
    /// Create a new UpdateOrchestrator.
    ///
    /// # Arguments
    ///
    /// * `source` - Update source queried by every workflow
    /// * `ui` - Handle for delivering outcomes to the visible-state context
    pub fn new(source: Arc<dyn UpdateSource>, ui: UiHandle) -> Self {
        Self {
            source,
            ui,
            phase: Mutex::new(UpdatePhase::Idle),
            last_outcome: Mutex::new(None),
        }
    }

    /// Automatic check. Stays silent unless an update is available, in
    /// which case the update footer is offered.
    pub async fn check_for_updates_subdued(
        self: &Arc<Self>,
    ) -> Result<UpdateOperation, ShellError> {
        self.start(CheckMode::Subdued).await
    }

    /// User-initiated check. Every outcome is surfaced; an available update
    /// is downloaded with progress and followed by a restart prompt.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::UpdateInProgress` if a workflow is already running.
    pub async fn check_for_updates(self: &Arc<Self>) -> Result<UpdateOperation, ShellError> {
        self.start(CheckMode::Explicit).await
    }

    pub async fn phase(&self) -> UpdatePhase {
        self.phase.lock().await.clone()
    }

    pub async fn last_outcome(&self) -> Option<UpdatePhase> {
        self.last_outcome.lock().await.clone()
    }

    /// Run a subdued check every `interval`. Ticks that find a workflow in
    /// flight are skipped.
    pub fn spawn_periodic_checks(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; startup checks are separate
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match orchestrator.check_for_updates_subdued().await {
                    Ok(operation) => {
                        operation.wait().await;
                    }
                    Err(ShellError::UpdateInProgress) => {
                        log::debug!("Scheduled update check skipped, workflow in flight");
                    }
                    Err(e) => {
                        log::warn!("Scheduled update check could not start: {e}");
                    }
                }
            }
        })
    }

    async fn start(self: &Arc<Self>, mode: CheckMode) -> Result<UpdateOperation, ShellError> {
        {
            let mut phase = self.phase.lock().await;
            if *phase != UpdatePhase::Idle {
                log::info!(
                    "Update check rejected, already running: mode={mode:?}, phase={:?}",
                    *phase
                );
                return Err(ShellError::UpdateInProgress);
            }
            *phase = UpdatePhase::Checking { mode };
        }

        let operation_id = Uuid::new_v4().to_string();
        log::info!("Starting update check: mode={mode:?}, operation_id={operation_id}");

        let orchestrator = Arc::clone(self);
        let op_id = operation_id.clone();
        let task = tokio::spawn(async move { orchestrator.run_supervised(op_id, mode).await });

        Ok(UpdateOperation { operation_id, task })
    }

    /// Runs the workflow in its own task so a panicking update source still
    /// retires the phase.
    async fn run_supervised(
        self: Arc<Self>,
        operation_id: OperationId,
        mode: CheckMode,
    ) -> UpdatePhase {
        let orchestrator = Arc::clone(&self);
        let op_id = operation_id.clone();
        let workflow = tokio::spawn(async move { orchestrator.run_workflow(op_id, mode).await });

        let outcome = match workflow.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Update workflow aborted: error={e}, operation_id={operation_id}");
                let cause = format!("Update workflow aborted: {e}");
                if mode == CheckMode::Explicit {
                    self.ui.post(UiTask::UpdateFailed {
                        cause: cause.clone(),
                    });
                }
                UpdatePhase::Failed { message: cause }
            }
        };

        self.finish(&operation_id, outcome.clone()).await;
        outcome
    }

    async fn run_workflow(&self, operation_id: OperationId, mode: CheckMode) -> UpdatePhase {
        let result = self.source.check_latest_version().await;
        log::debug!("Update check result: {result:?}, operation_id={operation_id}");

        match (result, mode) {
            (UpdateCheckResult::UpToDate, CheckMode::Subdued) => UpdatePhase::NoUpdate,
            (UpdateCheckResult::UpToDate, CheckMode::Explicit) => {
                self.ui.post(UiTask::NoUpdateAvailable);
                UpdatePhase::NoUpdate
            }
            (UpdateCheckResult::Failed { cause }, CheckMode::Subdued) => {
                log::warn!("Subdued update check failed: {cause}, operation_id={operation_id}");
                UpdatePhase::Failed { message: cause }
            }
            (UpdateCheckResult::Failed { cause }, CheckMode::Explicit) => {
                log::error!("Update check failed: {cause}, operation_id={operation_id}");
                self.ui.post(UiTask::UpdateFailed {
                    cause: cause.clone(),
                });
                UpdatePhase::Failed { message: cause }
            }
            (UpdateCheckResult::UpdateAvailable(release), CheckMode::Subdued) => {
                let version = release.version.clone();
                self.ui.post(UiTask::OfferUpdate { release });
                UpdatePhase::Offered { version }
            }
            (UpdateCheckResult::UpdateAvailable(release), CheckMode::Explicit) => {
                self.download(operation_id, release).await
            }
        }
    }

    async fn download(&self, operation_id: OperationId, release: ReleaseInfo) -> UpdatePhase {
        *self.phase.lock().await = UpdatePhase::Downloading {
            version: release.version.clone(),
        };

        let (progress, receiver) = progress_channel();
        self.ui.post(UiTask::AttachProgress {
            operation_id: operation_id.clone(),
            receiver,
        });

        match self.source.download(&release, progress.reporter()).await {
            Ok(path) => {
                progress.complete();
                log::info!(
                    "Update downloaded: version={}, path={}, operation_id={operation_id}",
                    release.version,
                    path.display()
                );
                self.ui.post(UiTask::PromptRestart {
                    update: DownloadedUpdate {
                        version: release.version.clone(),
                        path,
                    },
                });
                UpdatePhase::PromptRestart {
                    version: release.version,
                }
            }
            Err(e) => {
                let cause = e.cause();
                progress.fail(cause.clone());
                log::error!(
                    "Update download failed: version={}, error={e}, operation_id={operation_id}",
                    release.version
                );
                self.ui.post(UiTask::UpdateFailed {
                    cause: cause.clone(),
                });
                UpdatePhase::Failed { message: cause }
            }
        }
    }

    async fn finish(&self, operation_id: &str, outcome: UpdatePhase) {
        *self.last_outcome.lock().await = Some(outcome.clone());
        *self.phase.lock().await = UpdatePhase::Idle;
        log::debug!("Update workflow retired: outcome={outcome:?}, operation_id={operation_id}");
    }
}
