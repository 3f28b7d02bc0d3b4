//! UiQueue - ordered handoff from background workers into the visible-state context.
//!
//! Workers hold a cloneable `UiHandle` and only ever enqueue; the visible-state
//! owner holds the single `UiQueue` and applies tasks in order. Posting is
//! fire-and-forget: nothing is returned to the poster.

use tokio::sync::mpsc;

use crate::api::types::{DownloadedUpdate, OperationId, PluginDescriptor, ReleaseInfo};
use crate::runtime::progress::ProgressReceiver;

/// Work delivered to the visible-state owner.
#[derive(Debug)]
pub enum UiTask {
    /// A download session started; progress arrives through the receiver
    AttachProgress {
        operation_id: OperationId,
        receiver: ProgressReceiver,
    },
    /// A subdued check found a newer release
    OfferUpdate { release: ReleaseInfo },
    /// An explicit check found nothing newer
    NoUpdateAvailable,
    /// The update was downloaded and can be applied by restarting
    PromptRestart { update: DownloadedUpdate },
    /// An explicit check or a download failed; `cause` is verbatim
    UpdateFailed { cause: String },
    /// The plugin loader installed a plugin during the session
    PluginInstalled { descriptor: PluginDescriptor },
    /// The plugin loader unloaded a plugin
    PluginUnloaded { plugin_id: String },
    /// Stop the visible-state loop after everything queued before it
    Shutdown,
}

/// Cloneable, `Send` handle used by background workers.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl UiHandle {
    /// Enqueue a task. If the visible-state owner is gone the task is dropped.
    pub fn post(&self, task: UiTask) {
        if let Err(e) = self.tx.send(task) {
            log::warn!("Visible-state context closed, dropping task: {:?}", e.0);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end, owned by the visible-state context.
#[derive(Debug)]
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiQueue {
    pub fn channel() -> (UiHandle, UiQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UiHandle { tx }, UiQueue { rx })
    }

    /// Next queued task, without waiting.
    pub fn try_next(&mut self) -> Option<UiTask> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next task. `None` once every handle is dropped.
    pub async fn next(&mut self) -> Option<UiTask> {
        self.rx.recv().await
    }
}
