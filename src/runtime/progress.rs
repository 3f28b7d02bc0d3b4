//! Download progress delivery from a background worker to the visible-state owner.
//!
//! `progress_channel()` creates a single-slot, last-value-wins conduit:
//!
//! - intermediate values overwrite each other while the consumer is busy
//! - the terminal event (completion or failure) is never dropped and is
//!   delivered exactly once, after any still-pending intermediate value
//!
//! `DownloadProgressDialog` is the consumer-side guard that turns those events
//! into presenter calls: show at most once per session, close exactly once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::protocols::presenter::ShellPresenter;

/// Event observed by the progress consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Intermediate progress in `[0, 1)`
    Progress(f64),
    /// The download reached 1.0
    Completed,
    /// The download stopped before completion
    Failed(String),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress(_))
    }
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<f64>,
    last_reported: Option<f64>,
    terminal: Option<ProgressEvent>,
    terminal_delivered: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    notify: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // Slot updates never panic halfway; a poisoned lock still holds valid state
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a new progress channel for one download session.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let shared = Arc::new(Shared::default());
    (
        ProgressSender {
            shared: Arc::clone(&shared),
        },
        ProgressReceiver { shared },
    )
}

/// Producer half, owned by the background worker.
///
/// Dropping the sender without a terminal event delivers a failure so the
/// consumer always observes the end of the session.
#[derive(Debug)]
pub struct ProgressSender {
    shared: Arc<Shared>,
}

impl ProgressSender {
    /// Report a progress value.
    ///
    /// Values are clamped to `[0, 1]`, regressions are ignored and `1.0`
    /// completes the session.
    pub fn report(&self, value: f64) {
        if !value.is_finite() {
            log::warn!("Ignoring non-finite download progress: {value}");
            return;
        }
        let value = value.clamp(0.0, 1.0);
        if value >= 1.0 {
            self.complete();
            return;
        }

        {
            let mut slot = self.shared.lock();
            if slot.terminal.is_some() {
                return;
            }
            if slot.last_reported.is_some_and(|last| value < last) {
                log::trace!("Dropping regressing progress value: {value}");
                return;
            }
            slot.last_reported = Some(value);
            slot.pending = Some(value);
        }
        self.shared.notify.notify_one();
    }

    /// Mark the download as complete. Only the first terminal call counts.
    pub fn complete(&self) {
        self.finish(ProgressEvent::Completed);
    }

    /// Mark the download as failed. Only the first terminal call counts.
    pub fn fail(&self, cause: impl Into<String>) {
        self.finish(ProgressEvent::Failed(cause.into()));
    }

    /// Borrow a handle that can only report intermediate values.
    pub fn reporter(&self) -> ProgressReporter<'_> {
        ProgressReporter { sender: self }
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().terminal.is_some()
    }

    fn finish(&self, terminal: ProgressEvent) {
        {
            let mut slot = self.shared.lock();
            if slot.terminal.is_some() {
                return;
            }
            slot.terminal = Some(terminal);
        }
        self.shared.notify.notify_one();
    }
}

impl Drop for ProgressSender {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.fail("Download was abandoned before completion");
        }
    }
}

/// Report-only view of a `ProgressSender`, handed to update sources.
///
/// Sources can signal completion by reporting `1.0`, but cannot fail the
/// session; failures travel through their `Result`.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter<'a> {
    sender: &'a ProgressSender,
}

impl ProgressReporter<'_> {
    pub fn report(&self, value: f64) {
        self.sender.report(value);
    }
}

/// Consumer half, owned by the visible-state context.
#[derive(Debug)]
pub struct ProgressReceiver {
    shared: Arc<Shared>,
}

impl ProgressReceiver {
    /// Take the next event without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        let mut slot = self.shared.lock();
        if let Some(value) = slot.pending.take() {
            return Some(ProgressEvent::Progress(value));
        }
        if !slot.terminal_delivered {
            if let Some(terminal) = slot.terminal.clone() {
                slot.terminal_delivered = true;
                return Some(terminal);
            }
        }
        None
    }

    /// Wait for the next event. Returns `None` once the terminal event has
    /// been delivered.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.is_finished() {
                return None;
            }
            // notify_one stores a permit, so a send between the check and
            // this await is not lost
            self.shared.notify.notified().await;
        }
    }

    /// Whether the terminal event has been delivered.
    pub fn is_finished(&self) -> bool {
        self.shared.lock().terminal_delivered
    }
}

/// Visible-side guard for the download progress dialog.
///
/// - the dialog appears lazily on the first intermediate value, at most once
///   per session, even if the user closes it and more values arrive
/// - the displayed value never moves backwards
/// - the terminal event closes it exactly once, shown or not
#[derive(Debug, Default)]
pub struct DownloadProgressDialog {
    shown_once: bool,
    showing: bool,
    retired: bool,
    displayed: f64,
}

impl DownloadProgressDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the guard for a new download session.
    pub fn begin_session(&mut self) {
        *self = Self::default();
    }

    pub fn observe(&mut self, event: &ProgressEvent, presenter: &mut dyn ShellPresenter) {
        if self.retired {
            log::trace!("Progress event after dialog retired: {event:?}");
            return;
        }

        match event {
            ProgressEvent::Progress(value) => {
                if !self.shown_once {
                    self.shown_once = true;
                    self.showing = true;
                    presenter.show_download_progress();
                }
                if self.showing && *value >= self.displayed {
                    self.displayed = *value;
                    presenter.set_download_progress(*value);
                }
            }
            ProgressEvent::Completed | ProgressEvent::Failed(_) => {
                self.retired = true;
                self.showing = false;
                presenter.close_download_progress();
            }
        }
    }

    /// The user closed the dialog. The download keeps running; the dialog is
    /// not shown again in this session.
    pub fn dismissed_by_user(&mut self) {
        if self.showing {
            log::debug!("Download progress dialog dismissed by user");
        }
        self.showing = false;
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}
