//! Coalescing clipboard-change worker.
//!
//! Clipboard owners often publish several formats in quick succession, and
//! each publication raises a change notification.  Notifications are pushed
//! into a channel of capacity 1 without blocking; the worker waits out the
//! debounce window, drops whatever piled up meanwhile and runs
//! [`QueueController::on_clipboard_update`] once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::queue_controller::QueueController;

/// Default coalescing window.
pub const DEFAULT_WATCH_DEBOUNCE: Duration = Duration::from_millis(30);

/// Cheap handle for posting change notifications.  Safe to call from any
/// thread, including non-runtime threads.
#[derive(Debug, Clone)]
pub struct ClipboardWatcher {
    tx: mpsc::Sender<()>,
}

impl ClipboardWatcher {
    /// Spawns the worker on the current runtime.
    ///
    /// The worker exits once every `ClipboardWatcher` clone has been dropped.
    pub fn spawn(controller: Arc<QueueController>, debounce: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_worker(controller, rx, debounce));
        (Self { tx }, task)
    }

    /// Posts a change notification.  A notification already pending absorbs
    /// this one.
    pub fn notify(&self) {
        match self.tx.try_send(()) {
            Ok(()) => trace!("clipboard change queued"),
            Err(TrySendError::Full(())) => trace!("clipboard change coalesced"),
            Err(TrySendError::Closed(())) => warn!("clipboard watcher stopped; change dropped"),
        }
    }
}

async fn run_worker(
    controller: Arc<QueueController>,
    mut rx: mpsc::Receiver<()>,
    debounce: Duration,
) {
    while rx.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        while rx.try_recv().is_ok() {}

        match controller.on_clipboard_update().await {
            Ok(outcome) => debug!(?outcome, "clipboard change processed"),
            Err(e) => error!(error = %e, "clipboard change handling failed"),
        }
    }
    debug!("clipboard watcher exiting");
}
