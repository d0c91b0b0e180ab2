//! QueueController: the clipboard queue use case.
//!
//! The controller owns a [`QueueState`] behind a short-lived mutex and does
//! all clipboard I/O outside that lock through the [`ClipboardBackend`] and
//! [`InputInjector`] traits.
//!
//! # Self-event suppression
//!
//! Every write we make to the clipboard is followed by recording the
//! backend's new change sequence number in the self-event ring.  Write and
//! record happen under `self_write_gate`, and [`QueueController::on_clipboard_update`]
//! takes the same gate before it reads the sequence number, so a
//! notification for our own write can never be checked before the number
//! has been recorded.
//!
//! # Paste sequences
//!
//! A paste saves the clipboard, writes the item, sends the keystroke and
//! writes the saved content back.  `paste_gate` is held for that whole
//! sequence, so a second paste starts only after the first has restored
//! and saves the user's content rather than the first paste's item.
//!
//! # State-change notifications
//!
//! Operations that change `enabled`, the queue length or the order strategy
//! invoke the registered [`StatusListener`] after the state lock has been
//! released; a listener may call straight back into the controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use clipqueue_core::{
    ClipboardItem, OrderStrategy, QueueError, QueueSettings, QueueState, QueueStatus,
    UpdateOutcome,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default settle delay between writing an item and sending the paste keystroke.
pub const DEFAULT_PASTE_DELAY: Duration = Duration::from_millis(100);

/// Default settle delay between the paste keystroke and restoring the clipboard.
pub const DEFAULT_RESTORE_DELAY: Duration = Duration::from_millis(250);

/// Failure reported by a clipboard backend or input injector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard read failed: {0}")]
    Read(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
    #[error("paste keystroke failed: {0}")]
    Paste(String),
    #[error("typing text failed: {0}")]
    Type(String),
}

/// Error type for controller operations.
#[derive(Debug, Error, PartialEq)]
pub enum ControllerError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Access to the system clipboard.
///
/// Any retry policy for a busy clipboard belongs to the implementation; an
/// error returned here is final for that call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipboardBackend: Send + Sync {
    /// Reads the current clipboard content as a fresh item.
    async fn read(&self) -> Result<ClipboardItem, ClipboardError>;

    /// Replaces the clipboard content with `item`.
    async fn write(&self, item: &ClipboardItem) -> Result<(), ClipboardError>;

    /// Monotonic counter bumped by every clipboard change.
    fn change_sequence_number(&self) -> u32;
}

/// Synthesised keyboard input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InputInjector: Send + Sync {
    /// Sends the platform paste shortcut (Ctrl+V) to the focused window.
    async fn send_paste_keystroke(&self) -> Result<(), ClipboardError>;

    /// Types `text` as individual keystrokes.
    async fn send_typed_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// How a macro delivers its text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroMode {
    /// Simulated keystrokes.
    #[default]
    Type,
    /// Through the clipboard, restoring the previous content afterwards.
    Paste,
}

/// Callback receiving the new status after a state change.
pub type StatusListener = Arc<dyn Fn(QueueStatus) + Send + Sync>;

/// Construction-time tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub queue: QueueSettings,
    pub default_order: OrderStrategy,
    pub paste_delay: Duration,
    pub restore_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            queue: QueueSettings::default(),
            default_order: OrderStrategy::Lifo,
            paste_delay: DEFAULT_PASTE_DELAY,
            restore_delay: DEFAULT_RESTORE_DELAY,
        }
    }
}

/// The clipboard queue use case.
pub struct QueueController {
    state: Mutex<QueueState>,
    /// Held around write + record and around the sequence check of an update.
    self_write_gate: tokio::sync::Mutex<()>,
    /// Held from save to restore of a paste.  Taken before `self_write_gate`.
    paste_gate: tokio::sync::Mutex<()>,
    listener: RwLock<Option<StatusListener>>,
    backend: Arc<dyn ClipboardBackend>,
    injector: Arc<dyn InputInjector>,
    paste_delay: Duration,
    restore_delay: Duration,
}

impl QueueController {
    pub fn new(
        backend: Arc<dyn ClipboardBackend>,
        injector: Arc<dyn InputInjector>,
        settings: ControllerSettings,
    ) -> Self {
        info!(
            order = %settings.default_order,
            history_capacity = settings.queue.history_capacity,
            "queue controller created"
        );
        Self {
            state: Mutex::new(QueueState::new(settings.queue, settings.default_order)),
            self_write_gate: tokio::sync::Mutex::new(()),
            paste_gate: tokio::sync::Mutex::new(()),
            listener: RwLock::new(None),
            backend,
            injector,
            paste_delay: settings.paste_delay,
            restore_delay: settings.restore_delay,
        }
    }

    /// Registers the state-change listener, replacing any previous one.
    pub fn set_status_listener(&self, listener: StatusListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    // ── Snapshots ────────────────────────────────────────────────────────────

    pub fn status(&self) -> QueueStatus {
        self.lock_state().status()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock_state().is_enabled()
    }

    pub fn order_strategy(&self) -> OrderStrategy {
        self.lock_state().order()
    }

    /// Copy of the queue, head first.
    pub fn queue(&self) -> Vec<ClipboardItem> {
        self.lock_state().queue_snapshot()
    }

    /// Copy of the history, oldest first.
    pub fn history(&self) -> Vec<ClipboardItem> {
        self.lock_state().history_snapshot()
    }

    // ── Queue mode ───────────────────────────────────────────────────────────

    /// Turns queue mode on or off.
    ///
    /// Enabling snapshots the current clipboard (a failed read is logged and
    /// leaves no snapshot).  Disabling writes the snapshot back.  The state
    /// change is committed and announced even when that restore fails; the
    /// restore error is then returned.
    pub async fn toggle_queue(&self) -> Result<QueueStatus, ControllerError> {
        let _gate = self.self_write_gate.lock().await;

        if !self.is_enabled() {
            let snapshot = match self.backend.read().await {
                Ok(item) => Some(item),
                Err(e) => {
                    error!(error = %e, "failed to snapshot clipboard on enable");
                    None
                }
            };
            let status = {
                let mut state = self.lock_state();
                state.enable(snapshot);
                state.status()
            };
            self.notify(status);
            return Ok(status);
        }

        let (snapshot, status) = {
            let mut state = self.lock_state();
            let snapshot = state.disable();
            (snapshot, state.status())
        };
        self.notify(status);

        if let Some(snapshot) = snapshot {
            if let Err(e) = self.write_and_record(&snapshot).await {
                error!(error = %e, "failed to restore clipboard snapshot on disable");
                return Err(e.into());
            }
            debug!(preview = %snapshot.preview, "restored clipboard snapshot");
        }
        Ok(status)
    }

    // ── Clipboard updates ────────────────────────────────────────────────────

    /// Handles one clipboard-change notification.
    ///
    /// Changes whose sequence number is in the self-event ring are
    /// suppressed without reading the clipboard.
    pub async fn on_clipboard_update(&self) -> Result<UpdateOutcome, ControllerError> {
        let item = {
            let _gate = self.self_write_gate.lock().await;
            let seq = self.backend.change_sequence_number();
            if self.lock_state().is_self_event(seq) {
                debug!(seq, "suppressed self-generated clipboard change");
                return Ok(UpdateOutcome::Suppressed);
            }
            self.backend.read().await.map_err(|e| {
                error!(error = %e, "failed to read clipboard after change");
                e
            })?
        };

        let observed_at = tokio::time::Instant::now().into_std();
        let (outcome, status) = {
            let mut state = self.lock_state();
            let outcome = state.accept(item, observed_at);
            (outcome, state.status())
        };
        if outcome == UpdateOutcome::Queued {
            self.notify(status);
        }
        Ok(outcome)
    }

    // ── Paste ────────────────────────────────────────────────────────────────

    /// Dequeues the next item by order strategy and pastes it.
    ///
    /// Returns `Ok(None)` (after a warning) when queue mode is off or the
    /// queue is empty.  The dequeue is never rolled back by a later I/O
    /// failure.
    pub async fn paste_next(&self) -> Result<Option<ClipboardItem>, ControllerError> {
        let (item, status) = {
            let mut state = self.lock_state();
            match state.dequeue() {
                Ok(item) => (item, state.status()),
                Err(reason @ (QueueError::Disabled | QueueError::Empty)) => {
                    warn!(%reason, "paste next skipped");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        };
        self.notify(status);

        info!(
            content_type = %item.content_type(),
            preview = %item.preview,
            remaining = status.queue_len,
            "pasting next queue item"
        );
        self.paste_through_clipboard(&item).await?;
        Ok(Some(item))
    }

    // ── Queue edits ──────────────────────────────────────────────────────────

    /// Removes the queue element at `index`.
    pub fn remove_item(&self, index: usize) -> Result<ClipboardItem, ControllerError> {
        let (item, status) = {
            let mut state = self.lock_state();
            let item = state.remove(index)?;
            (item, state.status())
        };
        self.notify(status);
        Ok(item)
    }

    pub fn clear_queue(&self) {
        let status = {
            let mut state = self.lock_state();
            state.clear_queue();
            state.status()
        };
        self.notify(status);
    }

    /// Flips LIFO/FIFO and returns the new strategy.
    pub fn toggle_order(&self) -> OrderStrategy {
        let (order, status) = {
            let mut state = self.lock_state();
            let order = state.toggle_order();
            (order, state.status())
        };
        self.notify(status);
        order
    }

    /// Sets the order strategy from its literal name (`"LIFO"` / `"FIFO"`).
    pub fn set_order_strategy(&self, order: &str) -> Result<OrderStrategy, ControllerError> {
        let order: OrderStrategy = order.parse()?;
        let (changed, status) = {
            let mut state = self.lock_state();
            (state.set_order(order), state.status())
        };
        if changed {
            self.notify(status);
        }
        Ok(order)
    }

    // ── History ──────────────────────────────────────────────────────────────

    /// Writes the history item with `id` back to the clipboard.
    pub async fn copy_item(&self, id: &str) -> Result<ClipboardItem, ControllerError> {
        let item = self.lock_state().find_history(id)?;
        self.write_recorded(&item).await?;
        info!(preview = %item.preview, "copied history item to clipboard");
        Ok(item)
    }

    // ── Macros ───────────────────────────────────────────────────────────────

    pub async fn execute_macro(&self, text: &str, mode: MacroMode) -> Result<(), ControllerError> {
        info!(?mode, chars = text.chars().count(), "executing macro");
        match mode {
            MacroMode::Type => {
                self.injector.send_typed_text(text).await.map_err(|e| {
                    error!(error = %e, "macro typing failed");
                    e
                })?;
            }
            MacroMode::Paste => {
                self.paste_through_clipboard(&ClipboardItem::text(text)).await?;
            }
        }
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Save, write, paste, restore.  Every write is recorded as a self-event.
    async fn paste_through_clipboard(&self, item: &ClipboardItem) -> Result<(), ControllerError> {
        let _paste = self.paste_gate.lock().await;
        let saved = self.backend.read().await.map_err(|e| {
            error!(error = %e, "failed to save clipboard before paste");
            e
        })?;

        if let Err(e) = self.write_recorded(item).await {
            error!(error = %e, "failed to write item to clipboard");
            self.restore(&saved).await;
            return Err(e.into());
        }

        tokio::time::sleep(self.paste_delay).await;

        if let Err(e) = self.injector.send_paste_keystroke().await {
            error!(error = %e, "paste keystroke failed");
            self.restore(&saved).await;
            return Err(e.into());
        }

        tokio::time::sleep(self.restore_delay).await;

        self.write_recorded(&saved).await.map_err(|e| {
            error!(error = %e, "failed to restore clipboard after paste");
            e
        })?;
        Ok(())
    }

    /// Best-effort restore after a failed paste.
    async fn restore(&self, saved: &ClipboardItem) {
        if let Err(e) = self.write_recorded(saved).await {
            error!(error = %e, "best-effort clipboard restore failed");
        }
    }

    async fn write_recorded(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        let _gate = self.self_write_gate.lock().await;
        self.write_and_record(item).await
    }

    /// Caller must hold `self_write_gate`.
    async fn write_and_record(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        self.backend.write(item).await?;
        let seq = self.backend.change_sequence_number();
        self.lock_state().record_self_event(seq);
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, status: QueueStatus) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(status);
        }
    }
}
