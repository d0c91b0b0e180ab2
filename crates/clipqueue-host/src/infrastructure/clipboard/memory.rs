//! In-memory clipboard and logging injector.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use clipqueue_core::ClipboardItem;
use tracing::{debug, info};

use crate::application::queue_controller::{ClipboardBackend, ClipboardError, InputInjector};

/// Called after every clipboard change, like a clipboard-update window message.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
struct Contents {
    current: ClipboardItem,
    sequence: u32,
    writes: usize,
}

/// Process-local clipboard.
///
/// Reads hand out a fresh [`ClipboardItem`] with the current payload, as a
/// real backend would after converting the OS formats.
pub struct MemoryClipboard {
    contents: Mutex<Contents>,
    listener: RwLock<Option<ChangeListener>>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard with sequence number 0.
    pub fn new() -> Self {
        Self {
            contents: Mutex::new(Contents {
                current: ClipboardItem::empty(),
                sequence: 0,
                writes: 0,
            }),
            listener: RwLock::new(None),
        }
    }

    /// Registers the change listener, replacing any previous one.
    pub fn set_change_listener(&self, listener: ChangeListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    /// Replaces the content on behalf of another application (a user copy).
    pub fn set_external(&self, item: ClipboardItem) {
        let seq = {
            let mut contents = self.lock();
            contents.current = item;
            contents.sequence = contents.sequence.wrapping_add(1);
            contents.sequence
        };
        debug!(seq, "external clipboard change");
        self.fire();
    }

    /// The content as stored, without minting a new item.
    pub fn current(&self) -> ClipboardItem {
        self.lock().current.clone()
    }

    pub fn sequence(&self) -> u32 {
        self.lock().sequence
    }

    /// Number of writes made through [`ClipboardBackend::write`].
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Contents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClipboardBackend for MemoryClipboard {
    async fn read(&self) -> Result<ClipboardItem, ClipboardError> {
        let payload = self.lock().current.payload.clone();
        Ok(ClipboardItem::new(payload))
    }

    async fn write(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        let seq = {
            let mut contents = self.lock();
            contents.current = item.clone();
            contents.sequence = contents.sequence.wrapping_add(1);
            contents.writes += 1;
            contents.sequence
        };
        debug!(seq, content_type = %item.content_type(), "clipboard written");
        self.fire();
        Ok(())
    }

    fn change_sequence_number(&self) -> u32 {
        self.sequence()
    }
}

/// Injector that logs instead of synthesising input.
///
/// Keeps counters and the most recent typed text only, so a long-running
/// host on a platform without an input backend stays bounded.
#[derive(Debug, Default)]
pub struct LoggingInjector {
    pastes: AtomicUsize,
    typed: AtomicUsize,
    last_typed: Mutex<Option<String>>,
}

impl LoggingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paste_count(&self) -> usize {
        self.pastes.load(Ordering::SeqCst)
    }

    /// Number of [`InputInjector::send_typed_text`] calls.
    pub fn typed_count(&self) -> usize {
        self.typed.load(Ordering::SeqCst)
    }

    /// The text passed to the latest [`InputInjector::send_typed_text`] call.
    pub fn last_typed(&self) -> Option<String> {
        self.last_typed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl InputInjector for LoggingInjector {
    async fn send_paste_keystroke(&self) -> Result<(), ClipboardError> {
        let count = self.pastes.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "paste keystroke (Ctrl+V)");
        Ok(())
    }

    async fn send_typed_text(&self, text: &str) -> Result<(), ClipboardError> {
        let count = self.typed.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, chars = text.chars().count(), "typing text");
        *self
            .last_typed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipqueue_core::ClipboardPayload;

    #[tokio::test]
    async fn test_write_bumps_sequence_and_counts() {
        // Arrange
        let clipboard = MemoryClipboard::new();

        // Act
        clipboard.write(&ClipboardItem::text("a")).await.unwrap();
        clipboard.write(&ClipboardItem::text("b")).await.unwrap();

        // Assert
        assert_eq!(clipboard.change_sequence_number(), 2);
        assert_eq!(clipboard.write_count(), 2);
        assert_eq!(clipboard.current().as_text(), Some("b"));
    }

    #[tokio::test]
    async fn test_read_mints_fresh_item_with_same_payload() {
        // Arrange
        let clipboard = MemoryClipboard::new();
        let stored = ClipboardItem::text("hello");
        clipboard.set_external(stored.clone());

        // Act
        let first = clipboard.read().await.unwrap();
        let second = clipboard.read().await.unwrap();

        // Assert
        assert_eq!(first.payload, ClipboardPayload::Text("hello".to_string()));
        assert_ne!(first.id, stored.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_listener_fires_for_external_and_own_changes() {
        // Arrange
        let clipboard = MemoryClipboard::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        clipboard.set_change_listener(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // Act
        clipboard.set_external(ClipboardItem::text("user"));
        clipboard.write(&ClipboardItem::text("ours")).await.unwrap();

        // Assert
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(clipboard.write_count(), 1);
    }

    #[tokio::test]
    async fn test_logging_injector_records_calls() {
        // Arrange
        let injector = LoggingInjector::new();

        // Act
        injector.send_paste_keystroke().await.unwrap();
        injector.send_typed_text("hi").await.unwrap();

        // Assert
        assert_eq!(injector.paste_count(), 1);
        assert_eq!(injector.typed_count(), 1);
        assert_eq!(injector.last_typed().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_logging_injector_keeps_only_latest_text() {
        // Arrange
        let injector = LoggingInjector::new();

        // Act
        for i in 0..1000 {
            injector.send_typed_text(&format!("line {i}")).await.unwrap();
        }

        // Assert
        assert_eq!(injector.typed_count(), 1000);
        assert_eq!(injector.last_typed().as_deref(), Some("line 999"));
    }
}
