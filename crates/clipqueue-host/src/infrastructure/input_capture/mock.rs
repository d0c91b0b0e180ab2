//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without requiring
//! a running Windows message loop or OS hooks.

use std::sync::{Arc, Mutex, PoisonError};

use super::{EventHandler, HookError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    handler: Arc<Mutex<Option<EventHandler>>>,
    suppress_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            handler: Arc::new(Mutex::new(None)),
            suppress_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Returns the handler's verdict (`true` = swallowed).  Events injected
    /// while stopped are passed through.
    pub fn inject_event(&self, event: RawInputEvent) -> bool {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let consumed = handler.map(|h| h(&event)).unwrap_or(false);
        if consumed {
            *self
                .suppress_count
                .lock()
                .unwrap_or_else(PoisonError::into_inner) += 1;
        }
        consumed
    }

    /// Returns how many injected events the handler swallowed.
    pub fn suppress_count(&self) -> u32 {
        *self
            .suppress_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self, handler: EventHandler) -> Result<(), HookError> {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(HookError::AlreadyStarted);
        }
        *slot = Some(handler);
        Ok(())
    }

    fn stop(&self) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_capture::MouseButton;
    use clipqueue_core::ModifierState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn swallow_vk(vk: u16) -> EventHandler {
        Arc::new(move |event: &RawInputEvent| {
            matches!(event, RawInputEvent::Key { vk_code, .. } if *vk_code == vk)
        })
    }

    #[test]
    fn test_mock_input_source_delivers_events_to_handler() {
        // Arrange
        let source = MockInputSource::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        source
            .start(Arc::new(move |_: &RawInputEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }))
            .expect("start should succeed");

        // Act
        source.inject_event(RawInputEvent::key_down(0x41, 0x1E, ModifierState::NONE));
        source.inject_event(RawInputEvent::MouseButtonDown {
            button: MouseButton::Left,
            modifiers: ModifierState::NONE,
        });

        // Assert
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(source.suppress_count(), 0);
    }

    #[test]
    fn test_mock_input_source_counts_swallowed_events() {
        // Arrange
        let source = MockInputSource::new();
        source.start(swallow_vk(0x43)).expect("start should succeed");

        // Act
        let swallowed = source.inject_event(RawInputEvent::key_down(0x43, 0x2E, ModifierState::NONE));
        let passed = source.inject_event(RawInputEvent::key_down(0x44, 0x20, ModifierState::NONE));

        // Assert
        assert!(swallowed);
        assert!(!passed);
        assert_eq!(source.suppress_count(), 1);
    }

    #[test]
    fn test_mock_input_source_stop_passes_events_through() {
        // Arrange
        let source = MockInputSource::new();
        source.start(swallow_vk(0x43)).expect("start should succeed");

        // Act
        source.stop();
        let consumed = source.inject_event(RawInputEvent::key_down(0x43, 0x2E, ModifierState::NONE));

        // Assert
        assert!(!consumed);
        assert!(!source.is_running());
    }

    #[test]
    fn test_mock_input_source_rejects_second_start() {
        // Arrange
        let source = MockInputSource::new();
        source.start(swallow_vk(0x43)).expect("start should succeed");

        // Act
        let result = source.start(swallow_vk(0x44));

        // Assert
        assert!(matches!(result, Err(HookError::AlreadyStarted)));
    }
}
