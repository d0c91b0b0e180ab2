//! Input capture infrastructure.
//!
//! On Windows, this installs low-level keyboard and mouse hooks
//! (`WH_KEYBOARD_LL`, `WH_MOUSE_LL`) on a dedicated Win32 message loop
//! thread.  Each event is handed to an [`EventHandler`] *inside* the hook
//! callback, and the handler's return value decides whether the event is
//! swallowed or passed on to the next hook.
//!
//! # Windows-Specific Implementation
//!
//! The hook callbacks must complete within ~300ms or Windows will remove the
//! hook.  Handlers therefore only classify the event; any real work is
//! spawned elsewhere (see [`crate::application::dispatch`]).
//!
//! # Testability
//!
//! The [`InputSource`] trait allows unit tests to inject synthetic events
//! through [`mock::MockInputSource`] without requiring Windows hooks.

use std::sync::Arc;

use clipqueue_core::signature::layout;
use clipqueue_core::{InputSignature, ModifierState};

use crate::application::dispatch::InputDispatcher;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// A raw input event produced by the input capture infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputEvent {
    /// A key transition, as reported by the keyboard hook.
    Key {
        /// Windows Virtual Key code.
        vk_code: u16,
        /// Hardware scan code.
        scan_code: u16,
        /// `KBDLLHOOKSTRUCT::flags` (extended, injected, transition bits).
        flags: u32,
        /// Window message: `WM_KEYDOWN`, `WM_KEYUP`, `WM_SYSKEYDOWN`, `WM_SYSKEYUP`.
        message: u16,
        /// Modifier keys held when the event fired.
        modifiers: ModifierState,
    },
    /// A mouse button was pressed.  Releases are not reported.
    MouseButtonDown {
        button: MouseButton,
        modifiers: ModifierState,
    },
    /// A mouse wheel notch.
    MouseWheel {
        /// Scroll delta; positive = away from user / right.
        delta: i16,
        horizontal: bool,
        modifiers: ModifierState,
    },
}

impl RawInputEvent {
    /// Key-down event with no extra flags.
    pub fn key_down(vk_code: u16, scan_code: u16, modifiers: ModifierState) -> Self {
        RawInputEvent::Key {
            vk_code,
            scan_code,
            flags: 0,
            message: layout::WM_KEYDOWN,
            modifiers,
        }
    }

    /// Key-up event (`LLKHF_UP` set).
    pub fn key_up(vk_code: u16, scan_code: u16, modifiers: ModifierState) -> Self {
        RawInputEvent::Key {
            vk_code,
            scan_code,
            flags: 0x80,
            message: layout::WM_KEYUP,
            modifiers,
        }
    }

    /// The canonical signature for this event.
    pub fn to_signature(&self) -> InputSignature {
        match *self {
            RawInputEvent::Key {
                vk_code,
                scan_code,
                flags,
                message,
                modifiers,
            } => InputSignature::keyboard(vk_code, scan_code, flags, message, modifiers),
            RawInputEvent::MouseButtonDown { button, modifiers } => {
                InputSignature::mouse_button(button.number(), modifiers)
            }
            RawInputEvent::MouseWheel {
                delta,
                horizontal,
                modifiers,
            } => InputSignature::mouse_wheel(delta, horizontal, modifiers),
        }
    }
}

/// Mouse button identifier used in [`RawInputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
    /// Any other button, by number.
    Other(u8),
}

impl MouseButton {
    /// Button number stored in a mouse-button signature.
    pub fn number(self) -> u8 {
        match self {
            MouseButton::Left => layout::MOUSE_LEFT,
            MouseButton::Right => layout::MOUSE_RIGHT,
            MouseButton::Middle => layout::MOUSE_MIDDLE,
            MouseButton::X1 => layout::MOUSE_X1,
            MouseButton::X2 => layout::MOUSE_X2,
            MouseButton::Other(n) => n,
        }
    }
}

/// Error type for input hook installation.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    KeyboardHookInstallFailed(String),
    #[error("failed to install mouse hook: {0}")]
    MouseHookInstallFailed(String),
    #[error("input source is already running")]
    AlreadyStarted,
}

/// Decides the fate of one event.  Returns `true` to swallow it.
pub type EventHandler = Arc<dyn Fn(&RawInputEvent) -> bool + Send + Sync>;

/// Trait abstracting input event production.
///
/// The production implementation uses Windows hooks; tests use [`mock::MockInputSource`].
pub trait InputSource: Send + Sync {
    /// Starts delivering events to `handler`.
    fn start(&self, handler: EventHandler) -> Result<(), HookError>;
    /// Stops the input source and releases all OS resources.
    fn stop(&self);
}

/// Handler that routes every event through `dispatcher`.
pub fn dispatch_handler(dispatcher: Arc<InputDispatcher>) -> EventHandler {
    Arc::new(move |event: &RawInputEvent| dispatcher.handle(&event.to_signature()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipqueue_core::SourceType;

    #[test]
    fn test_key_event_signature_matches_keyboard_layout() {
        // Arrange
        let mods = ModifierState(ModifierState::CTRL | ModifierState::ALT);
        let event = RawInputEvent::key_down(0x43, 0x2E, mods);

        // Act
        let sig = event.to_signature();

        // Assert
        assert_eq!(sig, InputSignature::keyboard(0x43, 0x2E, 0, layout::WM_KEYDOWN, mods));
        assert_eq!(sig.display_hint(), "Ctrl+Alt+C");
    }

    #[test]
    fn test_key_up_differs_from_key_down() {
        let down = RawInputEvent::key_down(0x43, 0x2E, ModifierState::NONE).to_signature();
        let up = RawInputEvent::key_up(0x43, 0x2E, ModifierState::NONE).to_signature();
        assert_ne!(down, up);
    }

    #[test]
    fn test_mouse_events_map_to_their_source_types() {
        // Arrange
        let button = RawInputEvent::MouseButtonDown {
            button: MouseButton::X2,
            modifiers: ModifierState::NONE,
        };
        let wheel = RawInputEvent::MouseWheel {
            delta: -120,
            horizontal: false,
            modifiers: ModifierState(ModifierState::SHIFT),
        };

        // Act
        let button_sig = button.to_signature();
        let wheel_sig = wheel.to_signature();

        // Assert
        assert_eq!(button_sig.source_type(), SourceType::MouseButton);
        assert_eq!(button_sig.raw_data(), &[layout::MOUSE_X2]);
        assert_eq!(wheel_sig.source_type(), SourceType::MouseWheel);
        assert_eq!(wheel_sig.modifiers(), ModifierState(ModifierState::SHIFT));
    }

    #[test]
    fn test_other_button_keeps_its_number() {
        assert_eq!(MouseButton::Other(9).number(), 9);
        assert_eq!(MouseButton::Middle.number(), layout::MOUSE_MIDDLE);
    }
}
