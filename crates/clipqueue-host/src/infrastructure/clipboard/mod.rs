//! Clipboard backends and keystroke injectors.
//!
//! The application layer only sees [`ClipboardBackend`] and
//! [`InputInjector`].  On Windows, `windows::WindowsClipboard` and
//! `windows::SendInputInjector` talk to the system clipboard and
//! synthesise keystrokes.  Elsewhere, and in tests, the in-process
//! implementations stand in:
//!
//! - [`MemoryClipboard`] keeps the content in memory, bumps a change
//!   sequence number on every change and fires a change listener the way
//!   the OS posts a clipboard-update message.
//! - [`LoggingInjector`] logs paste keystrokes and typed text instead of
//!   synthesising real input.
//!
//! [`ClipboardBackend`]: crate::application::queue_controller::ClipboardBackend
//! [`InputInjector`]: crate::application::queue_controller::InputInjector

pub mod memory;
#[cfg(target_os = "windows")]
pub mod windows;

pub use memory::{ChangeListener, LoggingInjector, MemoryClipboard};
