//! Key name tables.
//!
//! Signatures store platform key codes (Windows virtual keys for keyboard
//! events).  This module turns those codes into names for display hints and
//! back again for the legacy `"Ctrl+Alt+C"` hotkey form.

pub mod hotkey;
pub mod windows_vk;

pub use windows_vk::is_modifier_vk;

/// Unified key mapper providing both lookup directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Canonical name of a Windows virtual-key code.
    ///
    /// Returns `None` if no name exists for `vk`.
    pub fn vk_to_name(vk: u16) -> Option<&'static str> {
        windows_vk::vk_to_name(vk)
    }

    /// Windows virtual-key code for a key name (ASCII case-insensitive).
    ///
    /// Returns `None` if the name is unknown.
    pub fn name_to_vk(name: &str) -> Option<u16> {
        windows_vk::name_to_vk(name)
    }

    /// `true` if `vk` is a Shift, Ctrl, Alt or Win key.
    pub fn is_modifier_vk(vk: u16) -> bool {
        windows_vk::is_modifier_vk(vk)
    }
}
