//! Raw-data layouts for each [`SourceType`](super::SourceType).
//!
//! The signature treats `raw_data` as opaque bytes; the layouts below are the
//! contract between the input hook adapters (which build the bytes) and the
//! display-hint / legacy-matching code (which reads them back).
//!
//! ```text
//! Keyboard:     [vk:2 LE][scan_code:2 LE][flags:4 LE][message:2 LE]   10 bytes
//! Legacy key:   [vk:2 LE]                                             2 bytes
//! MouseButton:  [button:1]                                            1 byte
//! MouseWheel:   [delta:2 LE i16][axis:1]  axis 0 = vertical, 1 = horizontal
//! ```
//!
//! All multi-byte integers are little-endian.

/// Window message for a plain key press.
pub const WM_KEYDOWN: u16 = 0x0100;
/// Window message for a plain key release.
pub const WM_KEYUP: u16 = 0x0101;
/// Window message for a key press while Alt is held (or F10).
pub const WM_SYSKEYDOWN: u16 = 0x0104;
/// Window message for a key release while Alt is held.
pub const WM_SYSKEYUP: u16 = 0x0105;

/// Length of the full keyboard layout.
pub const KEYBOARD_RAW_LEN: usize = 10;
/// Length of the legacy (virtual-key only) keyboard layout.
pub const LEGACY_KEY_RAW_LEN: usize = 2;

/// Mouse button numbers used in the [`mouse_button`] layout.
pub const MOUSE_LEFT: u8 = 1;
pub const MOUSE_RIGHT: u8 = 2;
pub const MOUSE_MIDDLE: u8 = 3;
pub const MOUSE_X1: u8 = 4;
pub const MOUSE_X2: u8 = 5;

/// Wheel axis byte values.
pub const WHEEL_VERTICAL: u8 = 0;
pub const WHEEL_HORIZONTAL: u8 = 1;

/// Builds the 10-byte keyboard layout.
pub fn keyboard(vk: u16, scan_code: u16, flags: u32, message: u16) -> Vec<u8> {
    let mut raw = Vec::with_capacity(KEYBOARD_RAW_LEN);
    raw.extend_from_slice(&vk.to_le_bytes());
    raw.extend_from_slice(&scan_code.to_le_bytes());
    raw.extend_from_slice(&flags.to_le_bytes());
    raw.extend_from_slice(&message.to_le_bytes());
    raw
}

/// Builds the 2-byte legacy keyboard layout (virtual key only).
pub fn legacy_key(vk: u16) -> Vec<u8> {
    vk.to_le_bytes().to_vec()
}

/// Builds the 1-byte mouse button layout.
pub fn mouse_button(button: u8) -> Vec<u8> {
    vec![button]
}

/// Builds the 3-byte mouse wheel layout.
pub fn mouse_wheel(delta: i16, horizontal: bool) -> Vec<u8> {
    let mut raw = Vec::with_capacity(3);
    raw.extend_from_slice(&delta.to_le_bytes());
    raw.push(if horizontal {
        WHEEL_HORIZONTAL
    } else {
        WHEEL_VERTICAL
    });
    raw
}

/// Reads a little-endian `u16` at `offset`, if present.
pub(crate) fn read_u16(raw: &[u8], offset: usize) -> Option<u16> {
    let bytes = raw.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Returns `true` if `message` is a key-press message.
pub fn is_key_down_message(message: u16) -> bool {
    matches!(message, WM_KEYDOWN | WM_SYSKEYDOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_layout_is_little_endian_and_ten_bytes() {
        let raw = keyboard(0x43, 0x2E, 0, WM_KEYDOWN);

        assert_eq!(raw.len(), KEYBOARD_RAW_LEN);
        assert_eq!(raw, vec![0x43, 0x00, 0x2E, 0x00, 0, 0, 0, 0, 0x00, 0x01]);
    }

    #[test]
    fn test_mouse_wheel_layout_encodes_axis() {
        assert_eq!(mouse_wheel(120, false), vec![120, 0, WHEEL_VERTICAL]);
        assert_eq!(mouse_wheel(-120, true), vec![0x88, 0xFF, WHEEL_HORIZONTAL]);
    }

    #[test]
    fn test_read_u16_returns_none_when_truncated() {
        assert_eq!(read_u16(&[0x41], 0), None);
        assert_eq!(read_u16(&[0x41, 0x00], 0), Some(0x41));
    }

    #[test]
    fn test_key_down_messages() {
        assert!(is_key_down_message(WM_KEYDOWN));
        assert!(is_key_down_message(WM_SYSKEYDOWN));
        assert!(!is_key_down_message(WM_KEYUP));
        assert!(!is_key_down_message(WM_SYSKEYUP));
    }
}
