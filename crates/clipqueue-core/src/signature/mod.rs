//! Canonical input signatures.
//!
//! An [`InputSignature`] is the identity of one physical input event: where
//! it came from ([`SourceType`]), which modifiers were held
//! ([`ModifierState`]) and an opaque payload whose meaning depends on the
//! source (see [`layout`]).  Signatures are what hotkeys are bound to.
//!
//! # Identity
//!
//! Two signatures are equal iff source, modifiers and raw bytes are equal.
//! The 64-bit FNV-1a `hash` is only a bucket key: equality always re-checks
//! the raw bytes, so two different events that happen to share a hash never
//! compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::keymap::{self, KeyMapper};

pub mod codec;
pub mod layout;

/// Longest raw payload a signature can hold (the serialized length field is a `u16`).
pub const MAX_RAW_DATA_LEN: usize = u16::MAX as usize;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Origin of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SourceType {
    Keyboard = 0,
    MouseButton = 1,
    MouseWheel = 2,
    Hid = 3,
    Unknown = 4,
}

impl From<u8> for SourceType {
    /// Unrecognised bytes decode as [`SourceType::Unknown`].
    fn from(value: u8) -> Self {
        match value {
            0 => SourceType::Keyboard,
            1 => SourceType::MouseButton,
            2 => SourceType::MouseWheel,
            3 => SourceType::Hid,
            _ => SourceType::Unknown,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Keyboard => "Keyboard",
            SourceType::MouseButton => "Mouse",
            SourceType::MouseWheel => "Wheel",
            SourceType::Hid => "HID",
            SourceType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Bitset of the modifiers held when the event fired.
///
/// Only the low four bits have names; the remaining bits are carried through
/// serialization untouched so a stored signature always round-trips exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierState(pub u8);

impl ModifierState {
    pub const CTRL: u8 = 1 << 0;
    pub const ALT: u8 = 1 << 1;
    pub const SHIFT: u8 = 1 << 2;
    pub const WIN: u8 = 1 << 3;

    /// No modifiers held.
    pub const NONE: ModifierState = ModifierState(0);

    pub fn ctrl(&self) -> bool {
        self.0 & Self::CTRL != 0
    }

    pub fn alt(&self) -> bool {
        self.0 & Self::ALT != 0
    }

    pub fn shift(&self) -> bool {
        self.0 & Self::SHIFT != 0
    }

    pub fn win(&self) -> bool {
        self.0 & Self::WIN != 0
    }

    /// Returns a copy with `flag` set.
    pub fn with(self, flag: u8) -> Self {
        ModifierState(self.0 | flag)
    }

    /// Raw bit pattern.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Names of the held modifiers in canonical order (Ctrl, Alt, Shift, Win).
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        if self.ctrl() {
            names.push("Ctrl");
        }
        if self.alt() {
            names.push("Alt");
        }
        if self.shift() {
            names.push("Shift");
        }
        if self.win() {
            names.push("Win");
        }
        names
    }
}

/// Canonical, hashable representation of one physical input event.
///
/// Construct with [`InputSignature::new`] or one of the per-source helpers.
/// The value is immutable; `hash` and `display_hint` are derived at
/// construction and never transported by the codec.
#[derive(Debug, Clone)]
pub struct InputSignature {
    source_type: SourceType,
    modifiers: ModifierState,
    raw_data: Vec<u8>,
    hash: u64,
    display_hint: String,
}

impl InputSignature {
    /// Builds a signature from a source, a raw payload and the modifier state.
    ///
    /// `raw_data` is copied, so the caller's buffer can be reused.  Payloads
    /// longer than [`MAX_RAW_DATA_LEN`] are truncated to fit the codec.
    pub fn new(source_type: SourceType, raw_data: &[u8], modifiers: ModifierState) -> Self {
        let len = raw_data.len().min(MAX_RAW_DATA_LEN);
        let raw_data = raw_data[..len].to_vec();
        let hash = compute_hash(source_type, modifiers, &raw_data);
        let display_hint = display_hint(source_type, modifiers, &raw_data, hash);
        Self {
            source_type,
            modifiers,
            raw_data,
            hash,
            display_hint,
        }
    }

    /// Keyboard event in the full 10-byte layout.
    pub fn keyboard(
        vk: u16,
        scan_code: u16,
        flags: u32,
        message: u16,
        modifiers: ModifierState,
    ) -> Self {
        Self::new(
            SourceType::Keyboard,
            &layout::keyboard(vk, scan_code, flags, message),
            modifiers,
        )
    }

    /// Keyboard signature carrying only the virtual-key code (legacy hotkey form).
    pub fn legacy_key(vk: u16, modifiers: ModifierState) -> Self {
        Self::new(SourceType::Keyboard, &layout::legacy_key(vk), modifiers)
    }

    /// Mouse button press.
    pub fn mouse_button(button: u8, modifiers: ModifierState) -> Self {
        Self::new(
            SourceType::MouseButton,
            &layout::mouse_button(button),
            modifiers,
        )
    }

    /// Mouse wheel notch.
    pub fn mouse_wheel(delta: i16, horizontal: bool, modifiers: ModifierState) -> Self {
        Self::new(
            SourceType::MouseWheel,
            &layout::mouse_wheel(delta, horizontal),
            modifiers,
        )
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    /// FNV-1a 64 over `source ‖ modifiers ‖ raw_data`.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Human-readable label such as `"Ctrl+Alt+C"`.  Not part of identity.
    pub fn display_hint(&self) -> &str {
        &self.display_hint
    }

    /// Structural equality: hash, source, modifiers and every raw byte.
    pub fn equals(&self, other: &InputSignature) -> bool {
        self.hash == other.hash
            && self.source_type == other.source_type
            && self.modifiers == other.modifiers
            && self.raw_data == other.raw_data
    }

    /// Virtual-key code of a keyboard signature.
    pub fn virtual_key(&self) -> Option<u16> {
        if self.source_type != SourceType::Keyboard {
            return None;
        }
        layout::read_u16(&self.raw_data, 0)
    }

    /// Window message kind of a full-layout keyboard signature.
    pub fn key_message(&self) -> Option<u16> {
        if self.source_type != SourceType::Keyboard || self.raw_data.len() < layout::KEYBOARD_RAW_LEN
        {
            return None;
        }
        layout::read_u16(&self.raw_data, 8)
    }

    /// `true` for a keyboard event whose key is Ctrl, Alt, Shift or Win alone.
    pub fn is_bare_modifier(&self) -> bool {
        self.virtual_key()
            .map(keymap::is_modifier_vk)
            .unwrap_or(false)
    }

    /// Reduces a full-layout key-press signature to the legacy virtual-key form.
    ///
    /// Returns `None` for non-keyboard signatures, key releases, and
    /// signatures that are already in the legacy layout.
    pub fn legacy_key_form(&self) -> Option<InputSignature> {
        let message = self.key_message()?;
        if !layout::is_key_down_message(message) {
            return None;
        }
        let vk = self.virtual_key()?;
        Some(InputSignature::legacy_key(vk, self.modifiers))
    }
}

impl PartialEq for InputSignature {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for InputSignature {}

impl Hash for InputSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for InputSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_hint)
    }
}

fn compute_hash(source_type: SourceType, modifiers: ModifierState, raw_data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let header = [source_type as u8, modifiers.bits()];
    for &byte in header.iter().chain(raw_data.iter()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn display_hint(
    source_type: SourceType,
    modifiers: ModifierState,
    raw_data: &[u8],
    hash: u64,
) -> String {
    let mut parts: Vec<String> = modifiers.names().into_iter().map(String::from).collect();

    let input = match source_type {
        SourceType::Keyboard => match layout::read_u16(raw_data, 0) {
            Some(vk) => match KeyMapper::vk_to_name(vk) {
                Some(name) => name.to_string(),
                None => format!("Key[0x{vk:X}]"),
            },
            None => "Key[?]".to_string(),
        },
        SourceType::MouseButton => match raw_data.first() {
            Some(button) => format!("Mouse{button}"),
            None => "Mouse[?]".to_string(),
        },
        SourceType::MouseWheel => match layout::read_u16(raw_data, 0) {
            Some(bits) => {
                let delta = bits as i16;
                let horizontal = raw_data.get(2) == Some(&layout::WHEEL_HORIZONTAL);
                match (horizontal, delta > 0) {
                    (false, true) => "WheelUp",
                    (false, false) => "WheelDown",
                    (true, true) => "WheelRight",
                    (true, false) => "WheelLeft",
                }
                .to_string()
            }
            None => "Wheel[?]".to_string(),
        },
        SourceType::Hid => match raw_data.first() {
            Some(first) => format!("HID[{first:X}...]"),
            None => "HID[?]".to_string(),
        },
        SourceType::Unknown => format!("Input[0x{:X}]", hash & 0xFFFF),
    };
    parts.push(input);
    parts.join("+")
}
