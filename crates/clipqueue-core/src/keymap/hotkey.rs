//! Hotkey strings.
//!
//! Two forms are accepted wherever a hotkey is configured:
//!
//! - `"sig:<base64>"` – a serialized [`InputSignature`]; can describe any
//!   input source (mouse buttons, wheel, media keys with exact scan codes).
//! - `"Ctrl+Alt+C"` – modifier words followed by one key name.  This yields a
//!   keyboard signature that carries only the virtual-key code, which the
//!   dispatcher matches against the reduced form of key-press events.

use crate::signature::codec::ParseError;
use crate::signature::{InputSignature, ModifierState};

use super::KeyMapper;

/// Prefix marking the serialized signature form.
pub const SIGNATURE_PREFIX: &str = "sig:";

/// Parses either hotkey form into a signature.
///
/// Tokens are separated by `+` and compared case-insensitively.  When more
/// than one non-modifier key is named, the last one wins.
///
/// # Errors
///
/// - [`ParseError::EmptyHotkey`] for an empty or blank string.
/// - [`ParseError::UnknownKey`] for a token that is neither a modifier nor a
///   known key name.
/// - [`ParseError::MissingKey`] when only modifiers are given.
/// - Any codec error for a malformed `sig:` payload.
///
/// # Examples
///
/// ```rust
/// use clipqueue_core::parse_hotkey;
///
/// let sig = parse_hotkey("Ctrl+Alt+C").unwrap();
/// assert_eq!(sig.display_hint(), "Ctrl+Alt+C");
/// ```
pub fn parse_hotkey(text: &str) -> Result<InputSignature, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyHotkey);
    }

    if let Some(encoded) = text.strip_prefix(SIGNATURE_PREFIX) {
        return InputSignature::from_base64(encoded);
    }

    let mut modifiers = ModifierState::NONE;
    let mut vk = None;

    for token in text.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        match token.to_ascii_uppercase().as_str() {
            "CTRL" | "CONTROL" => modifiers = modifiers.with(ModifierState::CTRL),
            "ALT" => modifiers = modifiers.with(ModifierState::ALT),
            "SHIFT" => modifiers = modifiers.with(ModifierState::SHIFT),
            "WIN" => modifiers = modifiers.with(ModifierState::WIN),
            _ => match KeyMapper::name_to_vk(token) {
                Some(code) => vk = Some(code),
                None => return Err(ParseError::UnknownKey(token.to_string())),
            },
        }
    }

    match vk {
        Some(vk) => Ok(InputSignature::legacy_key(vk, modifiers)),
        None => Err(ParseError::MissingKey(text.to_string())),
    }
}

/// Storable string for `sig` (always the `sig:` form).
pub fn format_hotkey(sig: &InputSignature) -> String {
    format!("{SIGNATURE_PREFIX}{}", sig.to_base64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{layout, SourceType};

    #[test]
    fn test_parse_legacy_form() {
        // Act
        let sig = parse_hotkey("Ctrl+Alt+C").unwrap();

        // Assert
        assert_eq!(sig.source_type(), SourceType::Keyboard);
        assert_eq!(sig.virtual_key(), Some(0x43));
        assert_eq!(
            sig.modifiers(),
            ModifierState(ModifierState::CTRL | ModifierState::ALT)
        );
        assert_eq!(sig.raw_data().len(), layout::LEGACY_KEY_RAW_LEN);
    }

    #[test]
    fn test_parse_legacy_form_is_case_and_space_insensitive() {
        let a = parse_hotkey(" ctrl + shift + f5 ").unwrap();
        let b = parse_hotkey("CONTROL+SHIFT+F5").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_media_key_aliases() {
        let sig = parse_hotkey("AudioVolumeUp").unwrap();
        assert_eq!(sig.virtual_key(), Some(0xAF));
        assert_eq!(sig.display_hint(), "VolumeUp");
    }

    #[test]
    fn test_parse_unknown_key_fails() {
        assert_eq!(
            parse_hotkey("Ctrl+Hyper"),
            Err(ParseError::UnknownKey("Hyper".to_string()))
        );
    }

    #[test]
    fn test_parse_modifiers_only_fails() {
        assert!(matches!(
            parse_hotkey("Ctrl+Alt"),
            Err(ParseError::MissingKey(_))
        ));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(parse_hotkey("   "), Err(ParseError::EmptyHotkey));
    }

    #[test]
    fn test_parse_signature_form() {
        let sig = parse_hotkey("sig:AQADCgBDAC4AAAAAAAAB").unwrap();
        assert_eq!(sig.display_hint(), "Ctrl+Alt+C");
        assert_eq!(sig.raw_data().len(), layout::KEYBOARD_RAW_LEN);
    }

    #[test]
    fn test_format_then_parse_yields_same_signature() {
        // Arrange
        let sig = InputSignature::mouse_wheel(-120, true, ModifierState(ModifierState::SHIFT));

        // Act
        let text = format_hotkey(&sig);

        // Assert
        assert!(text.starts_with(SIGNATURE_PREFIX));
        assert_eq!(parse_hotkey(&text).unwrap(), sig);
    }

    #[test]
    fn test_legacy_form_matches_reduced_key_press() {
        let legacy = parse_hotkey("Ctrl+Alt+V").unwrap();
        let pressed = InputSignature::keyboard(
            0x56,
            0x2F,
            0,
            layout::WM_KEYDOWN,
            ModifierState(ModifierState::CTRL | ModifierState::ALT),
        );

        assert_ne!(pressed, legacy);
        assert_eq!(pressed.legacy_key_form(), Some(legacy));
    }
}
