//! Integration tests for signature storage and matching.
//!
//! These exercise the public API end to end: signatures built the way the
//! input hook builds them are stored as hotkey strings, parsed back, and
//! matched through the registry.

use clipqueue_core::signature::codec::{decode_signature, encode_signature};
use clipqueue_core::signature::layout;
use clipqueue_core::{
    format_hotkey, parse_hotkey, InputSignature, ModifierState, ParseError, SignatureMatcher,
    SourceType,
};

/// One signature of every source type, with assorted modifiers.
fn sample_signatures() -> Vec<InputSignature> {
    vec![
        InputSignature::keyboard(0x43, 0x2E, 0, layout::WM_KEYDOWN, ModifierState(0x03)),
        InputSignature::keyboard(0xAF, 0x30, 0x01, layout::WM_KEYUP, ModifierState::NONE),
        InputSignature::legacy_key(0x70, ModifierState(ModifierState::WIN)),
        InputSignature::mouse_button(layout::MOUSE_X2, ModifierState(ModifierState::SHIFT)),
        InputSignature::mouse_wheel(-240, false, ModifierState::NONE),
        InputSignature::new(SourceType::Hid, &[0x05, 0x01, 0xFF, 0x00], ModifierState(0x80)),
        InputSignature::new(SourceType::Unknown, &[], ModifierState::NONE),
    ]
}

#[test]
fn test_bytes_roundtrip_for_every_source_type() {
    for original in sample_signatures() {
        let decoded = decode_signature(&encode_signature(&original)).expect("decode must succeed");

        assert_eq!(decoded, original);
        assert_eq!(decoded.hash(), original.hash());
        assert_eq!(decoded.display_hint(), original.display_hint());
    }
}

#[test]
fn test_hotkey_string_roundtrip_for_every_source_type() {
    for original in sample_signatures() {
        let stored = format_hotkey(&original);
        assert_eq!(parse_hotkey(&stored).expect("parse must succeed"), original);
    }
}

#[test]
fn test_truncated_storage_is_rejected() {
    let sig = InputSignature::keyboard(0x43, 0x2E, 0, layout::WM_KEYDOWN, ModifierState(0x03));
    let bytes = sig.to_bytes();

    let result = InputSignature::from_bytes(&bytes[..bytes.len() - 1]);

    assert_eq!(
        result,
        Err(ParseError::PayloadLengthMismatch {
            declared: layout::KEYBOARD_RAW_LEN,
            available: layout::KEYBOARD_RAW_LEN - 1,
        })
    );
}

#[test]
fn test_matcher_finds_each_stored_hotkey_and_nothing_else() {
    // Arrange: register every sample under its stored string form.
    let matcher = SignatureMatcher::new();
    for (index, sig) in sample_signatures().iter().enumerate() {
        let parsed = parse_hotkey(&format_hotkey(sig)).expect("parse must succeed");
        matcher.register(parsed, format!("binding-{index}"), index);
    }

    // Act / Assert
    for (index, sig) in sample_signatures().iter().enumerate() {
        assert_eq!(matcher.match_signature(sig), Some(index));
    }
    let unbound = InputSignature::mouse_button(layout::MOUSE_LEFT, ModifierState::NONE);
    assert_eq!(matcher.match_signature(&unbound), None);
}

#[test]
fn test_legacy_hotkey_matches_reduced_key_press() {
    // Arrange
    let matcher = SignatureMatcher::new();
    matcher.register(parse_hotkey("Ctrl+Alt+C").unwrap(), "toggle_queue", "toggle");
    let press = InputSignature::keyboard(
        0x43,
        0x2E,
        0,
        layout::WM_KEYDOWN,
        ModifierState(ModifierState::CTRL | ModifierState::ALT),
    );

    // Act
    let direct = matcher.match_signature(&press);
    let reduced = press
        .legacy_key_form()
        .and_then(|legacy| matcher.match_signature(&legacy));

    // Assert
    assert_eq!(direct, None);
    assert_eq!(reduced, Some("toggle"));
}
