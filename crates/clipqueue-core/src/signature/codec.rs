//! Binary and text codec for [`InputSignature`].
//!
//! Storage format:
//! ```text
//! [version:1][source_type:1][modifiers:1][raw_len:2 LE][raw_data:N]
//! ```
//! Header size: 5 bytes (a 4-byte header-only input is accepted as an empty
//! payload).  `hash` and `display_hint` are not stored; they are recomputed
//! on decode.  The text form is standard base64 of the binary form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use super::{InputSignature, ModifierState, SourceType};

/// Current storage format version.
pub const SIGNATURE_FORMAT_VERSION: u8 = 1;

/// Bytes preceding the raw payload.
pub const SIGNATURE_HEADER_SIZE: usize = 5;

/// Smallest input [`decode_signature`] will look at.
const MIN_SIGNATURE_LEN: usize = 4;

/// Errors produced while decoding signatures or parsing hotkey strings.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// The byte slice is shorter than the fixed header.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The version byte is not one this build understands.
    #[error("unsupported signature version: {0}")]
    UnsupportedVersion(u8),

    /// The length field claims more raw bytes than the input holds.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The text form is not valid base64.
    #[error("invalid base64 signature: {0}")]
    InvalidBase64(String),

    /// A hotkey token is neither a modifier nor a known key name.
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    /// A hotkey string names only modifiers.
    #[error("hotkey has no key: {0}")]
    MissingKey(String),

    /// A hotkey string is empty or whitespace.
    #[error("hotkey string is empty")]
    EmptyHotkey,
}

/// Serialises `sig` into the versioned binary layout.
///
/// # Examples
///
/// ```rust
/// use clipqueue_core::signature::codec::{decode_signature, encode_signature};
/// use clipqueue_core::{InputSignature, ModifierState};
///
/// let sig = InputSignature::mouse_button(4, ModifierState::NONE);
/// let bytes = encode_signature(&sig);
/// assert_eq!(decode_signature(&bytes).unwrap(), sig);
/// ```
pub fn encode_signature(sig: &InputSignature) -> Vec<u8> {
    let raw = sig.raw_data();
    // Construction clamps raw_data, so the length always fits.
    let raw_len = raw.len() as u16;

    let mut buf = Vec::with_capacity(SIGNATURE_HEADER_SIZE + raw.len());
    buf.push(SIGNATURE_FORMAT_VERSION);
    buf.push(sig.source_type() as u8);
    buf.push(sig.modifiers().bits());
    buf.extend_from_slice(&raw_len.to_le_bytes());
    buf.extend_from_slice(raw);
    buf
}

/// Parses the versioned binary layout back into a signature.
///
/// Trailing bytes beyond the declared payload are ignored.
///
/// # Errors
///
/// - [`ParseError::InsufficientData`] if fewer than 4 bytes are supplied.
/// - [`ParseError::UnsupportedVersion`] if the version byte is not 1.
/// - [`ParseError::PayloadLengthMismatch`] if the declared length exceeds
///   the bytes available.
pub fn decode_signature(bytes: &[u8]) -> Result<InputSignature, ParseError> {
    if bytes.len() < MIN_SIGNATURE_LEN {
        return Err(ParseError::InsufficientData {
            needed: MIN_SIGNATURE_LEN,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != SIGNATURE_FORMAT_VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let source_type = SourceType::from(bytes[1]);
    let modifiers = ModifierState(bytes[2]);

    if bytes.len() < SIGNATURE_HEADER_SIZE {
        return Ok(InputSignature::new(source_type, &[], modifiers));
    }

    let declared = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;
    let available = bytes.len() - SIGNATURE_HEADER_SIZE;
    if declared > available {
        return Err(ParseError::PayloadLengthMismatch {
            declared,
            available,
        });
    }

    let raw = &bytes[SIGNATURE_HEADER_SIZE..SIGNATURE_HEADER_SIZE + declared];
    Ok(InputSignature::new(source_type, raw, modifiers))
}

/// Base64 text form of [`encode_signature`].
pub fn signature_to_base64(sig: &InputSignature) -> String {
    STANDARD.encode(encode_signature(sig))
}

/// Decodes the base64 text form.
///
/// # Errors
///
/// [`ParseError::InvalidBase64`] for malformed text, otherwise any error from
/// [`decode_signature`].
pub fn signature_from_base64(text: &str) -> Result<InputSignature, ParseError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| ParseError::InvalidBase64(e.to_string()))?;
    decode_signature(&bytes)
}

impl InputSignature {
    /// See [`encode_signature`].
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_signature(self)
    }

    /// See [`decode_signature`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        decode_signature(bytes)
    }

    /// See [`signature_to_base64`].
    pub fn to_base64(&self) -> String {
        signature_to_base64(self)
    }

    /// See [`signature_from_base64`].
    pub fn from_base64(text: &str) -> Result<Self, ParseError> {
        signature_from_base64(text)
    }
}
