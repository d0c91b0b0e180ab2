//! Clipboard content model.
//!
//! A [`ClipboardItem`] is an immutable snapshot of the system clipboard as
//! read by a backend: one payload (text, a file list or a PNG image) plus
//! derived metadata used by the history view and by de-duplication.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest text preview, in characters, before an ellipsis is appended.
pub const TEXT_PREVIEW_CHARS: usize = 80;

/// File names shown in a file-list preview before it is elided.
pub const FILES_PREVIEW_COUNT: usize = 3;

/// Size of the `DROPFILES` header that precedes a file list on the clipboard.
const DROPFILES_HEADER_SIZE: usize = 20;

/// Kind of clipboard content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Empty,
    Text,
    Files,
    Image,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Empty => "Empty",
            ContentType::Text => "Text",
            ContentType::Files => "Files",
            ContentType::Image => "Image",
        };
        f.write_str(name)
    }
}

/// Clipboard data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardPayload {
    Empty,
    Text(String),
    /// Absolute paths, in clipboard order.
    Files(Vec<String>),
    /// PNG-encoded image.
    Image(Vec<u8>),
}

impl ClipboardPayload {
    pub fn content_type(&self) -> ContentType {
        match self {
            ClipboardPayload::Empty => ContentType::Empty,
            ClipboardPayload::Text(_) => ContentType::Text,
            ClipboardPayload::Files(_) => ContentType::Files,
            ClipboardPayload::Image(_) => ContentType::Image,
        }
    }

    /// Size of the payload as the clipboard stores it.
    ///
    /// Text counts UTF-8 bytes.  File lists are estimated as the
    /// `CF_HDROP` block (UTF-16 paths, NUL separators, header) without
    /// touching the file system.
    pub fn size_bytes(&self) -> usize {
        match self {
            ClipboardPayload::Empty => 0,
            ClipboardPayload::Text(text) => text.len(),
            ClipboardPayload::Files(files) => {
                let paths: usize = files
                    .iter()
                    .map(|f| (f.encode_utf16().count() + 1) * 2)
                    .sum();
                paths + 2 + DROPFILES_HEADER_SIZE
            }
            ClipboardPayload::Image(png) => png.len(),
        }
    }

    /// Short human-readable description for lists and logs.
    pub fn preview(&self) -> String {
        match self {
            ClipboardPayload::Empty => "Empty clipboard".to_string(),
            ClipboardPayload::Text(text) => text_preview(text),
            ClipboardPayload::Files(files) => files_preview(files),
            ClipboardPayload::Image(png) => match png_dimensions(png) {
                Some((width, height)) => format!("{width}x{height} PNG"),
                None => "Invalid PNG image".to_string(),
            },
        }
    }
}

/// One clipboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardItem {
    /// Stable unique id (UUID v4) used by copy-by-id.
    pub id: String,
    pub payload: ClipboardPayload,
    pub size_bytes: usize,
    pub preview: String,
    pub timestamp: SystemTime,
}

impl ClipboardItem {
    /// Wraps `payload` with a fresh id, its derived metadata and the current time.
    pub fn new(payload: ClipboardPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            size_bytes: payload.size_bytes(),
            preview: payload.preview(),
            payload,
            timestamp: SystemTime::now(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ClipboardPayload::Text(text.into()))
    }

    pub fn files(files: Vec<String>) -> Self {
        Self::new(ClipboardPayload::Files(files))
    }

    pub fn image(png: Vec<u8>) -> Self {
        Self::new(ClipboardPayload::Image(png))
    }

    pub fn empty() -> Self {
        Self::new(ClipboardPayload::Empty)
    }

    pub fn content_type(&self) -> ContentType {
        self.payload.content_type()
    }

    pub fn is_empty(&self) -> bool {
        self.content_type() == ContentType::Empty
    }

    /// Text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            ClipboardPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Echo test used by de-duplication: same type, and equal text for text
    /// items or equal size for everything else.
    pub fn same_content(&self, other: &ClipboardItem) -> bool {
        if self.content_type() != other.content_type() {
            return false;
        }
        match (&self.payload, &other.payload) {
            (ClipboardPayload::Text(a), ClipboardPayload::Text(b)) => a == b,
            _ => self.size_bytes == other.size_bytes,
        }
    }
}

fn text_preview(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(TEXT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn files_preview(files: &[String]) -> String {
    let mut preview = files
        .iter()
        .take(FILES_PREVIEW_COUNT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if files.len() > FILES_PREVIEW_COUNT {
        preview.push_str(", ...");
    }
    preview
}

/// Reads width and height from the PNG `IHDR` chunk.
fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
    if png.get(..8)? != &SIGNATURE[..] || png.get(12..16)? != &b"IHDR"[..] {
        return None;
    }
    let width = u32::from_be_bytes(png.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(png.get(20..24)?.try_into().ok()?);
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut png = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
        png.extend_from_slice(&13u32.to_be_bytes());
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&width.to_be_bytes());
        png.extend_from_slice(&height.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0]);
        png
    }

    #[test]
    fn test_text_item_metadata() {
        let item = ClipboardItem::text("hello");

        assert_eq!(item.content_type(), ContentType::Text);
        assert_eq!(item.size_bytes, 5);
        assert_eq!(item.preview, "hello");
        assert!(!item.id.is_empty());
    }

    #[test]
    fn test_long_text_preview_is_truncated_on_char_boundary() {
        // Arrange: multi-byte characters straddle the cut point.
        let text = "é".repeat(TEXT_PREVIEW_CHARS + 5);

        // Act
        let item = ClipboardItem::text(text);

        // Assert
        assert!(item.preview.ends_with("..."));
        assert_eq!(item.preview.chars().count(), TEXT_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_files_preview_elides_after_three() {
        let item = ClipboardItem::files(vec![
            "a.txt".into(),
            "b.txt".into(),
            "c.txt".into(),
            "d.txt".into(),
        ]);
        assert_eq!(item.preview, "a.txt, b.txt, c.txt, ...");
    }

    #[test]
    fn test_files_size_counts_utf16_block() {
        let payload = ClipboardPayload::Files(vec!["ab".into()]);
        // (2 chars + NUL) * 2 + final NUL + header
        assert_eq!(payload.size_bytes(), 6 + 2 + DROPFILES_HEADER_SIZE);
    }

    #[test]
    fn test_image_preview_reads_dimensions() {
        assert_eq!(ClipboardItem::image(png_header(640, 480)).preview, "640x480 PNG");
        assert_eq!(ClipboardItem::image(vec![1, 2, 3]).preview, "Invalid PNG image");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ClipboardItem::text("x").id, ClipboardItem::text("x").id);
    }

    #[test]
    fn test_same_content_rules() {
        assert!(ClipboardItem::text("a").same_content(&ClipboardItem::text("a")));
        assert!(!ClipboardItem::text("a").same_content(&ClipboardItem::text("b")));
        // Non-text compares by size only.
        assert!(ClipboardItem::image(vec![0; 10]).same_content(&ClipboardItem::image(vec![1; 10])));
        assert!(!ClipboardItem::text("ab").same_content(&ClipboardItem::image(vec![0; 2])));
    }
}
