//! Windows clipboard backend and `SendInput` injector.
//!
//! [`WindowsClipboard`] converts between the system clipboard formats and
//! [`ClipboardPayload`]:
//!
//! | Payload | Clipboard format                  |
//! |---------|-----------------------------------|
//! | Files   | `CF_HDROP`                        |
//! | Image   | `CF_DIB` (PNG ↔ BMP conversion)   |
//! | Text    | `CF_UNICODETEXT`                  |
//!
//! Formats are checked in that order, matching what Explorer and image
//! editors put on the clipboard.  Clipboard calls block while another
//! process holds the clipboard open, so they run on the blocking pool.
//!
//! Change notifications come from polling `GetClipboardSequenceNumber`
//! and firing the registered [`ChangeListener`] whenever it moves.
//!
//! [`SendInputInjector`] synthesises `Ctrl+V` and Unicode keystrokes.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::io::Cursor;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use clipboard_win::raw::is_format_avail;
use clipboard_win::{formats, get_clipboard, set_clipboard, Clipboard, Setter};
use clipqueue_core::{ClipboardItem, ClipboardPayload};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use windows::Win32::System::DataExchange::GetClipboardSequenceNumber;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, KEYBD_EVENT_FLAGS, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN,
    VK_SHIFT, VK_V,
};

use super::ChangeListener;
use crate::application::queue_controller::{ClipboardBackend, ClipboardError, InputInjector};

/// Attempts made to open a clipboard held by another process.
const OPEN_ATTEMPTS: usize = 10;

/// Default interval between sequence-number polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pause between `Ctrl` down and `V` down so targets see the chord.
const CHORD_GAP: Duration = Duration::from_millis(10);

/// Keystroke events sent per `SendInput` call while typing.
const TYPE_CHUNK: usize = 50;

/// Pause between typing chunks; remote desktop sessions drop bursts.
const TYPE_CHUNK_GAP: Duration = Duration::from_millis(20);

// ── Clipboard ─────────────────────────────────────────────────────────────────

/// System clipboard backed by `clipboard-win`.
pub struct WindowsClipboard {
    listener: RwLock<Option<ChangeListener>>,
}

impl WindowsClipboard {
    pub fn new() -> Self {
        Self {
            listener: RwLock::new(None),
        }
    }

    /// Registers the change listener, replacing any previous one.
    pub fn set_change_listener(&self, listener: ChangeListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    /// Spawns a task that fires the change listener whenever the clipboard
    /// sequence number moves.  Abort the handle to stop it.
    pub fn spawn_change_monitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let clipboard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last = clipboard.change_sequence_number();
            loop {
                ticker.tick().await;
                let seq = clipboard.change_sequence_number();
                if seq != last {
                    last = seq;
                    debug!(seq, "clipboard sequence changed");
                    clipboard.fire();
                }
            }
        })
    }

    fn fire(&self) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl Default for WindowsClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClipboardBackend for WindowsClipboard {
    async fn read(&self) -> Result<ClipboardItem, ClipboardError> {
        let payload = tokio::task::spawn_blocking(read_payload)
            .await
            .map_err(|e| ClipboardError::Read(e.to_string()))??;
        Ok(ClipboardItem::new(payload))
    }

    async fn write(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        let payload = item.payload.clone();
        tokio::task::spawn_blocking(move || write_payload(&payload))
            .await
            .map_err(|e| ClipboardError::Write(e.to_string()))?
    }

    fn change_sequence_number(&self) -> u32 {
        // SAFETY: GetClipboardSequenceNumber takes no arguments and only
        // reads the window station's counter.
        unsafe { GetClipboardSequenceNumber() }
    }
}

fn read_payload() -> Result<ClipboardPayload, ClipboardError> {
    if is_format_avail(formats::CF_HDROP) {
        let files: Vec<String> =
            get_clipboard(formats::FileList).map_err(|e| ClipboardError::Read(e.to_string()))?;
        return Ok(ClipboardPayload::Files(files));
    }
    if is_format_avail(formats::CF_DIB) {
        let bmp: Vec<u8> =
            get_clipboard(formats::Bitmap).map_err(|e| ClipboardError::Read(e.to_string()))?;
        return bmp_to_png(&bmp).map(ClipboardPayload::Image);
    }
    if is_format_avail(formats::CF_UNICODETEXT) {
        let text: String =
            get_clipboard(formats::Unicode).map_err(|e| ClipboardError::Read(e.to_string()))?;
        return Ok(ClipboardPayload::Text(text));
    }
    Ok(ClipboardPayload::Empty)
}

fn write_payload(payload: &ClipboardPayload) -> Result<(), ClipboardError> {
    match payload {
        ClipboardPayload::Text(text) => set_clipboard(formats::Unicode, text.as_str())
            .map_err(|e| ClipboardError::Write(e.to_string())),
        ClipboardPayload::Image(png) => {
            let bmp = png_to_bmp(png)?;
            set_clipboard(formats::Bitmap, &bmp).map_err(|e| ClipboardError::Write(e.to_string()))
        }
        ClipboardPayload::Files(files) => {
            let _open = Clipboard::new_attempts(OPEN_ATTEMPTS)
                .map_err(|e| ClipboardError::Write(e.to_string()))?;
            clipboard_win::empty().map_err(|e| ClipboardError::Write(e.to_string()))?;
            formats::FileList
                .write_clipboard(files.as_slice())
                .map_err(|e| ClipboardError::Write(e.to_string()))
        }
        ClipboardPayload::Empty => {
            let _open = Clipboard::new_attempts(OPEN_ATTEMPTS)
                .map_err(|e| ClipboardError::Write(e.to_string()))?;
            clipboard_win::empty().map_err(|e| ClipboardError::Write(e.to_string()))
        }
    }
}

/// Re-encodes a clipboard bitmap as PNG.
fn bmp_to_png(bmp: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let image = image::load_from_memory_with_format(bmp, image::ImageFormat::Bmp)
        .map_err(|e| ClipboardError::Read(format!("failed to decode bitmap: {e}")))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ClipboardError::Read(format!("failed to encode PNG: {e}")))?;
    Ok(png)
}

/// Re-encodes a PNG as a bitmap file for `CF_DIB`.
fn png_to_bmp(png: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let image = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| ClipboardError::Write(format!("failed to decode PNG: {e}")))?;
    let mut bmp = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bmp), image::ImageFormat::Bmp)
        .map_err(|e| ClipboardError::Write(format!("failed to encode bitmap: {e}")))?;
    Ok(bmp)
}

// ── Keystroke injection ───────────────────────────────────────────────────────

/// [`InputInjector`] using `SendInput`.
#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InputInjector for SendInputInjector {
    async fn send_paste_keystroke(&self) -> Result<(), ClipboardError> {
        // The paste hotkey usually still has Alt held; Ctrl+Alt+V is not a paste.
        let down = [
            key_input(VK_MENU, KEYEVENTF_KEYUP),
            key_input(VK_CONTROL, KEYBD_EVENT_FLAGS(0)),
        ];
        send(&down).map_err(ClipboardError::Paste)?;

        tokio::time::sleep(CHORD_GAP).await;

        let rest = [
            key_input(VK_V, KEYBD_EVENT_FLAGS(0)),
            key_input(VK_V, KEYEVENTF_KEYUP),
            key_input(VK_CONTROL, KEYEVENTF_KEYUP),
        ];
        send(&rest).map_err(ClipboardError::Paste)?;
        debug!("sent Ctrl+V");
        Ok(())
    }

    async fn send_typed_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut inputs = release_held_modifiers();
        inputs.extend(unicode_inputs(text));

        for chunk in inputs.chunks(TYPE_CHUNK) {
            send(chunk).map_err(ClipboardError::Type)?;
            tokio::time::sleep(TYPE_CHUNK_GAP).await;
        }
        debug!(chars = text.chars().count(), "typed text");
        Ok(())
    }
}

/// Key-up events for every modifier the user is still holding.
fn release_held_modifiers() -> Vec<INPUT> {
    [VK_SHIFT, VK_CONTROL, VK_MENU, VK_LWIN, VK_RWIN]
        .into_iter()
        .filter(|vk| {
            // SAFETY: GetAsyncKeyState only reads the async key state table.
            let state = unsafe { GetAsyncKeyState(i32::from(vk.0)) };
            state < 0
        })
        .map(|vk| key_input(vk, KEYEVENTF_KEYUP))
        .collect()
}

/// Down/up pairs carrying each UTF-16 unit of `text`.
fn unicode_inputs(text: &str) -> Vec<INPUT> {
    text.encode_utf16()
        .flat_map(|unit| {
            [
                unicode_input(unit, KEYEVENTF_UNICODE),
                unicode_input(unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
            ]
        })
        .collect()
}

fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    keyboard_input(vk, 0, flags)
}

fn unicode_input(unit: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    keyboard_input(VIRTUAL_KEY(0), unit, flags)
}

fn keyboard_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> Result<(), String> {
    if inputs.is_empty() {
        return Ok(());
    }
    // SAFETY: inputs is a valid slice of initialised INPUT structures and
    // cbsize matches their size.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        warn!(sent, expected = inputs.len(), "SendInput was partially blocked");
        return Err(format!("SendInput sent {sent} of {} events", inputs.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_inputs_pair_down_and_up_per_utf16_unit() {
        // Arrange: "é" is one unit, the emoji is a surrogate pair.
        let text = "aé😀";

        // Act
        let inputs = unicode_inputs(text);

        // Assert
        assert_eq!(inputs.len(), 8);
        // SAFETY: every element was built with the `ki` variant.
        let first = unsafe { inputs[0].Anonymous.ki };
        let second = unsafe { inputs[1].Anonymous.ki };
        assert_eq!(first.wScan, u16::from(b'a'));
        assert_eq!(first.dwFlags, KEYEVENTF_UNICODE);
        assert_eq!(second.dwFlags, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP);
        let high = unsafe { inputs[4].Anonymous.ki };
        assert_eq!(high.wScan, 0xD83D);
    }

    #[test]
    fn test_png_survives_bitmap_round_trip_pixels() {
        // Arrange
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        // Act
        let back = bmp_to_png(&png_to_bmp(&png).unwrap()).unwrap();

        // Assert
        let decoded = image::load_from_memory(&back).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &image::Rgba([10, 20, 30, 255]));
    }
}
