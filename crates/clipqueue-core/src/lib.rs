//! # clipqueue-core
//!
//! Shared library for ClipQueue containing the input signature model and
//! codec, the signature registry, the hotkey capture session, key name
//! tables, and the clipboard queue state machine.
//!
//! This crate makes no OS calls.  Platform adapters (input hooks, clipboard
//! access, keystroke injection) live in the host crate and talk to this one
//! through plain values.
//!
//! # Architecture overview
//!
//! ClipQueue intercepts global keyboard and mouse events, turns each one into
//! a canonical [`InputSignature`], and runs the action bound to a matching
//! signature (toggle the clipboard queue, paste the next queued item, run a
//! macro).  It also keeps a clipboard history and an ordered queue, and must
//! never re-process clipboard changes caused by its own writes.
//!
//! - **`signature`** – What one physical input event looks like as bytes.
//!   Signatures are hashed with FNV-1a and serialised into a small versioned
//!   binary layout (base64 when stored in text configuration).
//!
//! - **`matcher`** – A `hash → [registration]` registry.  Lookups re-check the
//!   raw bytes so a hash collision can never fire the wrong action.
//!
//! - **`capture`** – A one-shot mode that hands the *next* input event to a
//!   waiting caller (interactive hotkey assignment).
//!
//! - **`keymap`** – Virtual-key names for display hints and the legacy
//!   `"Ctrl+Alt+C"` hotkey form.
//!
//! - **`clipboard`** / **`queue`** – Clipboard items, the history/queue state,
//!   LIFO/FIFO ordering and the self-event ring used for feedback-loop
//!   suppression.

pub mod capture;
pub mod clipboard;
pub mod keymap;
pub mod matcher;
pub mod queue;
pub mod signature;

pub use capture::{CaptureError, CaptureSession};
pub use clipboard::{ClipboardItem, ClipboardPayload, ContentType};
pub use keymap::hotkey::{format_hotkey, parse_hotkey};
pub use matcher::{Registration, SignatureMatcher};
pub use queue::{
    OrderStrategy, QueueError, QueueSettings, QueueState, QueueStatus, SelfEventRing, UpdateOutcome,
};
pub use signature::codec::ParseError;
pub use signature::{InputSignature, ModifierState, SourceType};
