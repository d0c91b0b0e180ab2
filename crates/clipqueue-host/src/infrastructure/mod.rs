//! Infrastructure layer for ClipQueue.
//!
//! Contains OS-facing adapters: input capture hooks, the clipboard backend
//! and keystroke injector, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `clipqueue_core`, but MUST NOT be imported by the `application` layer.

pub mod clipboard;
pub mod input_capture;
pub mod storage;
