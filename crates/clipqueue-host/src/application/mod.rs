//! Application layer use cases for ClipQueue.
//!
//! Use cases in this layer orchestrate the pure `clipqueue_core` state
//! machines and talk to the outside world only through traits
//! ([`queue_controller::ClipboardBackend`], [`queue_controller::InputInjector`])
//! that the infrastructure layer implements.  Nothing here installs hooks,
//! touches the OS clipboard or reads files.
//!
//! # Sub-modules
//!
//! - **`queue_controller`** – The clipboard queue: toggle, paste-next,
//!   history, macros and self-event suppression around every write.
//!
//! - **`dispatch`** – Runs on the input hook thread for every event.  Turns
//!   the event into a signature, feeds an active capture session or looks
//!   the signature up in the matcher, and spawns the bound action.
//!
//! - **`bindings`** – Installs the configured hotkeys and macros into the
//!   matcher, and reinstalls them on reload.
//!
//! - **`clipboard_watch`** – Coalesces bursts of clipboard-change
//!   notifications into single controller updates.

pub mod bindings;
pub mod clipboard_watch;
pub mod dispatch;
pub mod queue_controller;
