//! Windows low-level keyboard and mouse hook implementation.
//!
//! This module installs `WH_KEYBOARD_LL` and `WH_MOUSE_LL` hooks using the
//! Windows API.  Both hooks share a dedicated Win32 message-loop thread.
//! The registered [`EventHandler`] runs inside the hook callback and its
//! verdict decides whether the event is swallowed (`LRESULT(1)`) or passed
//! to the next hook.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{PoisonError, RwLock};
use std::thread;

use clipqueue_core::ModifierState;
use tracing::{error, info};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG, MSLLHOOKSTRUCT,
    PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN,
    WM_MBUTTONDOWN, WM_MOUSEHWHEEL, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_SYSKEYDOWN,
    WM_SYSKEYUP, WM_XBUTTONDOWN,
};

use super::{EventHandler, HookError, InputSource, MouseButton, RawInputEvent};

const VK_SHIFT: i32 = 0x10;
const VK_CONTROL: i32 = 0x11;
const VK_MENU: i32 = 0x12;
const VK_LWIN: i32 = 0x5B;
const VK_RWIN: i32 = 0x5C;

/// High word of `mouseData` for `WM_XBUTTONDOWN`.
const XBUTTON1: u16 = 0x0001;

/// Handler invoked by the hook callbacks.  `None` while stopped.
static EVENT_HANDLER: RwLock<Option<EventHandler>> = RwLock::new(None);

/// Thread id of the running message loop, 0 when not running.
static HOOK_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Windows low-level input hook service.
#[derive(Debug, Default)]
pub struct WindowsInputHook;

impl WindowsInputHook {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for WindowsInputHook {
    fn start(&self, handler: EventHandler) -> Result<(), HookError> {
        if HOOK_THREAD_ID.load(Ordering::SeqCst) != 0 {
            return Err(HookError::AlreadyStarted);
        }
        *EVENT_HANDLER
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);

        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name("clipqueue-hook-loop".to_string())
            .spawn(move || run_hook_message_loop(ready_tx))
            .map_err(|e| HookError::KeyboardHookInstallFailed(e.to_string()))?;

        let outcome = ready_rx.recv().unwrap_or_else(|_| {
            Err(HookError::KeyboardHookInstallFailed(
                "hook thread exited before reporting".to_string(),
            ))
        });
        match outcome {
            Ok(thread_id) => {
                HOOK_THREAD_ID.store(thread_id, Ordering::SeqCst);
                info!(thread_id, "input hooks installed");
                Ok(())
            }
            Err(e) => {
                *EVENT_HANDLER
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = None;
                Err(e)
            }
        }
    }

    fn stop(&self) {
        let thread_id = HOOK_THREAD_ID.swap(0, Ordering::SeqCst);
        if thread_id != 0 {
            // SAFETY: Posting WM_QUIT to a thread id we own; failure only
            // means the thread has already exited.
            if let Err(e) =
                unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
            {
                error!(error = %e, "failed to stop hook thread");
            }
        }
        *EVENT_HANDLER
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(ready: Sender<Result<u32, HookError>>) {
    let mut msg = MSG::default();
    // SAFETY: Forces creation of this thread's message queue so that
    // `stop` can post WM_QUIT as soon as the thread id is published.
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }

    // SAFETY: SetWindowsHookExW requires the calling thread to run a message
    // loop, which this thread does below.
    let kbd_hook =
        match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) } {
            Ok(hook) => hook,
            Err(e) => {
                let _ = ready.send(Err(HookError::KeyboardHookInstallFailed(e.to_string())));
                return;
            }
        };
    // SAFETY: As above.
    let mouse_hook =
        match unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) } {
            Ok(hook) => hook,
            Err(e) => {
                // SAFETY: kbd_hook was returned by SetWindowsHookExW above.
                unsafe {
                    let _ = UnhookWindowsHookEx(kbd_hook);
                }
                let _ = ready.send(Err(HookError::MouseHookInstallFailed(e.to_string())));
                return;
            }
        };

    // SAFETY: Trivial FFI query of the current thread id.
    let _ = ready.send(Ok(unsafe { GetCurrentThreadId() }));

    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern; the
    // hook handles are released once WM_QUIT ends the loop.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        let _ = UnhookWindowsHookEx(kbd_hook);
        let _ = UnhookWindowsHookEx(mouse_hook);
    }
    info!("input hooks removed");
}

fn deliver(event: &RawInputEvent) -> bool {
    let handler = EVENT_HANDLER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    handler.map(|h| h(event)).unwrap_or(false)
}

fn key_down(vk: i32) -> bool {
    // SAFETY: GetAsyncKeyState has no preconditions; the high bit is set
    // while the key is held.
    unsafe { GetAsyncKeyState(vk) < 0 }
}

fn current_modifiers() -> ModifierState {
    let mut mods = ModifierState::NONE;
    if key_down(VK_CONTROL) {
        mods = mods.with(ModifierState::CTRL);
    }
    if key_down(VK_MENU) {
        mods = mods.with(ModifierState::ALT);
    }
    if key_down(VK_SHIFT) {
        mods = mods.with(ModifierState::SHIFT);
    }
    if key_down(VK_LWIN) || key_down(VK_RWIN) {
        mods = mods.with(ModifierState::WIN);
    }
    mods
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// This function is called by Windows from the hook message loop thread.
/// It must return quickly (< ~300ms) to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let message = w_param.0 as u32;
    if !matches!(message, WM_KEYDOWN | WM_KEYUP | WM_SYSKEYDOWN | WM_SYSKEYUP) {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

    let event = RawInputEvent::Key {
        vk_code: kbs.vkCode as u16,
        scan_code: kbs.scanCode as u16,
        flags: kbs.flags.0,
        message: message as u16,
        modifiers: current_modifiers(),
    };

    if deliver(&event) {
        return LRESULT(1);
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread; must return quickly.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
    let mhs = &*(l_param.0 as *const MSLLHOOKSTRUCT);
    let high_word = (mhs.mouseData >> 16) as u16;
    let modifiers = current_modifiers();

    let event = match w_param.0 as u32 {
        WM_LBUTTONDOWN => RawInputEvent::MouseButtonDown {
            button: MouseButton::Left,
            modifiers,
        },
        WM_RBUTTONDOWN => RawInputEvent::MouseButtonDown {
            button: MouseButton::Right,
            modifiers,
        },
        WM_MBUTTONDOWN => RawInputEvent::MouseButtonDown {
            button: MouseButton::Middle,
            modifiers,
        },
        WM_XBUTTONDOWN => {
            let button = if high_word == XBUTTON1 {
                MouseButton::X1
            } else {
                MouseButton::X2
            };
            RawInputEvent::MouseButtonDown { button, modifiers }
        }
        WM_MOUSEWHEEL => RawInputEvent::MouseWheel {
            delta: high_word as i16,
            horizontal: false,
            modifiers,
        },
        WM_MOUSEHWHEEL => RawInputEvent::MouseWheel {
            delta: high_word as i16,
            horizontal: true,
            modifiers,
        },
        _ => {
            return CallNextHookEx(None, n_code, w_param, l_param);
        }
    };

    if deliver(&event) {
        return LRESULT(1);
    }

    // SAFETY: Forward to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}
