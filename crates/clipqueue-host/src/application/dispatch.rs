//! InputDispatcher: decides what happens to each intercepted input event.
//!
//! [`InputDispatcher::handle`] runs synchronously on the input hook thread
//! and must return quickly.  It never awaits: a matched action is spawned
//! onto the Tokio runtime and the hook is told to consume the event.
//!
//! Decision order for one event:
//!
//! 1. Bare modifier keys (Ctrl, Shift, ...) pass through untouched.
//! 2. An active capture session takes the event and consumes it.
//! 3. The full signature is looked up in the matcher; for a key-down event
//!    that does not match, the reduced virtual-key-only form is tried so
//!    hotkeys stored as `"Ctrl+Alt+C"` still fire.
//! 4. A match spawns the bound action and consumes the event; anything
//!    else is forwarded to the rest of the system.

use std::sync::Arc;
use std::time::Duration;

use clipqueue_core::{
    format_hotkey, CaptureError, CaptureSession, InputSignature, SignatureMatcher,
};
use futures_util::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::{debug, trace};

/// Action bound to a hotkey.  Each invocation produces a fresh future.
pub type HotkeyAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Routes input signatures to capture or to bound actions.
pub struct InputDispatcher {
    matcher: Arc<SignatureMatcher<HotkeyAction>>,
    capture: Arc<CaptureSession>,
    runtime: Handle,
}

impl InputDispatcher {
    /// `runtime` is where matched actions are spawned; the hook thread is
    /// not a runtime thread.
    pub fn new(
        matcher: Arc<SignatureMatcher<HotkeyAction>>,
        capture: Arc<CaptureSession>,
        runtime: Handle,
    ) -> Self {
        Self {
            matcher,
            capture,
            runtime,
        }
    }

    pub fn matcher(&self) -> &Arc<SignatureMatcher<HotkeyAction>> {
        &self.matcher
    }

    pub fn capture(&self) -> &Arc<CaptureSession> {
        &self.capture
    }

    /// Handles one event.  Returns `true` if the event was consumed and
    /// must not propagate to other applications.
    pub fn handle(&self, signature: &InputSignature) -> bool {
        if signature.is_bare_modifier() {
            trace!(key = %signature.display_hint(), "bare modifier passed through");
            return false;
        }

        if self.capture.offer(signature) {
            return true;
        }

        let action = self.matcher.match_signature(signature).or_else(|| {
            signature
                .legacy_key_form()
                .and_then(|legacy| self.matcher.match_signature(&legacy))
        });

        match action {
            Some(action) => {
                debug!(hotkey = %signature.display_hint(), "hotkey matched");
                self.runtime.spawn(action());
                true
            }
            None => false,
        }
    }

    /// Diverts the next non-modifier event and returns it with its storable
    /// `"sig:<base64>"` form.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Timeout`] if nothing arrives within `timeout`.
    pub async fn capture_next(
        &self,
        timeout: Duration,
    ) -> Result<(InputSignature, String), CaptureError> {
        self.capture.start_capture();
        let signature = self.capture.wait_for_capture(timeout).await?;
        let stored = format_hotkey(&signature);
        Ok((signature, stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipqueue_core::signature::layout;
    use clipqueue_core::ModifierState;
    use futures_util::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CTRL_ALT: ModifierState = ModifierState(ModifierState::CTRL | ModifierState::ALT);

    fn key_down(vk: u16, modifiers: ModifierState) -> InputSignature {
        InputSignature::keyboard(vk, 0x2E, 0, layout::WM_KEYDOWN, modifiers)
    }

    fn counting_action(counter: &Arc<AtomicUsize>) -> HotkeyAction {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    /// Lets spawned actions run to completion.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn make_dispatcher() -> InputDispatcher {
        InputDispatcher::new(
            Arc::new(SignatureMatcher::new()),
            Arc::new(CaptureSession::new()),
            Handle::current(),
        )
    }

    #[tokio::test]
    async fn test_matched_event_is_consumed_and_action_runs() {
        // Arrange
        let dispatcher = make_dispatcher();
        let fired = Arc::new(AtomicUsize::new(0));
        let sig = key_down(0x43, CTRL_ALT);
        dispatcher
            .matcher()
            .register(sig.clone(), "toggle_queue", counting_action(&fired));

        // Act
        let consumed = dispatcher.handle(&sig);
        settle().await;

        // Assert
        assert!(consumed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmatched_event_is_forwarded() {
        // Arrange
        let dispatcher = make_dispatcher();

        // Act
        let consumed = dispatcher.handle(&key_down(0x41, ModifierState::NONE));

        // Assert
        assert!(!consumed);
    }

    #[tokio::test]
    async fn test_legacy_hotkey_fires_on_key_down_only() {
        // Arrange
        let dispatcher = make_dispatcher();
        let fired = Arc::new(AtomicUsize::new(0));
        dispatcher.matcher().register(
            InputSignature::legacy_key(0x56, CTRL_ALT),
            "paste_next",
            counting_action(&fired),
        );
        let up = InputSignature::keyboard(0x56, 0x2F, 0x80, layout::WM_KEYUP, CTRL_ALT);

        // Act
        let down_consumed = dispatcher.handle(&key_down(0x56, CTRL_ALT));
        let up_consumed = dispatcher.handle(&up);
        settle().await;

        // Assert
        assert!(down_consumed);
        assert!(!up_consumed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bare_modifier_is_never_consumed() {
        // Arrange
        let dispatcher = make_dispatcher();
        dispatcher.capture().start_capture();

        // Act
        let consumed = dispatcher.handle(&key_down(0xA2, ModifierState(ModifierState::CTRL)));

        // Assert
        assert!(!consumed);
        assert!(dispatcher.capture().is_capturing());
    }

    #[tokio::test]
    async fn test_capture_takes_precedence_over_bound_action() {
        // Arrange
        let dispatcher = Arc::new(make_dispatcher());
        let fired = Arc::new(AtomicUsize::new(0));
        let sig = key_down(0x43, CTRL_ALT);
        dispatcher
            .matcher()
            .register(sig.clone(), "toggle_queue", counting_action(&fired));
        let waiter = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.capture_next(Duration::from_secs(5)).await })
        };
        while !dispatcher.capture().is_capturing() {
            tokio::task::yield_now().await;
        }

        // Act
        let consumed = dispatcher.handle(&sig);
        let (captured, stored) = waiter.await.unwrap().unwrap();
        settle().await;

        // Assert
        assert!(consumed);
        assert_eq!(captured, sig);
        assert_eq!(stored, format_hotkey(&sig));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_next_times_out() {
        // Arrange
        let dispatcher = make_dispatcher();

        // Act
        let result = dispatcher.capture_next(Duration::from_secs(10)).await;

        // Assert
        assert_eq!(result, Err(CaptureError::Timeout(Duration::from_secs(10))));
        assert!(!dispatcher.capture().is_capturing());
    }
}
