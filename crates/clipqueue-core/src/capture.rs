//! One-shot hotkey capture.
//!
//! ```text
//! Idle ──start_capture()──► Capturing ──offer(sig)──► Idle   (sig delivered)
//!                               │
//!                               └──timeout / stop_capture()──► Idle
//! ```
//!
//! While capturing, the input path hands every qualifying event to
//! [`CaptureSession::offer`] *before* consulting the registry.  The first
//! offered signature is stored in a single slot and the session returns to
//! idle; `offer` reports `true` so the caller suppresses the event.
//!
//! `offer` is synchronous and never blocks: it is called from the OS hook
//! thread.  Waiting is done by [`CaptureSession::wait_for_capture`] on the
//! async side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::signature::InputSignature;

/// Errors from [`CaptureSession::wait_for_capture`].
#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    /// No input arrived before the deadline; capture has been stopped.
    #[error("no input captured within {0:?}")]
    Timeout(Duration),
}

/// Single-slot rendezvous between the input hook and a waiting caller.
#[derive(Debug, Default)]
pub struct CaptureSession {
    capturing: AtomicBool,
    slot: Mutex<Option<InputSignature>>,
    ready: Notify,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters capture mode, discarding any unconsumed result of a previous capture.
    pub fn start_capture(&self) {
        let stale = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sig) = stale {
            debug!(hotkey = %sig.display_hint(), "dropping stale captured signature");
        }
        self.capturing.store(true, Ordering::SeqCst);
        info!("hotkey capture started");
    }

    /// Leaves capture mode without delivering anything.
    pub fn stop_capture(&self) {
        if self.capturing.swap(false, Ordering::SeqCst) {
            info!("hotkey capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Offers an input event to the session.
    ///
    /// Returns `true` if the session was capturing and took the signature
    /// (the event must then be consumed, not dispatched or forwarded).
    /// Only the first offer after [`start_capture`](Self::start_capture) wins.
    pub fn offer(&self, signature: &InputSignature) -> bool {
        if self
            .capturing
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        info!(hotkey = %signature.display_hint(), "captured input signature");
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(signature.clone());
        self.ready.notify_one();
        true
    }

    /// Waits until a signature is captured or `timeout` elapses.
    ///
    /// Call after [`start_capture`](Self::start_capture).
    ///
    /// # Errors
    ///
    /// [`CaptureError::Timeout`] if nothing was captured in time; the session
    /// is force-stopped in that case.
    pub async fn wait_for_capture(&self, timeout: Duration) -> Result<InputSignature, CaptureError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(sig) = self.take_result() {
                return Ok(sig);
            }
            if tokio::time::timeout_at(deadline, self.ready.notified())
                .await
                .is_err()
            {
                // A signature may have landed right at the deadline.
                if let Some(sig) = self.take_result() {
                    return Ok(sig);
                }
                self.stop_capture();
                warn!(?timeout, "hotkey capture timed out");
                return Err(CaptureError::Timeout(timeout));
            }
        }
    }

    fn take_result(&self) -> Option<InputSignature> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ModifierState;
    use std::sync::Arc;

    fn sig(vk: u16) -> InputSignature {
        InputSignature::legacy_key(vk, ModifierState::NONE)
    }

    #[test]
    fn test_offer_is_ignored_when_idle() {
        let session = CaptureSession::new();
        assert!(!session.offer(&sig(0x41)));
        assert!(!session.is_capturing());
    }

    #[test]
    fn test_only_first_offer_is_consumed() {
        // Arrange
        let session = CaptureSession::new();
        session.start_capture();

        // Act
        let first = session.offer(&sig(0x41));
        let second = session.offer(&sig(0x42));

        // Assert
        assert!(first);
        assert!(!second);
        assert!(!session.is_capturing());
        assert_eq!(session.take_result(), Some(sig(0x41)));
    }

    #[test]
    fn test_start_capture_drains_stale_result() {
        let session = CaptureSession::new();
        session.start_capture();
        session.offer(&sig(0x41));

        session.start_capture();

        assert_eq!(session.take_result(), None);
        assert!(session.is_capturing());
    }

    #[tokio::test]
    async fn test_wait_returns_signature_offered_later() {
        // Arrange
        let session = Arc::new(CaptureSession::new());
        session.start_capture();
        let hook = Arc::clone(&session);

        // Act
        let offer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            hook.offer(&sig(0x43))
        });
        let captured = session.wait_for_capture(Duration::from_secs(5)).await;

        // Assert
        assert_eq!(captured, Ok(sig(0x43)));
        assert!(offer.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_if_already_captured() {
        let session = CaptureSession::new();
        session.start_capture();
        session.offer(&sig(0x44));

        let captured = session.wait_for_capture(Duration::from_millis(1)).await;

        assert_eq!(captured, Ok(sig(0x44)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_stops_capture() {
        // Arrange
        let session = CaptureSession::new();
        session.start_capture();

        // Act
        let result = session.wait_for_capture(Duration::from_secs(10)).await;

        // Assert
        assert_eq!(result, Err(CaptureError::Timeout(Duration::from_secs(10))));
        assert!(!session.is_capturing());
        assert!(!session.offer(&sig(0x41)));
    }
}
