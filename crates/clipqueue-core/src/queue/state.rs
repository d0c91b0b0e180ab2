//! Queue/history state machine.
//!
//! Queue and history hold independent copies of each item: dequeuing or
//! removing from the queue never touches history.  De-duplication compares
//! against the newest history entry using the monotonic instant at which
//! the update was *observed*, supplied by the caller.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info};

use crate::clipboard::ClipboardItem;

use super::{OrderStrategy, QueueError, QueueSettings, QueueStatus, SelfEventRing};

/// What [`QueueState::accept`] did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Empty clipboard; nothing recorded.
    IgnoredEmpty,
    /// Same content as the newest history entry within the dedup window.
    Duplicate,
    /// Appended to history only (queue mode off).
    History,
    /// Appended to history and to the queue tail.
    Queued,
    /// Change caused by one of our own writes; `accept` was never called.
    Suppressed,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    item: ClipboardItem,
    observed_at: Instant,
}

/// All mutable controller state.
#[derive(Debug, Clone)]
pub struct QueueState {
    enabled: bool,
    queue: VecDeque<ClipboardItem>,
    history: VecDeque<HistoryEntry>,
    snapshot: Option<ClipboardItem>,
    order: OrderStrategy,
    self_events: SelfEventRing,
    settings: QueueSettings,
}

impl QueueState {
    pub fn new(settings: QueueSettings, order: OrderStrategy) -> Self {
        Self {
            enabled: false,
            queue: VecDeque::new(),
            history: VecDeque::with_capacity(settings.history_capacity),
            snapshot: None,
            order,
            self_events: SelfEventRing::new(settings.self_event_capacity),
            settings,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn order(&self) -> OrderStrategy {
        self.order
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            enabled: self.enabled,
            queue_len: self.queue.len(),
            order: self.order,
        }
    }

    /// Copy of the queue, head first.
    pub fn queue_snapshot(&self) -> Vec<ClipboardItem> {
        self.queue.iter().cloned().collect()
    }

    /// Copy of the history, oldest first.
    pub fn history_snapshot(&self) -> Vec<ClipboardItem> {
        self.history.iter().map(|e| e.item.clone()).collect()
    }

    // ── Queue mode ───────────────────────────────────────────────────────────

    /// Turns queue mode on, keeping `snapshot` for restoration on disable.
    ///
    /// Returns `false` (and ignores `snapshot`) if already enabled.
    pub fn enable(&mut self, snapshot: Option<ClipboardItem>) -> bool {
        if self.enabled {
            return false;
        }
        self.snapshot = snapshot;
        self.queue.clear();
        self.enabled = true;
        info!("queue mode enabled");
        true
    }

    /// Turns queue mode off and clears the queue.
    ///
    /// Returns the snapshot taken at enable time, if any, for the caller to
    /// write back.  Returns `None` as well when queue mode was already off.
    pub fn disable(&mut self) -> Option<ClipboardItem> {
        if !self.enabled {
            return None;
        }
        self.enabled = false;
        self.queue.clear();
        info!("queue mode disabled");
        self.snapshot.take()
    }

    // ── Clipboard updates ────────────────────────────────────────────────────

    /// Records a self-generated clipboard change.
    pub fn record_self_event(&mut self, seq: u32) {
        self.self_events.record(seq);
        debug!(seq, "recorded self-event sequence number");
    }

    /// `true` if `seq` was produced by one of our own writes.
    pub fn is_self_event(&self, seq: u32) -> bool {
        self.self_events.contains(seq)
    }

    /// Applies a clipboard change read at `observed_at`.
    pub fn accept(&mut self, item: ClipboardItem, observed_at: Instant) -> UpdateOutcome {
        if item.is_empty() {
            debug!("ignoring empty clipboard content");
            return UpdateOutcome::IgnoredEmpty;
        }

        if let Some(last) = self.history.back() {
            let elapsed = observed_at.saturating_duration_since(last.observed_at);
            if elapsed < self.settings.dedup_window && item.same_content(&last.item) {
                debug!(content_type = %item.content_type(), ?elapsed, "dropping duplicate clipboard content");
                return UpdateOutcome::Duplicate;
            }
        }

        while self.history.len() >= self.settings.history_capacity.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            item: item.clone(),
            observed_at,
        });
        debug!(
            content_type = %item.content_type(),
            size = item.size_bytes,
            preview = %item.preview,
            history_len = self.history.len(),
            "added to history"
        );

        if self.enabled {
            info!(
                content_type = %item.content_type(),
                size = item.size_bytes,
                preview = %item.preview,
                queue_len = self.queue.len() + 1,
                "added to queue"
            );
            self.queue.push_back(item);
            UpdateOutcome::Queued
        } else {
            UpdateOutcome::History
        }
    }

    // ── Queue edits ──────────────────────────────────────────────────────────

    /// Removes the next item according to the order strategy.
    pub fn dequeue(&mut self) -> Result<ClipboardItem, QueueError> {
        if !self.enabled {
            return Err(QueueError::Disabled);
        }
        let item = match self.order {
            OrderStrategy::Lifo => self.queue.pop_back(),
            OrderStrategy::Fifo => self.queue.pop_front(),
        };
        let item = item.ok_or(QueueError::Empty)?;
        info!(
            content_type = %item.content_type(),
            preview = %item.preview,
            queue_len = self.queue.len(),
            order = %self.order,
            "dequeued clipboard item"
        );
        Ok(item)
    }

    /// Removes the item at `index`, keeping the others in order.
    pub fn remove(&mut self, index: usize) -> Result<ClipboardItem, QueueError> {
        let len = self.queue.len();
        let item = self
            .queue
            .remove(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })?;
        info!(index, queue_len = self.queue.len(), "removed queue item");
        Ok(item)
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        info!("queue cleared");
    }

    /// Flips LIFO ⇄ FIFO and returns the new strategy.
    pub fn toggle_order(&mut self) -> OrderStrategy {
        self.order = self.order.toggled();
        info!(order = %self.order, "queue order toggled");
        self.order
    }

    /// Sets the strategy; returns `true` if it changed.
    pub fn set_order(&mut self, order: OrderStrategy) -> bool {
        if self.order == order {
            debug!(order = %order, "order strategy unchanged");
            return false;
        }
        self.order = order;
        info!(order = %order, "order strategy changed");
        true
    }

    /// Copy of the history item with `id`.
    pub fn find_history(&self, id: &str) -> Result<ClipboardItem, QueueError> {
        self.history
            .iter()
            .find(|e| e.item.id == id)
            .map(|e| e.item.clone())
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state() -> QueueState {
        QueueState::new(QueueSettings::default(), OrderStrategy::Lifo)
    }

    fn enabled_with(texts: &[&str]) -> (QueueState, Instant) {
        let mut s = state();
        s.enable(None);
        let mut t = Instant::now();
        for text in texts {
            t += Duration::from_secs(2);
            s.accept(ClipboardItem::text(*text), t);
        }
        (s, t)
    }

    fn preview(item: &ClipboardItem) -> &str {
        item.as_text().unwrap_or_default()
    }

    #[test]
    fn test_accept_adds_to_history_only_when_disabled() {
        // Arrange
        let mut s = state();

        // Act
        let outcome = s.accept(ClipboardItem::text("a"), Instant::now());

        // Assert
        assert_eq!(outcome, UpdateOutcome::History);
        assert_eq!(s.history_len(), 1);
        assert_eq!(s.queue_len(), 0);
    }

    #[test]
    fn test_accept_ignores_empty_content() {
        let mut s = state();
        assert_eq!(
            s.accept(ClipboardItem::empty(), Instant::now()),
            UpdateOutcome::IgnoredEmpty
        );
        assert_eq!(s.history_len(), 0);
    }

    #[test]
    fn test_dedup_within_window_and_not_after() {
        // Arrange
        let mut s = state();
        let t0 = Instant::now();
        s.accept(ClipboardItem::text("same"), t0);

        // Act
        let echo = s.accept(ClipboardItem::text("same"), t0 + Duration::from_millis(900));
        let later = s.accept(ClipboardItem::text("same"), t0 + Duration::from_millis(2000));

        // Assert
        assert_eq!(echo, UpdateOutcome::Duplicate);
        assert_eq!(later, UpdateOutcome::History);
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_dedup_1100ms_apart_records_both() {
        let mut s = state();
        let t0 = Instant::now();
        s.accept(ClipboardItem::text("same"), t0);
        s.accept(ClipboardItem::text("same"), t0 + Duration::from_millis(1100));
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_different_text_within_window_is_kept() {
        let mut s = state();
        let t0 = Instant::now();
        s.accept(ClipboardItem::text("a"), t0);
        s.accept(ClipboardItem::text("b"), t0 + Duration::from_millis(10));
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_history_evicts_oldest_at_capacity() {
        // Arrange
        let mut s = state();
        let mut t = Instant::now();

        // Act
        for n in 0..60 {
            t += Duration::from_secs(2);
            s.accept(ClipboardItem::text(format!("item {n}")), t);
        }

        // Assert
        let history = s.history_snapshot();
        assert_eq!(history.len(), 50);
        assert_eq!(preview(&history[0]), "item 10");
        assert_eq!(preview(&history[49]), "item 59");
    }

    #[test]
    fn test_dequeue_lifo_and_fifo_order() {
        let (mut lifo, _) = enabled_with(&["A", "B", "C"]);
        let popped: Vec<_> = (0..3).map(|_| lifo.dequeue().unwrap()).collect();
        assert_eq!(
            popped.iter().map(preview).collect::<Vec<_>>(),
            ["C", "B", "A"]
        );

        let (mut fifo, _) = enabled_with(&["A", "B", "C"]);
        fifo.set_order(OrderStrategy::Fifo);
        let popped: Vec<_> = (0..3).map(|_| fifo.dequeue().unwrap()).collect();
        assert_eq!(
            popped.iter().map(preview).collect::<Vec<_>>(),
            ["A", "B", "C"]
        );
    }

    #[test]
    fn test_dequeue_does_not_touch_history() {
        let (mut s, _) = enabled_with(&["A", "B"]);
        s.dequeue().unwrap();
        assert_eq!(s.history_len(), 2);
        assert_eq!(s.queue_len(), 1);
    }

    #[test]
    fn test_dequeue_errors_when_disabled_or_empty() {
        let mut s = state();
        assert_eq!(s.dequeue(), Err(QueueError::Disabled));
        s.enable(None);
        assert_eq!(s.dequeue(), Err(QueueError::Empty));
    }

    #[test]
    fn test_remove_out_of_range_leaves_queue_unchanged() {
        // Arrange
        let (mut s, _) = enabled_with(&["A", "B"]);

        // Act
        let result = s.remove(2);

        // Assert
        assert_eq!(result, Err(QueueError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(s.queue_len(), 2);
        assert_eq!(
            state().remove(0),
            Err(QueueError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let (mut s, _) = enabled_with(&["A", "B", "C"]);
        let removed = s.remove(1).unwrap();
        assert_eq!(preview(&removed), "B");
        let rest = s.queue_snapshot();
        assert_eq!(rest.iter().map(preview).collect::<Vec<_>>(), ["A", "C"]);
    }

    #[test]
    fn test_enable_twice_keeps_first_snapshot() {
        let mut s = state();
        let first = ClipboardItem::text("first");
        assert!(s.enable(Some(first.clone())));
        assert!(!s.enable(Some(ClipboardItem::text("second"))));
        assert_eq!(s.disable(), Some(first));
    }

    #[test]
    fn test_disable_clears_queue_and_returns_snapshot_once() {
        let mut s = state();
        s.enable(Some(ClipboardItem::text("snap")));
        s.accept(ClipboardItem::text("x"), Instant::now());

        let snapshot = s.disable();

        assert!(snapshot.is_some());
        assert_eq!(s.queue_len(), 0);
        assert!(!s.is_enabled());
        assert_eq!(s.disable(), None);
    }

    #[test]
    fn test_find_history_by_id() {
        let mut s = state();
        let item = ClipboardItem::text("keep");
        s.accept(item.clone(), Instant::now());

        assert_eq!(s.find_history(&item.id), Ok(item));
        assert_eq!(
            s.find_history("nope"),
            Err(QueueError::NotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_self_events_use_configured_capacity() {
        let mut s = QueueState::new(
            QueueSettings {
                self_event_capacity: 2,
                ..QueueSettings::default()
            },
            OrderStrategy::Lifo,
        );
        s.record_self_event(1);
        s.record_self_event(2);
        s.record_self_event(3);
        assert!(!s.is_self_event(1));
        assert!(s.is_self_event(3));
    }

    #[test]
    fn test_toggle_and_set_order() {
        let mut s = state();
        assert_eq!(s.toggle_order(), OrderStrategy::Fifo);
        assert!(!s.set_order(OrderStrategy::Fifo));
        assert!(s.set_order(OrderStrategy::Lifo));
        assert_eq!(s.status().order, OrderStrategy::Lifo);
    }
}
