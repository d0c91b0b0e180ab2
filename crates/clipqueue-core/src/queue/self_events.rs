//! Ring of clipboard sequence numbers produced by our own writes.
//!
//! Every time the controller writes the clipboard it records the sequence
//! number the backend reports afterwards.  A later change notification that
//! carries one of those numbers is our own echo and is dropped.  The ring
//! overwrites its oldest slot unconditionally, so it never grows and a
//! genuine external change can only be shadowed for a few writes.

/// Default number of remembered sequence numbers.
pub const DEFAULT_SELF_EVENT_CAPACITY: usize = 8;

/// Fixed-capacity circular buffer of sequence numbers.
#[derive(Debug, Clone)]
pub struct SelfEventRing {
    slots: Vec<Option<u32>>,
    cursor: usize,
}

impl Default for SelfEventRing {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_EVENT_CAPACITY)
    }
}

impl SelfEventRing {
    /// Creates an empty ring.  A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
        }
    }

    /// Stores `seq` at the cursor and advances it, overwriting the oldest entry.
    pub fn record(&mut self, seq: u32) {
        self.slots[self.cursor] = Some(seq);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Linear scan over every slot.
    pub fn contains(&self, seq: u32) -> bool {
        self.slots.iter().any(|slot| *slot == Some(seq))
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_sequence_is_found() {
        let mut ring = SelfEventRing::default();
        ring.record(42);
        assert!(ring.contains(42));
        assert!(!ring.contains(43));
    }

    #[test]
    fn test_empty_ring_does_not_contain_zero() {
        // Unused slots must not match a backend that reports sequence 0.
        let ring = SelfEventRing::default();
        assert!(!ring.contains(0));
    }

    #[test]
    fn test_ninth_record_evicts_the_first() {
        // Arrange
        let mut ring = SelfEventRing::new(8);

        // Act
        for seq in 1..=9 {
            ring.record(seq);
        }

        // Assert
        assert!(!ring.contains(1));
        for seq in 2..=9 {
            assert!(ring.contains(seq), "seq {seq} should still be present");
        }
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut ring = SelfEventRing::new(0);
        ring.record(1);
        ring.record(2);
        assert_eq!(ring.capacity(), 1);
        assert!(!ring.contains(1));
        assert!(ring.contains(2));
    }
}
