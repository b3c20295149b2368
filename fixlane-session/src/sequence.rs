/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Sequence number management.
//!
//! [`SequenceTarget`] is the seam through which sequence corrections reach
//! the live counters of a session engine. [`SequenceManager`] is an atomic
//! implementation of it.

use fixlane_core::types::SeqNum;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live sequence counters that accept corrections.
pub trait SequenceTarget {
    /// Sets the next outgoing sequence number.
    fn set_next_sender(&self, seq: SeqNum);

    /// Sets the next expected incoming sequence number.
    fn set_next_target(&self, seq: SeqNum);
}

/// Manages sequence numbers for a FIX session.
///
/// Uses atomic operations for thread-safe access without locks.
#[derive(Debug)]
pub struct SequenceManager {
    /// Next outgoing sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected incoming sequence number.
    next_target_seq: AtomicU64,
}

impl SequenceManager {
    /// Creates a new sequence manager with sequence numbers starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_initial(SeqNum::new(1), SeqNum::new(1))
    }

    /// Creates a new sequence manager with specified starting values.
    ///
    /// # Arguments
    /// * `sender` - Initial sender sequence number
    /// * `target` - Initial target sequence number
    #[must_use]
    pub const fn with_initial(sender: SeqNum, target: SeqNum) -> Self {
        Self {
            next_sender_seq: AtomicU64::new(sender.value()),
            next_target_seq: AtomicU64::new(target.value()),
        }
    }

    /// Returns the next sender sequence number without incrementing.
    #[inline]
    #[must_use]
    pub fn next_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.next_sender_seq.load(Ordering::SeqCst))
    }

    /// Returns the next target sequence number without incrementing.
    #[inline]
    #[must_use]
    pub fn next_target_seq(&self) -> SeqNum {
        SeqNum::new(self.next_target_seq.load(Ordering::SeqCst))
    }

    /// Allocates and returns the next sender sequence number.
    #[inline]
    pub fn allocate_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.next_sender_seq.fetch_add(1, Ordering::SeqCst))
    }

    /// Increments the target sequence number after an accepted message.
    #[inline]
    pub fn increment_target_seq(&self) {
        self.next_target_seq.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets both sequence numbers to 1.
    #[inline]
    pub fn reset(&self) {
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
    }
}

impl SequenceTarget for SequenceManager {
    fn set_next_sender(&self, seq: SeqNum) {
        self.next_sender_seq.store(seq.value(), Ordering::SeqCst);
    }

    fn set_next_target(&self, seq: SeqNum) {
        self.next_target_seq.store(seq.value(), Ordering::SeqCst);
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correct_through_seam(target: &impl SequenceTarget) {
        target.set_next_sender(SeqNum::new(42));
        target.set_next_target(SeqNum::new(7));
    }

    #[test]
    fn test_outbound_and_inbound_counters() {
        let counters = SequenceManager::default();
        let first = counters.allocate_sender_seq();
        let second = counters.allocate_sender_seq();
        counters.increment_target_seq();
        assert_eq!((first, second), (SeqNum::new(1), SeqNum::new(2)));
        assert_eq!(counters.next_sender_seq(), SeqNum::new(3));
        assert_eq!(counters.next_target_seq(), SeqNum::new(2));
    }

    #[test]
    fn test_corrections_through_target_seam() {
        let counters = SequenceManager::with_initial(SeqNum::new(100), SeqNum::new(200));
        correct_through_seam(&counters);
        assert_eq!(counters.allocate_sender_seq(), SeqNum::new(42));
        assert_eq!(counters.next_target_seq(), SeqNum::new(7));

        counters.reset();
        assert_eq!(counters.next_sender_seq(), SeqNum::new(1));
        assert_eq!(counters.next_target_seq(), SeqNum::new(1));
    }
}
