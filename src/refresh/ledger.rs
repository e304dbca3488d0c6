//! Sequence bookkeeping for superseded results.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    triggered: u64,
    delivered: u64,
}

/// Tracks, per logical resource, the newest request and the newest
/// result applied for it.
///
/// Sequence numbers come from one counter shared by every key, so they are
/// strictly increasing across the whole ledger.
#[derive(Debug)]
pub struct SequenceLedger<K> {
    next: u64,
    slots: HashMap<K, Slot>,
}

impl<K> Default for SequenceLedger<K> {
    fn default() -> Self {
        Self {
            next: 0,
            slots: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> SequenceLedger<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request for `key` and return its sequence number.
    pub fn begin(&mut self, key: &K) -> u64 {
        self.next += 1;
        let seq = self.next;
        self.slots.entry(key.clone()).or_default().triggered = seq;
        seq
    }

    /// Decide whether a finished request should be applied.
    ///
    /// Exclusive results are applied only if no newer request for the key
    /// was issued since and nothing newer was applied already. Non-exclusive
    /// results are always applied.
    pub fn accept(&mut self, key: &K, seq: u64, exclusive: bool) -> bool {
        let slot = self.slots.entry(key.clone()).or_default();
        if exclusive && (seq != slot.triggered || seq <= slot.delivered) {
            return false;
        }
        slot.delivered = slot.delivered.max(seq);
        true
    }

    /// Newest sequence number issued for `key`.
    pub fn latest(&self, key: &K) -> Option<u64> {
        self.slots.get(key).map(|s| s.triggered).filter(|&s| s > 0)
    }

    /// Newest sequence number applied for `key`.
    pub fn delivered(&self, key: &K) -> Option<u64> {
        self.slots.get(key).map(|s| s.delivered).filter(|&s| s > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_strictly_increase_across_keys() {
        let mut ledger = SequenceLedger::new();
        let a = ledger.begin(&"health");
        let b = ledger.begin(&"clusters");
        let c = ledger.begin(&"health");
        assert!(a < b && b < c);
        assert_eq!(ledger.latest(&"health"), Some(c));
        assert_eq!(ledger.latest(&"jobs"), None);
    }

    #[test]
    fn test_slow_middle_request_is_discarded() {
        let mut ledger = SequenceLedger::new();
        let s1 = ledger.begin(&"health");
        let s2 = ledger.begin(&"health");
        let s3 = ledger.begin(&"health");

        // 1 completes, then 3, then the slow 2.
        assert!(!ledger.accept(&"health", s1, true));
        assert!(ledger.accept(&"health", s3, true));
        assert!(!ledger.accept(&"health", s2, true));
        assert_eq!(ledger.delivered(&"health"), Some(s3));
    }

    #[test]
    fn test_exclusive_result_applied_once() {
        let mut ledger = SequenceLedger::new();
        let s1 = ledger.begin(&"clusters");
        assert!(ledger.accept(&"clusters", s1, true));
        assert!(!ledger.accept(&"clusters", s1, true));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut ledger = SequenceLedger::new();
        let h = ledger.begin(&"health");
        let c = ledger.begin(&"clusters");
        assert!(ledger.accept(&"health", h, true));
        assert!(ledger.accept(&"clusters", c, true));
    }

    #[test]
    fn test_non_exclusive_always_applied() {
        let mut ledger = SequenceLedger::new();
        let s1 = ledger.begin(&"action");
        let s2 = ledger.begin(&"action");
        assert!(ledger.accept(&"action", s2, false));
        assert!(ledger.accept(&"action", s1, false));
    }
}
