//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;

// == LRU Tracker ==
/// Tracks the last access of every key for LRU eviction.
///
/// Each touch stamps the key with a strictly increasing tick, so the key
/// holding the smallest tick is the least recently used one. Finding it is a
/// linear scan, which is fine at the capacities these stores run with.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Last access tick per key
    recency: HashMap<String, u64>,
    /// Next tick to hand out
    clock: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        match self.recency.get_mut(key) {
            Some(tick) => *tick = self.clock,
            None => {
                self.recency.insert(key.to_string(), self.clock);
            }
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.recency.remove(key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self.peek_oldest()?.to_string();
        self.recency.remove(&oldest);
        Some(oldest)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.recency
            .iter()
            .min_by_key(|(_, tick)| **tick)
            .map(|(key, _)| key.as_str())
    }

    /// Last access tick of a key, if tracked.
    pub fn last_access(&self, key: &str) -> Option<u64> {
        self.recency.get(key).copied()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.recency.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.recency.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.recency.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.recency.contains_key(key)
    }
}
