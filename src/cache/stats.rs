//! Storage Statistics Module
//!
//! Tracks lookups and writes against the cache storage.

use serde::Serialize;

// == Storage Stats ==
/// Counters for cache storage activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries written (new or overwritten)
    pub writes: u64,
    /// Generations currently present
    pub generations: usize,
}

impl StorageStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn set_generations(&mut self, count: usize) {
        self.generations = count;
    }
}
