//! Cache Statistics Module
//!
//! Counters kept by `ExpiringCache`. Lookups count hits and misses; removals
//! made by the cache itself are split between capacity evictions and
//! lifetime expirations. `ExpiringCache::stats` returns a snapshot with the
//! occupancy fields filled in.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Live entries dropped to make room for a new key
    pub evictions: u64,
    /// Entries dropped because their lifetime had elapsed
    pub expirations: u64,
    /// Occupied buckets at snapshot time
    pub total_entries: usize,
    /// Bucket count at snapshot time
    pub capacity: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Returns hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Fraction of buckets in use, or 0.0 when capacity is unknown.
    pub fn occupancy(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.total_entries as f64 / self.capacity as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub(crate) fn snapshot(&self, occupied: usize, capacity: usize) -> Self {
        Self {
            total_entries: occupied,
            capacity,
            ..self.clone()
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} buckets, {} hits, {} misses ({:.1}% hit rate), {} evicted, {} expired",
            self.total_entries,
            self.capacity,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.expirations
        )
    }
}
