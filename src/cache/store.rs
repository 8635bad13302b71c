//! Cache Store Module
//!
//! Main cache engine combining bucket storage, the key index and the
//! eviction order with TTL expiration and capacity-bounded LRU eviction.
//!
//! Expiry is lazy: an entry whose lifetime has elapsed is purged by the
//! next operation that looks at it, and is never returned as a hit.

use tracing::debug;

use crate::cache::{BucketStorage, CacheStats, EvictionOrder, KeyIndex};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Ticket ==
/// Identifies one reservation of one bucket.
///
/// A ticket stays valid only while its bucket holds the same key under the
/// same generation, so completing a reservation after the bucket has been
/// evicted or reused is detected instead of overwriting another entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    key: u64,
    slot: usize,
    generation: u64,
}

impl Ticket {
    pub fn key(&self) -> u64 {
        self.key
    }
}

// == Entry ==
/// Read view of a live entry.
#[derive(Debug)]
pub struct Entry<'a> {
    storage: &'a BucketStorage,
    slot: usize,
    created_at: u64,
    last_access: u64,
}

impl<'a> Entry<'a> {
    pub fn payload(&self) -> &'a [u8] {
        self.storage.read(self.slot)
    }

    pub fn key(&self) -> u64 {
        self.storage.bucket(self.slot).key()
    }

    pub fn is_pending(&self) -> bool {
        self.storage.bucket(self.slot).is_pending()
    }

    pub fn is_empty_value(&self) -> bool {
        self.storage.bucket(self.slot).is_empty_value()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Time of the last `get` hit, or creation time if never read.
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    pub fn ticket(&self) -> Ticket {
        ticket_for(self.storage, self.slot)
    }
}

// == Entry Mut ==
/// Write view of an entry returned by `get_or_create` and `create_raw`.
///
/// The view borrows the cache mutably, so the bucket cannot be repurposed
/// while it is held. Copy the payload out before the next cache call.
#[derive(Debug)]
pub struct EntryMut<'a> {
    storage: &'a mut BucketStorage,
    slot: usize,
    created_at: u64,
    last_access: u64,
}

impl EntryMut<'_> {
    /// Stores `bytes` as the entry's payload and clears the empty marker.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.storage.write(self.slot, bytes)?;
        self.storage.bucket_mut(self.slot).empty = false;
        Ok(())
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.storage.bucket_mut(self.slot).pending = pending;
    }

    /// Turns the entry into a remembered "no value" marker.
    pub fn mark_empty(&mut self) {
        let bucket = self.storage.bucket_mut(self.slot);
        bucket.len = 0;
        bucket.empty = true;
        bucket.pending = false;
    }

    pub fn payload(&self) -> &[u8] {
        self.storage.read(self.slot)
    }

    pub fn key(&self) -> u64 {
        self.storage.bucket(self.slot).key()
    }

    pub fn is_pending(&self) -> bool {
        self.storage.bucket(self.slot).is_pending()
    }

    pub fn is_empty_value(&self) -> bool {
        self.storage.bucket(self.slot).is_empty_value()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Time of the last `get` hit, or creation time if never read.
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    pub fn ticket(&self) -> Ticket {
        ticket_for(&*self.storage, self.slot)
    }

    /// Reborrows this view as a read-only [`Entry`].
    pub fn as_entry(&self) -> Entry<'_> {
        Entry {
            storage: &*self.storage,
            slot: self.slot,
            created_at: self.created_at,
            last_access: self.last_access,
        }
    }
}

fn ticket_for(storage: &BucketStorage, slot: usize) -> Ticket {
    let bucket = storage.bucket(slot);
    Ticket {
        key: bucket.key(),
        slot,
        generation: bucket.generation(),
    }
}

// == Expiring Cache ==
/// Fixed-capacity cache with LRU eviction and a shared entry lifetime.
#[derive(Debug)]
pub struct ExpiringCache {
    /// Payload slots and per-slot flags
    storage: BucketStorage,
    /// Key → slot
    index: KeyIndex,
    /// Recency list and timestamps
    order: EvictionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Entry lifetime in seconds, applied to every entry at check time
    lifetime: u64,
}

impl ExpiringCache {
    // == Constructor ==
    /// Creates a cache with all buckets allocated up front.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            storage: BucketStorage::new(config.max_items, config.max_record_size),
            index: KeyIndex::with_capacity(config.max_items),
            order: EvictionOrder::with_capacity(config.max_items),
            stats: CacheStats::new(),
            lifetime: config.lifetime,
        })
    }

    // == Get ==
    /// Looks up a live entry and marks it most recently used.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: u64, now: u64) -> Option<Entry<'_>> {
        let slot = self.lookup_live(key, now)?;
        self.order.touch(slot, now);
        self.record_lookup(slot);
        Some(self.entry(slot))
    }

    // == Peek ==
    /// Looks up a live entry without touching recency or statistics.
    pub fn peek(&self, key: u64, now: u64) -> Option<Entry<'_>> {
        let slot = self.index.lookup(key)?;
        if self.order.is_expired(slot, now, self.lifetime) {
            return None;
        }
        Some(self.entry(slot))
    }

    /// Returns `true` if `key` has a live entry. Does not touch it.
    pub fn contains(&self, key: u64, now: u64) -> bool {
        self.peek(key, now).is_some()
    }

    // == Get Or Create ==
    /// Returns the live entry for `key`, creating an empty one if needed.
    ///
    /// The boolean is `true` when the entry already existed. When the cache
    /// is full the least recently used entry is evicted first, whether or
    /// not it has expired.
    pub fn get_or_create(&mut self, key: u64, now: u64) -> (EntryMut<'_>, bool) {
        if let Some(slot) = self.lookup_live(key, now) {
            self.order.touch(slot, now);
            self.record_lookup(slot);
            return (self.entry_mut(slot), true);
        }
        let slot = self.reserve(key, now);
        (self.entry_mut(slot), false)
    }

    // == Create Raw ==
    /// Reserves a bucket for `key` without looking for a live entry first.
    ///
    /// Fails with `DuplicateKey` if the key already has a bucket.
    pub fn create_raw(&mut self, key: u64, now: u64) -> Result<EntryMut<'_>> {
        if self.index.lookup(key).is_some() {
            return Err(CacheError::DuplicateKey(key));
        }
        let slot = self.reserve(key, now);
        Ok(self.entry_mut(slot))
    }

    // == Refresh ==
    /// Restarts the lifetime of a live entry. Returns `false` if absent.
    pub fn refresh(&mut self, key: u64, now: u64) -> bool {
        match self.lookup_live(key, now) {
            Some(slot) => self.order.refresh(slot, now),
            None => false,
        }
    }

    // == Remove ==
    /// Removes an entry by key. Returns `false` if the key was absent.
    pub fn remove(&mut self, key: u64) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.order.remove(slot);
                self.storage.release(slot);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Releases every occupied bucket.
    pub fn clear(&mut self) {
        let slots: Vec<usize> = self.order.iter_lru().collect();
        for &slot in &slots {
            self.order.remove(slot);
        }
        self.storage.release_all(slots);
        self.index.clear();
        debug!("cache cleared");
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&mut self, now: u64) -> usize {
        let expired: Vec<usize> = self
            .order
            .iter_lru()
            .filter(|&slot| self.order.is_expired(slot, now, self.lifetime))
            .collect();

        for &slot in &expired {
            let key = self.storage.bucket(slot).key();
            self.discard(key, slot);
        }
        self.stats.record_expirations(expired.len());

        if !expired.is_empty() {
            debug!(removed = expired.len(), now, "purged expired entries");
        }
        expired.len()
    }

    // == Complete ==
    /// Finishes a reservation: stores `data`, or marks the entry empty when
    /// `data` is `None`, and clears the pending flag.
    ///
    /// Returns `Ok(false)` without touching the cache if the ticket no
    /// longer refers to a live reservation.
    pub fn complete(&mut self, ticket: Ticket, data: Option<&[u8]>) -> Result<bool> {
        if !self.is_current(ticket) {
            return Ok(false);
        }
        let mut entry = self.entry_mut(ticket.slot);
        match data {
            Some(bytes) => {
                entry.write(bytes)?;
                entry.set_pending(false);
            }
            None => entry.mark_empty(),
        }
        Ok(true)
    }

    // == Abandon ==
    /// Drops a reservation if the ticket still refers to it.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.discard(ticket.key, ticket.slot);
        true
    }

    /// Returns `true` while the ticket's bucket still holds its reservation.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.slot < self.storage.capacity() && {
            let bucket = self.storage.bucket(ticket.slot);
            bucket.is_occupied()
                && bucket.key() == ticket.key
                && bucket.generation() == ticket.generation
        }
    }

    // == Lifetime ==
    /// Changes the lifetime used by every subsequent expiry check,
    /// including for entries created under the previous lifetime.
    pub fn set_lifetime(&mut self, lifetime: u64) {
        self.lifetime = lifetime;
    }

    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.storage.occupied(), self.storage.capacity())
    }

    // == Length ==
    /// Returns the current number of occupied buckets.
    pub fn len(&self) -> usize {
        self.storage.occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.occupied() == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub fn max_record_size(&self) -> usize {
        self.storage.record_size()
    }

    /// Asserts that the index, the recency list and the storage agree.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let count = self.storage.occupied();
        assert!(count <= self.storage.capacity());
        assert_eq!(count, self.index.len(), "index size drifted from bucket count");
        assert_eq!(count, self.order.len(), "recency list drifted from bucket count");
        assert_eq!(count, self.order.iter_lru().count(), "recency list is broken");

        let mut seen = std::collections::HashSet::with_capacity(count);
        for (key, slot) in self.index.iter() {
            assert!(seen.insert(slot), "slot {slot} mapped by two keys");
            let bucket = self.storage.bucket(slot);
            assert!(bucket.is_occupied(), "key {key:#x} maps to free slot {slot}");
            assert_eq!(bucket.key(), key, "slot {slot} holds a different key");
            assert!(self.order.contains(slot), "slot {slot} missing from recency list");
        }
    }

    /// Finds the slot of a live entry, purging it if expired.
    fn lookup_live(&mut self, key: u64, now: u64) -> Option<usize> {
        let Some(slot) = self.index.lookup(key) else {
            self.stats.record_miss();
            return None;
        };
        if self.order.is_expired(slot, now, self.lifetime) {
            debug!(key, slot, now, "entry expired");
            self.discard(key, slot);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }
        Some(slot)
    }

    /// A pending reservation has no value yet, so finding one is a miss.
    fn record_lookup(&mut self, slot: usize) {
        if self.storage.bucket(slot).is_pending() {
            self.stats.record_miss();
        } else {
            self.stats.record_hit();
        }
    }

    /// Assigns a bucket to `key`, evicting the LRU entry if the cache is full.
    fn reserve(&mut self, key: u64, now: u64) -> usize {
        if self.storage.occupied() == self.storage.capacity() {
            self.evict_one(now);
        }

        let slot = match self.storage.acquire() {
            Ok(slot) => slot,
            Err(err) => panic!("bucket bookkeeping out of sync after eviction: {err}"),
        };
        if let Err(err) = self.index.insert(key, slot) {
            panic!("key index out of sync with lookup: {err}");
        }
        self.storage.bucket_mut(slot).key = key;
        self.order.push_mru(slot, now);
        slot
    }

    fn evict_one(&mut self, now: u64) {
        let Some(slot) = self.order.victim() else {
            panic!(
                "cache reports {} occupied buckets but the recency list is empty",
                self.storage.occupied()
            );
        };
        let key = self.storage.bucket(slot).key();
        if self.order.is_expired(slot, now, self.lifetime) {
            self.stats.record_expirations(1);
        } else {
            self.stats.record_eviction();
        }
        debug!(key, slot, "evicting least recently used entry");
        self.discard(key, slot);
    }

    fn discard(&mut self, key: u64, slot: usize) {
        self.index.remove(key);
        self.order.remove(slot);
        self.storage.release(slot);
    }

    fn entry(&self, slot: usize) -> Entry<'_> {
        Entry {
            storage: &self.storage,
            slot,
            created_at: self.order.created_at(slot),
            last_access: self.order.last_access(slot),
        }
    }

    fn entry_mut(&mut self, slot: usize) -> EntryMut<'_> {
        EntryMut {
            created_at: self.order.created_at(slot),
            last_access: self.order.last_access(slot),
            storage: &mut self.storage,
            slot,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_items: usize, lifetime: u64) -> ExpiringCache {
        let config = CacheConfig::default()
            .with_max_items(max_items)
            .with_lifetime(lifetime)
            .with_max_record_size(16);
        ExpiringCache::new(&config).unwrap()
    }

    fn insert(cache: &mut ExpiringCache, key: u64, value: &[u8], now: u64) {
        let (mut entry, existed) = cache.get_or_create(key, now);
        assert!(!existed, "key {key} already present");
        entry.write(value).unwrap();
    }

    #[test]
    fn test_cache_new() {
        let cache = cache(4, 10);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
        assert_eq!(cache.max_record_size(), 16);
        assert_eq!(cache.lifetime(), 10);
    }

    #[test]
    fn test_cache_new_rejects_invalid_config() {
        let config = CacheConfig::default().with_max_items(0);
        assert!(matches!(
            ExpiringCache::new(&config),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_get_or_create_then_get() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"one", 0);

        let entry = cache.get(1, 1).unwrap();
        assert_eq!(entry.payload(), b"one");
        assert_eq!(entry.key(), 1);
        assert_eq!(entry.created_at(), 0);
        assert_eq!(cache.len(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_get_or_create_existing() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"one", 0);

        let (entry, existed) = cache.get_or_create(1, 2);
        assert!(existed);
        assert_eq!(entry.payload(), b"one");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut cache = cache(4, 10);
        assert!(cache.get(42, 0).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_write_too_large_is_reported() {
        let mut cache = cache(2, 10);
        let (mut entry, _) = cache.get_or_create(1, 0);

        let result = entry.write(&[0u8; 17]);
        assert!(matches!(
            result,
            Err(CacheError::RecordTooLarge { size: 17, max: 16 })
        ));
        assert!(entry.payload().is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = cache(3, 100);
        insert(&mut cache, 1, b"a", 0);
        insert(&mut cache, 2, b"b", 0);
        insert(&mut cache, 3, b"c", 0);

        // Cache is full, adding key 4 should evict key 1 (oldest)
        insert(&mut cache, 4, b"d", 0);

        assert_eq!(cache.len(), 3);
        assert!(cache.get(1, 0).is_none());
        assert!(cache.get(2, 0).is_some());
        assert!(cache.get(3, 0).is_some());
        assert!(cache.get(4, 0).is_some());
        assert_eq!(cache.stats().evictions, 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_touch_on_get() {
        let mut cache = cache(2, 10);
        insert(&mut cache, b'A' as u64, b"A", 0);
        insert(&mut cache, b'B' as u64, b"B", 1);

        // Touch A so B becomes least recently used
        assert!(cache.get(b'A' as u64, 2).is_some());
        insert(&mut cache, b'C' as u64, b"C", 3);

        assert!(cache.contains(b'A' as u64, 3));
        assert!(!cache.contains(b'B' as u64, 3));
        assert!(cache.contains(b'C' as u64, 3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_ttl_expiration_boundary() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"v", 100);

        assert!(cache.get(1, 109).is_some());
        assert!(cache.get(1, 110).is_none());
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
        // Creation miss plus the expired lookup
        assert_eq!(stats.misses, 2);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_expired_slot_is_reclaimed_without_eviction() {
        let mut cache = cache(2, 10);
        insert(&mut cache, 1, b"old", 0);
        insert(&mut cache, 2, b"live", 5);

        assert!(cache.get(1, 10).is_none());
        insert(&mut cache, 3, b"new", 10);

        assert!(cache.contains(2, 10));
        assert!(cache.contains(3, 10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entry_recreated_by_get_or_create() {
        let mut cache = cache(2, 10);
        insert(&mut cache, 1, b"old", 0);

        let (entry, existed) = cache.get_or_create(1, 20);
        assert!(!existed);
        assert!(entry.payload().is_empty());
        assert_eq!(entry.created_at(), 20);
    }

    #[test]
    fn test_capacity_eviction_ignores_expiry_of_others() {
        let mut cache = cache(2, 10);
        insert(&mut cache, 1, b"a", 0);
        insert(&mut cache, 2, b"b", 9);
        // Touch key 1 so the expired-looking order differs from age order
        cache.get(1, 9).unwrap();

        // At t=15 key 1 is expired but MRU; key 2 is live but LRU
        insert(&mut cache, 3, b"c", 15);
        assert!(!cache.contains(2, 15));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_set_lifetime_applies_to_existing_entries() {
        let mut cache = cache(4, 100);
        insert(&mut cache, 1, b"v", 0);

        cache.set_lifetime(5);
        assert!(cache.get(1, 5).is_none());

        insert(&mut cache, 2, b"w", 10);
        cache.set_lifetime(1000);
        assert!(cache.get(2, 500).is_some());
    }

    #[test]
    fn test_zero_lifetime_expires_immediately() {
        let mut cache = cache(4, 0);
        insert(&mut cache, 1, b"v", 0);
        assert!(cache.get(1, 0).is_none());
    }

    #[test]
    fn test_remove() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"v", 0);

        assert!(cache.remove(1));
        assert!(cache.is_empty());
        assert!(cache.get(1, 0).is_none());
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"v", 0);

        assert!(!cache.remove(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = cache(4, 10);
        for key in 0..4 {
            insert(&mut cache, key, b"v", 0);
        }

        cache.clear();
        assert!(cache.is_empty());
        cache.debug_validate_invariants();

        // All buckets are reusable afterwards
        for key in 10..14 {
            insert(&mut cache, key, b"w", 1);
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_create_raw() {
        let mut cache = cache(2, 10);
        {
            let mut entry = cache.create_raw(7, 0).unwrap();
            entry.set_pending(true);
        }
        assert!(cache.get(7, 1).unwrap().is_pending());

        assert!(matches!(
            cache.create_raw(7, 1),
            Err(CacheError::DuplicateKey(7))
        ));
    }

    #[test]
    fn test_refresh_restarts_lifetime() {
        let mut cache = cache(2, 10);
        insert(&mut cache, 1, b"v", 0);

        assert!(cache.refresh(1, 8));
        assert!(cache.get(1, 15).is_some());
        assert!(cache.get(1, 18).is_none());
        assert!(!cache.refresh(1, 18));
    }

    #[test]
    fn test_peek_does_not_touch() {
        let mut cache = cache(2, 10);
        insert(&mut cache, 1, b"a", 0);
        insert(&mut cache, 2, b"b", 0);

        assert_eq!(cache.peek(1, 1).unwrap().payload(), b"a");
        insert(&mut cache, 3, b"c", 1);

        // Key 1 stayed LRU despite the peek
        assert!(!cache.contains(1, 1));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"a", 0);
        insert(&mut cache, 2, b"b", 2);
        insert(&mut cache, 3, b"c", 8);

        assert_eq!(cache.purge_expired(12), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(3, 12));
        assert_eq!(cache.purge_expired(12), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_complete_stores_and_clears_pending() {
        let mut cache = cache(2, 10);
        let ticket = {
            let (mut entry, _) = cache.get_or_create(1, 0);
            entry.set_pending(true);
            entry.ticket()
        };

        assert!(cache.complete(ticket, Some(b"data")).unwrap());
        let entry = cache.get(1, 1).unwrap();
        assert!(!entry.is_pending());
        assert_eq!(entry.payload(), b"data");
    }

    #[test]
    fn test_complete_with_none_marks_empty() {
        let mut cache = cache(2, 10);
        let ticket = {
            let (mut entry, _) = cache.get_or_create(1, 0);
            entry.set_pending(true);
            entry.ticket()
        };

        assert!(cache.complete(ticket, None).unwrap());
        let entry = cache.get(1, 1).unwrap();
        assert!(!entry.is_pending());
        assert!(entry.is_empty_value());
        assert!(entry.payload().is_empty());
    }

    #[test]
    fn test_complete_rejects_stale_ticket() {
        let mut cache = cache(1, 10);
        let ticket = cache.get_or_create(1, 0).0.ticket();

        // Evict key 1; key 2 lands in the same bucket
        insert(&mut cache, 2, b"two", 1);
        assert!(!cache.is_current(ticket));

        assert!(!cache.complete(ticket, Some(b"one")).unwrap());
        assert_eq!(cache.get(2, 1).unwrap().payload(), b"two");
        assert!(!cache.abandon(ticket));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_complete_rejects_ticket_after_same_key_recreated() {
        let mut cache = cache(2, 10);
        let ticket = cache.get_or_create(1, 0).0.ticket();
        cache.remove(1);
        cache.get_or_create(1, 1).0.set_pending(true);

        assert!(!cache.complete(ticket, Some(b"late")).unwrap());
        assert!(cache.get(1, 1).unwrap().is_pending());
    }

    #[test]
    fn test_complete_too_large_keeps_reservation() {
        let mut cache = cache(2, 10);
        let ticket = cache.create_raw(1, 0).unwrap().ticket();

        let result = cache.complete(ticket, Some(&[1u8; 32]));
        assert!(matches!(result, Err(CacheError::RecordTooLarge { .. })));
        assert!(cache.is_current(ticket));

        assert!(cache.abandon(ticket));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pending_lookup_counts_as_miss() {
        let mut cache = cache(4, 10);
        cache.create_raw(1, 0).unwrap().set_pending(true);

        assert!(cache.get(1, 1).unwrap().is_pending());
        let (_, existed) = cache.get_or_create(1, 2);
        assert!(existed);

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_entry_reports_last_access() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"v", 3);
        assert_eq!(cache.peek(1, 3).unwrap().last_access(), 3);

        let entry = cache.get(1, 7).unwrap();
        assert_eq!(entry.created_at(), 3);
        assert_eq!(entry.last_access(), 7);

        // Peeking leaves the access time alone
        assert_eq!(cache.peek(1, 9).unwrap().last_access(), 7);
    }

    #[test]
    fn test_stats_track_hits_misses_and_entries() {
        let mut cache = cache(4, 10);
        insert(&mut cache, 1, b"v", 0);
        cache.get(1, 0).unwrap();
        let _ = cache.get(2, 0);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        // The miss from the initial get_or_create counts too
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.total_entries, 1);
    }
}
