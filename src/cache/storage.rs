//! Bucket Storage Module
//!
//! Fixed-capacity array of fixed-size payload slots. The whole payload area
//! is allocated once at construction; slots are handed out from a free list
//! and reused in place without reallocation.

use crate::error::{CacheError, Result};

// == Bucket ==
/// Metadata for one storage slot.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Whether the slot currently holds a live entry
    pub(crate) occupied: bool,
    /// Key the slot is assigned to (meaningful only while occupied)
    pub(crate) key: u64,
    /// Number of payload bytes written
    pub(crate) len: usize,
    /// Bumped on every acquire so stale tickets can be detected
    pub(crate) generation: u64,
    /// Reserved by an in-flight fetch, not yet populated
    pub(crate) pending: bool,
    /// Remembered negative lookup
    pub(crate) empty: bool,
}

impl Bucket {
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_empty_value(&self) -> bool {
        self.empty
    }
}

// == Bucket Storage ==
/// Slot allocator over a single contiguous payload buffer.
#[derive(Debug)]
pub struct BucketStorage {
    /// `capacity * record_size` bytes, slot `i` starts at `i * record_size`
    payload: Box<[u8]>,
    /// Per-slot metadata, indexed by slot
    buckets: Vec<Bucket>,
    /// Released slots, reused LIFO
    free: Vec<usize>,
    /// First slot that has never been handed out
    next_unused: usize,
    record_size: usize,
    occupied: usize,
}

impl BucketStorage {
    // == Constructor ==
    /// Allocates `capacity` buckets of `record_size` bytes each.
    ///
    /// # Panics
    ///
    /// Panics if `capacity * record_size` overflows `usize`. `CacheConfig::validate`
    /// rejects such configurations before a cache is built.
    pub fn new(capacity: usize, record_size: usize) -> Self {
        let Some(total) = capacity.checked_mul(record_size) else {
            panic!("payload area of {capacity} x {record_size} bytes overflows usize");
        };
        Self {
            payload: vec![0u8; total].into_boxed_slice(),
            buckets: vec![Bucket::default(); capacity],
            free: Vec::with_capacity(capacity),
            next_unused: 0,
            record_size,
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    // == Acquire ==
    /// Hands out a free slot, preferring previously released ones.
    ///
    /// The returned slot is occupied, has no key, zero length and cleared
    /// flags. Fails with `CapacityExceeded` when every slot is in use.
    pub fn acquire(&mut self) -> Result<usize> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None if self.next_unused < self.buckets.len() => {
                self.next_unused += 1;
                self.next_unused - 1
            }
            None => return Err(CacheError::CapacityExceeded),
        };

        let bucket = &mut self.buckets[slot];
        debug_assert!(!bucket.occupied, "free list handed out occupied slot {slot}");
        bucket.occupied = true;
        bucket.key = 0;
        bucket.len = 0;
        bucket.generation = bucket.generation.wrapping_add(1);
        bucket.pending = false;
        bucket.empty = false;
        self.occupied += 1;
        Ok(slot)
    }

    // == Release ==
    /// Returns a slot to the free list. Payload bytes are left as they are.
    ///
    /// Returns `false` if the slot was not occupied.
    pub fn release(&mut self, slot: usize) -> bool {
        let bucket = &mut self.buckets[slot];
        if !bucket.occupied {
            return false;
        }
        bucket.occupied = false;
        bucket.pending = false;
        bucket.empty = false;
        self.free.push(slot);
        self.occupied -= 1;
        true
    }

    // == Release All ==
    /// Releases every slot yielded by `slots`.
    pub fn release_all(&mut self, slots: impl IntoIterator<Item = usize>) {
        for slot in slots {
            self.release(slot);
        }
    }

    // == Write ==
    /// Copies `bytes` into the slot's payload.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`capacity`](Self::capacity).
    pub fn write(&mut self, slot: usize, bytes: &[u8]) -> Result<()> {
        self.check_slot(slot);
        if bytes.len() > self.record_size {
            return Err(CacheError::RecordTooLarge {
                size: bytes.len(),
                max: self.record_size,
            });
        }
        let start = slot * self.record_size;
        self.payload[start..start + bytes.len()].copy_from_slice(bytes);
        self.buckets[slot].len = bytes.len();
        Ok(())
    }

    // == Read ==
    /// Returns the bytes last written to the slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`capacity`](Self::capacity).
    pub fn read(&self, slot: usize) -> &[u8] {
        self.check_slot(slot);
        let start = slot * self.record_size;
        &self.payload[start..start + self.buckets[slot].len]
    }

    pub fn bucket(&self, slot: usize) -> &Bucket {
        &self.buckets[slot]
    }

    pub(crate) fn bucket_mut(&mut self, slot: usize) -> &mut Bucket {
        &mut self.buckets[slot]
    }

    fn check_slot(&self, slot: usize) {
        assert!(
            slot < self.buckets.len(),
            "slot {slot} out of range for {} buckets",
            self.buckets.len()
        );
    }
}
