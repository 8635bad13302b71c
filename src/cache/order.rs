//! Eviction Order Module
//!
//! Tracks recency and age of occupied buckets for LRU eviction and TTL expiry.
//!
//! The bucket array doubles as the arena: node `i` belongs to slot `i` and
//! the links are plain slot indices, so every splice is O(1).
//!
//! ```text
//!   head (MRU) ─► [slot 3] ◄──► [slot 0] ◄──► [slot 5] ◄── tail (LRU)
//! ```

/// Link value meaning "no neighbour".
const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    prev: usize,
    next: usize,
    linked: bool,
    /// Time the entry was created (seconds)
    created_at: u64,
    /// Start of the current lifetime (seconds)
    refreshed_at: u64,
    /// Last time the entry was touched (seconds)
    accessed_at: u64,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            prev: NIL,
            next: NIL,
            linked: false,
            created_at: 0,
            refreshed_at: 0,
            accessed_at: 0,
        }
    }
}

// == Eviction Order ==
/// Intrusive recency list over bucket slots.
///
/// - Front (head) = most recently used
/// - Back (tail) = least recently used, the next eviction victim
#[derive(Debug)]
pub struct EvictionOrder {
    nodes: Vec<Node>,
    head: usize,
    tail: usize,
    len: usize,
}

impl EvictionOrder {
    // == Constructor ==
    /// Creates an empty order for slots `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: vec![Node::default(); capacity],
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Push MRU ==
    /// Links a newly created entry at the MRU end, starting its lifetime at `now`.
    pub fn push_mru(&mut self, slot: usize, now: u64) {
        debug_assert!(!self.nodes[slot].linked, "slot {slot} linked twice");
        let node = &mut self.nodes[slot];
        node.created_at = now;
        node.refreshed_at = now;
        node.accessed_at = now;
        self.attach_front(slot);
        self.len += 1;
    }

    // == Touch ==
    /// Marks a slot as recently used (moves to front).
    ///
    /// Touching does not restart the lifetime; see [`EvictionOrder::refresh`].
    /// Returns `false` if the slot is not in the list.
    pub fn touch(&mut self, slot: usize, now: u64) -> bool {
        if !self.nodes[slot].linked {
            return false;
        }
        if self.head != slot {
            self.detach(slot);
            self.attach_front(slot);
        }
        self.nodes[slot].accessed_at = now;
        true
    }

    // == Refresh ==
    /// Restarts the slot's lifetime at `now` and touches it.
    pub fn refresh(&mut self, slot: usize, now: u64) -> bool {
        if !self.touch(slot, now) {
            return false;
        }
        self.nodes[slot].refreshed_at = now;
        true
    }

    // == Remove ==
    /// Unlinks a slot. Returns `false` if it was not in the list.
    pub fn remove(&mut self, slot: usize) -> bool {
        if !self.nodes[slot].linked {
            return false;
        }
        self.detach(slot);
        self.len -= 1;
        true
    }

    // == Victim ==
    /// Returns the least recently used slot without unlinking it.
    ///
    /// Returns None if the list is empty.
    pub fn victim(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    // == Expiry ==
    /// An entry is expired once `lifetime` seconds have passed since its
    /// last refresh. A clock that steps backwards never expires anything.
    pub fn is_expired(&self, slot: usize, now: u64, lifetime: u64) -> bool {
        now.saturating_sub(self.nodes[slot].refreshed_at) >= lifetime
    }

    pub fn created_at(&self, slot: usize) -> u64 {
        self.nodes[slot].created_at
    }

    pub fn refreshed_at(&self, slot: usize) -> u64 {
        self.nodes[slot].refreshed_at
    }

    pub fn last_access(&self, slot: usize) -> u64 {
        self.nodes[slot].accessed_at
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.nodes[slot].linked
    }

    /// Iterates slots from least to most recently used.
    pub fn iter_lru(&self) -> LruIter<'_> {
        LruIter {
            order: self,
            current: self.tail,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn attach_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[slot];
            node.prev = NIL;
            node.next = old_head;
            node.linked = true;
        }
        if old_head != NIL {
            self.nodes[old_head].prev = slot;
        } else {
            self.tail = slot;
        }
        self.head = slot;
    }

    fn detach(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        let node = &mut self.nodes[slot];
        node.prev = NIL;
        node.next = NIL;
        node.linked = false;
    }
}

/// Iterator from the LRU end towards the MRU end.
pub struct LruIter<'a> {
    order: &'a EvictionOrder,
    current: usize,
}

impl Iterator for LruIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NIL {
            return None;
        }
        let slot = self.current;
        self.current = self.order.nodes[slot].prev;
        Some(slot)
    }
}
