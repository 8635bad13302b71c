//! Cache Module
//!
//! Fixed-capacity bucket cache with TTL expiration and LRU eviction.

mod index;
mod order;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use index::KeyIndex;
pub use order::{EvictionOrder, LruIter};
pub use stats::CacheStats;
pub use storage::{Bucket, BucketStorage};
pub use store::{Entry, EntryMut, ExpiringCache, Ticket};
