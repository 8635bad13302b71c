//! Slotcache - A fixed-capacity expiring bucket cache
//!
//! Provides a bucket cache with TTL expiration and LRU eviction, plus
//! read-through loaders that fill it from external sources.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;

pub use cache::{CacheStats, ExpiringCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use loader::{CachingLoader, StructLoader};
