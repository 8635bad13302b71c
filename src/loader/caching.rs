//! Caching Loader
//!
//! Serves records from an `ExpiringCache` and fills misses from an external
//! `RecordSource`.
//!
//! A miss reserves the key's bucket and marks it pending before the fetch
//! starts. The cache lock is released across the fetch, so other tasks may
//! run meanwhile; any of them asking for the same key sees the pending
//! reservation and gets "not found" instead of starting a second fetch.
//! Nobody waits on the reservation.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheStats, Entry, ExpiringCache, Ticket};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::loader::source::EncodeError;
use crate::loader::{Clock, FetchResult, RecordSource, SystemClock};

/// Outcome of the synchronous part of a load.
#[derive(Debug)]
enum Lookup {
    /// Live value, already copied out of the bucket
    Hit(Vec<u8>),
    /// Pending reservation or remembered empty value
    Miss,
    /// Bucket reserved for this caller's fetch
    Reserved(Ticket),
}

impl Lookup {
    fn from_entry(entry: &Entry<'_>) -> Self {
        if entry.is_pending() || entry.is_empty_value() {
            Lookup::Miss
        } else {
            Lookup::Hit(entry.payload().to_vec())
        }
    }
}

// == Caching Loader ==
/// Read-through loader over a shared `ExpiringCache`.
pub struct CachingLoader<S, C = SystemClock> {
    cache: Arc<RwLock<ExpiringCache>>,
    source: S,
    clock: C,
    /// Remember fetches that found nothing until they expire
    add_empty_values: bool,
}

impl<S: RecordSource> CachingLoader<S, SystemClock> {
    // == Constructor ==
    /// Creates a loader with its own cache, using the wall clock.
    pub fn new(config: &CacheConfig, source: S) -> Result<Self> {
        Self::with_clock(config, source, SystemClock)
    }
}

impl<S: RecordSource, C: Clock> CachingLoader<S, C> {
    /// Creates a loader with its own cache and the given clock.
    pub fn with_clock(config: &CacheConfig, source: S, clock: C) -> Result<Self> {
        let cache = ExpiringCache::new(config)?;
        Ok(Self::with_shared_cache(
            Arc::new(RwLock::new(cache)),
            source,
            clock,
            config.add_empty_values,
        ))
    }

    /// Creates a loader over an existing cache, which other loaders may share.
    pub fn with_shared_cache(
        cache: Arc<RwLock<ExpiringCache>>,
        source: S,
        clock: C,
        add_empty_values: bool,
    ) -> Self {
        Self {
            cache,
            source,
            clock,
            add_empty_values,
        }
    }

    // == Load ==
    /// Returns the record for `key`, fetching it from the source on a miss.
    ///
    /// Returns `Ok(None)` when the source has nothing for the key, when a
    /// remembered empty value is cached, or when another task's fetch for
    /// the same key is still in flight.
    pub async fn load(&self, key: u64) -> Result<Option<Vec<u8>>> {
        let ticket = match self.lookup_or_reserve(key).await? {
            Lookup::Hit(bytes) => return Ok(Some(bytes)),
            Lookup::Miss => return Ok(None),
            Lookup::Reserved(ticket) => ticket,
        };

        debug!(key, "cache miss, fetching from source");
        let fetched = self.source.fetch(key).await;
        self.finish(ticket, fetched).await
    }

    async fn lookup_or_reserve(&self, key: u64) -> Result<Lookup> {
        let now = self.clock.now();
        let mut cache = self.cache.write().await;

        if self.add_empty_values {
            let (mut entry, existed) = cache.get_or_create(key, now);
            if existed {
                return Ok(Lookup::from_entry(&entry.as_entry()));
            }
            entry.set_pending(true);
            return Ok(Lookup::Reserved(entry.ticket()));
        }

        if let Some(entry) = cache.get(key, now) {
            return Ok(Lookup::from_entry(&entry));
        }
        let mut entry = cache.create_raw(key, now)?;
        entry.set_pending(true);
        Ok(Lookup::Reserved(entry.ticket()))
    }

    async fn finish(&self, ticket: Ticket, fetched: FetchResult) -> Result<Option<Vec<u8>>> {
        let key = ticket.key();
        let mut cache = self.cache.write().await;

        match fetched {
            Ok(Some(bytes)) => {
                match cache.complete(ticket, Some(&bytes)) {
                    Ok(true) => {}
                    Ok(false) => debug!(key, "reservation was dropped during fetch, not caching"),
                    Err(err) => {
                        cache.abandon(ticket);
                        warn!(key, error = %err, "fetched record rejected");
                        return Err(err);
                    }
                }
                Ok(Some(bytes))
            }
            Ok(None) => {
                if self.add_empty_values {
                    cache.complete(ticket, None)?;
                } else {
                    cache.abandon(ticket);
                }
                debug!(key, cached = self.add_empty_values, "source has no record");
                Ok(None)
            }
            Err(err) => {
                cache.abandon(ticket);
                match err.downcast::<EncodeError>() {
                    Ok(encode) => {
                        warn!(key, error = %encode, "fetched record rejected");
                        Err(CacheError::Codec(encode.0))
                    }
                    Err(err) => {
                        warn!(key, error = %err, "external fetch failed");
                        Err(CacheError::ExternalFetch(err))
                    }
                }
            }
        }
    }

    // == Remove ==
    /// Drops the cached entry for `key`, pending or not.
    pub async fn remove(&self, key: u64) -> bool {
        self.cache.write().await.remove(key)
    }

    /// Changes the lifetime of every entry in the underlying cache.
    pub async fn set_lifetime(&self, lifetime: u64) {
        self.cache.write().await.set_lifetime(lifetime);
    }

    /// Removes expired entries from the underlying cache.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.cache.write().await.purge_expired(now)
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Shared handle to the underlying cache.
    pub fn cache(&self) -> Arc<RwLock<ExpiringCache>> {
        Arc::clone(&self.cache)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn add_empty_values(&self) -> bool {
        self.add_empty_values
    }
}
