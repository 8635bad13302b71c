//! Struct Loader
//!
//! Typed front of `CachingLoader`: records are JSON-encoded into buckets on
//! the way in and decoded from a copied-out payload on the way out.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, ExpiringCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::loader::{CachingLoader, Clock, Encoded, StructSource, SystemClock};

// == Struct Loader ==
/// Read-through loader for serde records of type `T`.
pub struct StructLoader<T, S, C = SystemClock> {
    inner: CachingLoader<Encoded<S, T>, C>,
    _record: PhantomData<fn() -> T>,
}

impl<T, S> StructLoader<T, S, SystemClock>
where
    T: Serialize + DeserializeOwned + Send,
    S: StructSource<T>,
{
    // == Constructor ==
    pub fn new(config: &CacheConfig, source: S) -> Result<Self> {
        Self::with_clock(config, source, SystemClock)
    }
}

impl<T, S, C> StructLoader<T, S, C>
where
    T: Serialize + DeserializeOwned + Send,
    S: StructSource<T>,
    C: Clock,
{
    pub fn with_clock(config: &CacheConfig, source: S, clock: C) -> Result<Self> {
        Ok(Self {
            inner: CachingLoader::with_clock(config, Encoded::new(source), clock)?,
            _record: PhantomData,
        })
    }

    /// Creates a loader over an existing cache, which other loaders may share.
    pub fn with_shared_cache(
        cache: Arc<RwLock<ExpiringCache>>,
        source: S,
        clock: C,
        add_empty_values: bool,
    ) -> Self {
        Self {
            inner: CachingLoader::with_shared_cache(
                cache,
                Encoded::new(source),
                clock,
                add_empty_values,
            ),
            _record: PhantomData,
        }
    }

    // == Load ==
    /// Returns the record for `key`, fetching and caching it on a miss.
    ///
    /// See [`CachingLoader::load`] for when `Ok(None)` is returned.
    pub async fn load(&self, key: u64) -> Result<Option<T>> {
        match self.inner.load(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, key: u64) -> bool {
        self.inner.remove(key).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }

    pub fn cache(&self) -> Arc<RwLock<ExpiringCache>> {
        self.inner.cache()
    }

    pub fn source(&self) -> &S {
        self.inner.source().inner()
    }

    /// The untyped loader underneath.
    pub fn loader(&self) -> &CachingLoader<Encoded<S, T>, C> {
        &self.inner
    }
}
