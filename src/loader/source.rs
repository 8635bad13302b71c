//! Loader Collaborators
//!
//! Clock, key hashing and the external record sources the loaders fetch from.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::BoxError;

// == Clock ==
/// Source of the current time in whole seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Pre-epoch clocks are clamped rather than wrapped
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Key Hashing ==
/// Deterministically hashes an application key to the 64-bit cache key.
pub fn hash_key(key: impl AsRef<[u8]>) -> u64 {
    xxh3_64(key.as_ref())
}

// == Record Sources ==
/// Outcome of one external fetch: a record, `None` when the source has
/// nothing for the key, or the source's own failure.
pub type FetchResult = std::result::Result<Option<Vec<u8>>, BoxError>;

/// External source of raw records for keys missing from the cache.
///
/// The returned future may suspend. A future that never completes leaves
/// the key's reservation pending.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, key: u64) -> impl Future<Output = FetchResult> + Send;
}

impl<S: RecordSource> RecordSource for Arc<S> {
    fn fetch(&self, key: u64) -> impl Future<Output = FetchResult> + Send {
        (**self).fetch(key)
    }
}

/// External source of typed records.
pub trait StructSource<T>: Send + Sync {
    fn fetch(
        &self,
        key: u64,
    ) -> impl Future<Output = std::result::Result<Option<T>, BoxError>> + Send;
}

impl<T, S: StructSource<T>> StructSource<T> for Arc<S> {
    fn fetch(
        &self,
        key: u64,
    ) -> impl Future<Output = std::result::Result<Option<T>, BoxError>> + Send {
        (**self).fetch(key)
    }
}

/// Adapts a [`StructSource`] into a [`RecordSource`] by JSON-encoding records.
#[derive(Debug)]
pub struct Encoded<S, T> {
    inner: S,
    _record: PhantomData<fn() -> T>,
}

impl<S, T> Encoded<S, T> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _record: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, T> RecordSource for Encoded<S, T>
where
    S: StructSource<T>,
    T: Serialize + Send,
{
    fn fetch(&self, key: u64) -> impl Future<Output = FetchResult> + Send {
        encode_record(self.inner.fetch(key))
    }
}

/// A fetched record that could not be serialized. Carried through
/// [`FetchResult`] so the loader can report it as a codec error rather
/// than a source failure.
#[derive(Debug, Error)]
#[error("fetched record could not be encoded: {0}")]
pub(crate) struct EncodeError(pub(crate) serde_json::Error);

async fn encode_record<T: Serialize>(
    pending: impl Future<Output = std::result::Result<Option<T>, BoxError>>,
) -> FetchResult {
    let Some(record) = pending.await? else {
        return Ok(None);
    };
    match serde_json::to_vec(&record) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) => Err(Box::new(EncodeError(err))),
    }
}
