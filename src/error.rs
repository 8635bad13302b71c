//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Absence of a value is
//! never an error; lookups report it as `None`.

use thiserror::Error;

/// Boxed error produced by an external record source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache and its loaders.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Record does not fit into a bucket
    #[error("Record too large: {size} bytes exceeds bucket size of {max} bytes")]
    RecordTooLarge { size: usize, max: usize },

    /// No free bucket left; callers must evict before acquiring
    #[error("Capacity exceeded: all buckets are occupied")]
    CapacityExceeded,

    /// Key already has a bucket assigned
    #[error("Duplicate key: {0:#018x}")]
    DuplicateKey(u64),

    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external source reported a failure (not the same as "no value")
    #[error("External fetch failed: {0}")]
    ExternalFetch(#[source] BoxError),

    /// Record could not be encoded or decoded
    #[error("Record codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
