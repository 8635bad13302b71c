//! Loader Module
//!
//! Read-through loaders that fill an `ExpiringCache` from external sources.

mod caching;
mod source;
mod typed;

pub use caching::CachingLoader;
pub use source::{
    hash_key, Clock, Encoded, FetchResult, ManualClock, RecordSource, StructSource, SystemClock,
};
pub use typed::StructLoader;
