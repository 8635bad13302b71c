//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Number of buckets, fixed for the lifetime of the cache
    pub max_items: usize,
    /// Entry lifetime in seconds, measured from creation
    pub lifetime: u64,
    /// Size of a single bucket payload in bytes
    pub max_record_size: usize,
    /// Whether a fetch that finds nothing is remembered as an empty value
    pub add_empty_values: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ITEMS` - Number of buckets (default: 1000)
    /// - `CACHE_LIFETIME` - Entry lifetime in seconds (default: 300)
    /// - `CACHE_MAX_RECORD_SIZE` - Bucket payload size in bytes (default: 1024)
    /// - `CACHE_ADD_EMPTY_VALUES` - Cache negative lookups (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_items: parse_var("CACHE_MAX_ITEMS").unwrap_or(defaults.max_items),
            lifetime: parse_var("CACHE_LIFETIME").unwrap_or(defaults.lifetime),
            max_record_size: parse_var("CACHE_MAX_RECORD_SIZE")
                .unwrap_or(defaults.max_record_size),
            add_empty_values: parse_var("CACHE_ADD_EMPTY_VALUES")
                .unwrap_or(defaults.add_empty_values),
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_lifetime(mut self, lifetime: u64) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_max_record_size(mut self, max_record_size: usize) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    pub fn with_add_empty_values(mut self, add_empty_values: bool) -> Self {
        self.add_empty_values = add_empty_values;
        self
    }

    /// Rejects configurations that cannot back a cache.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(CacheError::InvalidConfig(
                "max_items must be at least 1".to_string(),
            ));
        }
        if self.max_record_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_record_size must be at least 1 byte".to_string(),
            ));
        }
        if self.max_items.checked_mul(self.max_record_size).is_none() {
            return Err(CacheError::InvalidConfig(format!(
                "{} buckets of {} bytes overflow the address space",
                self.max_items, self.max_record_size
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: 1000,
            lifetime: 300,
            max_record_size: 1024,
            add_empty_values: false,
        }
    }
}
