//! In-memory caching with request coalescing.
//!
//! [`MemoizingCache`] deduplicates concurrent computations for the same key, keeps a bounded
//! number of successful results for a limited time, and never caches failures.

use std::time::Duration;

use serde::Deserialize;

mod memory;


pub use memory::MemoizingCache;

/// The default maximum number of entries of a [`MemoizingCache`].
pub const DEFAULT_MAX_SIZE: usize = 100;

/// The default maximum age of an entry of a [`MemoizingCache`].
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

/// Size and age limits of a [`MemoizingCache`].
#[derive(Debug, Clone, Copy, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries before the least recently used one is evicted.
    pub max_size: usize,

    /// Maximum duration since an entry was computed before it is evicted.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl CacheConfig {
    /// Replaces zero limits with the defaults.
    pub fn normalized(self) -> Self {
        Self {
            max_size: match self.max_size {
                0 => DEFAULT_MAX_SIZE,
                size => size,
            },
            max_age: if self.max_age.is_zero() {
                DEFAULT_MAX_AGE
            } else {
                self.max_age
            },
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}
