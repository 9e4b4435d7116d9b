//! ContentGuard Cache
//!
//! Result cache fronting the moderation providers.
//!
//! Entries are keyed by the SHA-256 of `(content type, content)`, expire a
//! fixed TTL after insertion, and are evicted oldest-inserted first once the
//! cache is full. A background sweep removes stale entries every `ttl / 2`
//! for as long as the manager is alive.

pub mod entry;
pub mod manager;
pub mod stats;

pub use entry::{cache_key, BatchGetItem, BatchResult, BatchSetItem, CacheEntry};
pub use manager::{CacheManager, EvictionCallback, ThresholdCallback};
pub use stats::{CacheStats, CacheThresholds, TypeStats};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::entry::{BatchGetItem, BatchSetItem, CacheEntry};
    pub use crate::manager::CacheManager;
    pub use crate::stats::{CacheStats, CacheThresholds};
}
