//! Cache entries, keys, and batch item types

use contentguard_core::ContentType;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::Instant;

/// Hex-encoded SHA-256 of the content type code followed by the content bytes
pub fn cache_key(content_type: ContentType, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update([content_type.code()]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A single cached value with its access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value
    pub value: V,

    /// Content type the value was produced for
    pub content_type: ContentType,

    /// Caller-declared byte cost, used for memory accounting only
    pub size: u64,

    /// When the entry was inserted (or last replaced)
    pub inserted_at: Instant,

    /// `inserted_at + ttl`
    pub expires_at: Instant,

    /// Last successful read
    pub last_access: Instant,

    /// Number of successful reads
    pub access_count: u64,

    /// Insertion sequence number; lower is older
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(
        value: V,
        content_type: ContentType,
        size: u64,
        ttl: Duration,
        seq: u64,
    ) -> Self {
        let now = Instant::now();
        Self {
            value,
            content_type,
            size,
            inserted_at: now,
            expires_at: now + ttl,
            last_access: now,
            access_count: 0,
            seq,
        }
    }

    /// Stale once strictly past its expiry
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Time since insertion
    pub fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }
}

/// Lookup request for [`CacheManager::batch_get`](crate::CacheManager::batch_get)
#[derive(Debug, Clone)]
pub struct BatchGetItem {
    pub content_type: ContentType,
    pub content: String,
}

impl BatchGetItem {
    pub fn new(content_type: ContentType, content: impl Into<String>) -> Self {
        Self {
            content_type,
            content: content.into(),
        }
    }
}

/// Insert request for [`CacheManager::batch_set`](crate::CacheManager::batch_set)
#[derive(Debug, Clone)]
pub struct BatchSetItem<V> {
    pub content_type: ContentType,
    pub content: String,
    pub value: V,
    pub size: u64,
}

impl<V> BatchSetItem<V> {
    pub fn new(content_type: ContentType, content: impl Into<String>, value: V, size: u64) -> Self {
        Self {
            content_type,
            content: content.into(),
            value,
            size,
        }
    }
}

/// Per-item outcome of a batch lookup
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<V> {
    pub found: bool,
    pub value: Option<V>,
}

impl<V> BatchResult<V> {
    pub(crate) fn hit(value: V) -> Self {
        Self {
            found: true,
            value: Some(value),
        }
    }

    pub(crate) fn miss() -> Self {
        Self {
            found: false,
            value: None,
        }
    }
}
