//! TTL + capacity bounded cache manager
//!
//! All state lives behind one `RwLock`. Every lookup mutates hit/miss
//! counters and access bookkeeping, so `get` and `batch_get` take the write
//! side; only [`CacheManager::get_stats`] reads under the shared side.
//!
//! Eviction is FIFO by insertion: a `BTreeMap` keyed by insertion sequence
//! gives the oldest entry in `O(log n)` without scanning. Callbacks are
//! invoked after the lock is released.

use crate::entry::{cache_key, BatchGetItem, BatchResult, BatchSetItem, CacheEntry};
use crate::stats::{CacheStats, CacheThresholds, TypeStats};
use contentguard_core::{ContentType, Error};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Called with the key and the removed entry on every TTL or capacity eviction
pub type EvictionCallback<V> = Arc<dyn Fn(&str, &CacheEntry<V>) + Send + Sync>;

/// Called with a stats snapshot when a sweep finds a threshold violated
pub type ThresholdCallback = Arc<dyn Fn(&CacheStats) + Send + Sync>;

const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Moderation result cache
pub struct CacheManager<V> {
    shared: Arc<Shared<V>>,
    sweeper: CancellationToken,
}

struct Shared<V> {
    state: RwLock<CacheState<V>>,
    max_entries: usize,
    ttl: Duration,
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// insertion sequence -> key
    order: BTreeMap<u64, String>,
    next_seq: u64,
    counters: AccessCounters,
    per_type: HashMap<ContentType, AccessCounters>,
    thresholds: Option<CacheThresholds>,
    eviction_callback: Option<EvictionCallback<V>>,
    threshold_callback: Option<ThresholdCallback>,
}

#[derive(Debug, Clone, Copy, Default)]
struct AccessCounters {
    hits: u64,
    misses: u64,
    total_time_ms: f64,
}

impl AccessCounters {
    fn record(&mut self, hit: bool, elapsed_ms: f64) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.total_time_ms += elapsed_ms;
    }

    fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn avg_time_ms(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.total_time_ms / total as f64
        }
    }
}

type Evicted<V> = Vec<(String, CacheEntry<V>)>;

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            counters: AccessCounters::default(),
            per_type: HashMap::new(),
            thresholds: None,
            eviction_callback: None,
            threshold_callback: None,
        }
    }

    fn record_access(&mut self, content_type: ContentType, hit: bool, elapsed_ms: f64) {
        self.counters.record(hit, elapsed_ms);
        self.per_type
            .entry(content_type)
            .or_default()
            .record(hit, elapsed_ms);
    }

    /// Look up a key, updating access bookkeeping on a fresh hit
    fn lookup(&mut self, key: &str, now: Instant) -> Option<&CacheEntry<V>> {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.access_count += 1;
                entry.last_access = now;
                Some(entry)
            }
            _ => None,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn insert(&mut self, key: String, mut entry: CacheEntry<V>) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        if let Some(previous) = self.entries.remove(&key) {
            self.order.remove(&previous.seq);
        }
        self.order.insert(entry.seq, key.clone());
        self.entries.insert(key, entry);
    }

    /// Remove the `count` oldest-inserted entries
    fn evict_oldest(&mut self, count: usize) -> Evicted<V> {
        let keys: Vec<String> = self.order.values().take(count).cloned().collect();
        keys.into_iter()
            .filter_map(|key| self.remove(&key).map(|entry| (key, entry)))
            .collect()
    }

    fn snapshot(&self, now: Instant) -> CacheStats {
        let mut type_stats: BTreeMap<ContentType, TypeStats> = BTreeMap::new();
        let mut memory_usage = 0u64;
        let mut expired_entries = 0usize;

        for entry in self.entries.values() {
            memory_usage += entry.size;
            if entry.is_expired_at(now) {
                expired_entries += 1;
            }
            type_stats.entry(entry.content_type).or_default().count += 1;
        }

        for (content_type, counters) in &self.per_type {
            let stats = type_stats.entry(*content_type).or_default();
            stats.hit_rate = counters.hit_rate();
            stats.avg_latency = counters.avg_time_ms();
        }

        CacheStats {
            size: self.entries.len(),
            memory_usage,
            hit_rate: self.counters.hit_rate(),
            avg_access_time: self.counters.avg_time_ms(),
            expired_entries,
            hits: self.counters.hits,
            misses: self.counters.misses,
            type_stats,
        }
    }
}

impl<V> Shared<V> {
    /// Remove every stale entry, then check thresholds
    fn purge_expired(&self) -> usize {
        let (evicted, callback, alert) = {
            let mut state = self.state.write();
            let now = Instant::now();

            let stale: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            let evicted: Evicted<V> = stale
                .into_iter()
                .filter_map(|key| state.remove(&key).map(|entry| (key, entry)))
                .collect();

            let alert = match (&state.thresholds, &state.threshold_callback) {
                (Some(thresholds), Some(callback)) => {
                    let stats = state.snapshot(now);
                    if thresholds.violations(&stats).is_empty() {
                        None
                    } else {
                        Some((callback.clone(), stats))
                    }
                }
                _ => None,
            };

            (evicted, state.eviction_callback.clone(), alert)
        };

        let removed = evicted.len();
        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
        notify_evicted(callback.as_ref(), &evicted);

        if let Some((callback, stats)) = alert {
            callback(&stats);
        }

        removed
    }
}

fn notify_evicted<V>(callback: Option<&EvictionCallback<V>>, evicted: &Evicted<V>) {
    if let Some(callback) = callback {
        for (key, entry) in evicted {
            callback(key, entry);
        }
    }
}

fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `max_entries` values for `ttl` each.
    ///
    /// When called inside a tokio runtime a sweep task is spawned that runs
    /// every `ttl / 2` until the manager is closed or dropped. Outside a
    /// runtime stale entries are still never served, just not swept.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: RwLock::new(CacheState::new()),
            max_entries: max_entries.max(1),
            ttl,
        });
        let sweeper = CancellationToken::new();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let period = (ttl / 2).max(MIN_SWEEP_PERIOD);
                handle.spawn(sweep_loop(Arc::downgrade(&shared), period, sweeper.clone()));
            }
            Err(_) => warn!("No tokio runtime, cache sweep task not started"),
        }

        Self { shared, sweeper }
    }

    /// Configured capacity
    pub fn max_entries(&self) -> usize {
        self.shared.max_entries
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Number of entries held, stale ones included
    pub fn len(&self) -> usize {
        self.shared.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a fresh value, recording a hit or a miss
    pub fn get(&self, content_type: ContentType, content: &str) -> Option<V> {
        let start = std::time::Instant::now();
        let key = cache_key(content_type, content);

        let mut state = self.shared.state.write();
        let value = state
            .lookup(&key, Instant::now())
            .map(|entry| entry.value.clone());
        state.record_access(content_type, value.is_some(), elapsed_ms(start));
        value
    }

    /// Insert or replace a value.
    ///
    /// Inserting a new key into a full cache evicts the oldest-inserted entry.
    pub fn set(&self, content_type: ContentType, content: &str, value: V, size: u64) {
        let key = cache_key(content_type, content);
        let entry = CacheEntry::new(value, content_type, size, self.shared.ttl, 0);

        let (evicted, callback) = {
            let mut state = self.shared.state.write();
            let evicted = if !state.entries.contains_key(&key)
                && state.entries.len() >= self.shared.max_entries
            {
                let excess = state.entries.len() + 1 - self.shared.max_entries;
                state.evict_oldest(excess)
            } else {
                Vec::new()
            };
            state.insert(key, entry);
            (evicted, state.eviction_callback.clone())
        };

        notify_evicted(callback.as_ref(), &evicted);
    }

    /// Look up many items at once, keyed by content in the result
    pub fn batch_get(&self, items: &[BatchGetItem]) -> HashMap<String, BatchResult<V>> {
        let start = std::time::Instant::now();
        let mut results = HashMap::with_capacity(items.len());
        let mut outcomes = Vec::with_capacity(items.len());

        let mut state = self.shared.state.write();
        let now = Instant::now();
        for item in items {
            let key = cache_key(item.content_type, &item.content);
            let result = match state.lookup(&key, now) {
                Some(entry) => BatchResult::hit(entry.value.clone()),
                None => BatchResult::miss(),
            };
            outcomes.push((item.content_type, result.found));
            results.insert(item.content.clone(), result);
        }

        if !items.is_empty() {
            let per_item_ms = elapsed_ms(start) / items.len() as f64;
            for (content_type, hit) in outcomes {
                state.record_access(content_type, hit, per_item_ms);
            }
        }

        results
    }

    /// Insert many items at once.
    ///
    /// The number of entries to evict is computed up front as
    /// `current + incoming - max_entries` and removed oldest first in one
    /// pass. A batch larger than the whole cache keeps only its last
    /// `max_entries` items; the rest are reported as `CapacityExceeded`.
    pub fn batch_set(&self, items: Vec<BatchSetItem<V>>) -> HashMap<String, Error> {
        let max_entries = self.shared.max_entries;
        let mut errors = HashMap::new();

        let overflow = items.len().saturating_sub(max_entries);
        let mut items = items.into_iter();
        for rejected in items.by_ref().take(overflow) {
            errors.insert(rejected.content, Error::CapacityExceeded { max_entries });
        }
        let accepted: Vec<BatchSetItem<V>> = items.collect();

        let (evicted, callback) = {
            let mut state = self.shared.state.write();
            let need_to_evict = (state.entries.len() + accepted.len()).saturating_sub(max_entries);
            let evicted = if need_to_evict > 0 {
                state.evict_oldest(need_to_evict)
            } else {
                Vec::new()
            };

            for item in accepted {
                let key = cache_key(item.content_type, &item.content);
                let entry =
                    CacheEntry::new(item.value, item.content_type, item.size, self.shared.ttl, 0);
                state.insert(key, entry);
            }

            (evicted, state.eviction_callback.clone())
        };

        notify_evicted(callback.as_ref(), &evicted);
        errors
    }

    /// Snapshot of the current statistics
    pub fn get_stats(&self) -> CacheStats {
        self.shared.state.read().snapshot(Instant::now())
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut state = self.shared.state.write();
        state.entries.clear();
        state.order.clear();
        state.counters = AccessCounters::default();
        state.per_type.clear();
    }

    /// Remove stale entries now instead of waiting for the sweep
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    pub fn set_eviction_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &CacheEntry<V>) + Send + Sync + 'static,
    {
        self.shared.state.write().eviction_callback = Some(Arc::new(callback));
    }

    pub fn set_threshold_callback<F>(&self, callback: F)
    where
        F: Fn(&CacheStats) + Send + Sync + 'static,
    {
        self.shared.state.write().threshold_callback = Some(Arc::new(callback));
    }

    /// Thresholds checked after every sweep
    pub fn set_thresholds(&self, thresholds: CacheThresholds) {
        self.shared.state.write().thresholds = Some(thresholds);
    }

    /// Drop the eviction and threshold callbacks along with the thresholds
    pub fn clear_callbacks(&self) {
        let mut state = self.shared.state.write();
        state.eviction_callback = None;
        state.threshold_callback = None;
        state.thresholds = None;
    }

    /// Stop the background sweep. Safe to call more than once.
    pub fn close(&self) {
        self.sweeper.cancel();
    }
}

impl<V> Drop for CacheManager<V> {
    fn drop(&mut self) {
        self.sweeper.cancel();
    }
}

async fn sweep_loop<V>(shared: Weak<Shared<V>>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.purge_expired();
            }
        }
    }

    debug!("Cache sweep task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_callback<V: Send + Sync + 'static>(
        cache: &CacheManager<V>,
    ) -> Arc<Mutex<Vec<String>>>
    where
        V: Clone,
    {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        cache.set_eviction_callback(move |key, _entry| sink.lock().push(key.to_string()));
        evicted
    }

    #[tokio::test]
    async fn test_get_and_set() {
        let cache = CacheManager::new(10, Duration::from_secs(60));

        assert_eq!(cache.get(ContentType::Text, "hello"), None);
        cache.set(ContentType::Text, "hello", "clean".to_string(), 64);
        assert_eq!(cache.get(ContentType::Text, "hello"), Some("clean".to_string()));
        assert_eq!(cache.get(ContentType::Image, "hello"), None);

        let stats = cache.get_stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.memory_usage, 64);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.type_stats[&ContentType::Text].count, 1);
        assert_eq!(stats.type_stats[&ContentType::Image].count, 0);
        assert_eq!(stats.type_stats[&ContentType::Image].hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_fifo_eviction_scenario() {
        let cache = CacheManager::new(3, Duration::from_secs(3600));
        let evicted = recording_callback(&cache);

        for i in 1..=5 {
            cache.set(ContentType::Text, &format!("k{}", i), i, 10);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(
            *evicted.lock(),
            vec![
                cache_key(ContentType::Text, "k1"),
                cache_key(ContentType::Text, "k2"),
            ]
        );
        for i in 3..=5 {
            assert_eq!(cache.get(ContentType::Text, &format!("k{}", i)), Some(i));
        }
        assert_eq!(cache.get(ContentType::Text, "k1"), None);
    }

    #[tokio::test]
    async fn test_eviction_ignores_access_recency() {
        let cache = CacheManager::new(2, Duration::from_secs(3600));
        cache.set(ContentType::Text, "a", 1, 1);
        cache.set(ContentType::Text, "b", 2, 1);

        // Reading "a" does not protect it under FIFO
        assert_eq!(cache.get(ContentType::Text, "a"), Some(1));
        cache.set(ContentType::Text, "c", 3, 1);

        assert_eq!(cache.get(ContentType::Text, "a"), None);
        assert_eq!(cache.get(ContentType::Text, "b"), Some(2));
    }

    #[tokio::test]
    async fn test_replacing_key_does_not_evict() {
        let cache = CacheManager::new(2, Duration::from_secs(3600));
        let evicted = recording_callback(&cache);

        cache.set(ContentType::Text, "a", 1, 1);
        cache.set(ContentType::Text, "b", 2, 1);
        cache.set(ContentType::Text, "a", 10, 1);

        assert!(evicted.lock().is_empty());
        assert_eq!(cache.get(ContentType::Text, "a"), Some(10));

        // "a" was re-inserted, so "b" is now the oldest
        cache.set(ContentType::Text, "c", 3, 1);
        assert_eq!(cache.get(ContentType::Text, "b"), None);
        assert_eq!(cache.get(ContentType::Text, "a"), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_a_miss_before_sweep() {
        // Long TTL relative to the check, so the sweep has not run yet
        let cache = CacheManager::new(10, Duration::from_secs(100));
        cache.set(ContentType::Image, "https://x/y.png", 7, 1);

        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(cache.get(ContentType::Image, "https://x/y.png"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(ContentType::Image, "https://x/y.png"), None);

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_removes_expired() {
        let cache = CacheManager::<u32>::new(10, Duration::from_millis(200));
        let evicted = recording_callback(&cache);
        cache.set(ContentType::Text, "short-lived", 1, 1);

        // Sweeps run at 100ms intervals; the entry is stale after 200ms
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(cache.len(), 0);
        assert_eq!(evicted.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_sweep() {
        let cache = CacheManager::new(10, Duration::from_millis(200));
        cache.close();
        cache.close();
        cache.set(ContentType::Text, "kept", 1, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;

        // Not swept, but also never served
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(ContentType::Text, "kept"), None);
        assert_eq!(cache.get_stats().expired_entries, 1);
        assert_eq!(cache.purge_expired(), 1);
    }

    #[tokio::test]
    async fn test_batch_get() {
        let cache = CacheManager::new(10, Duration::from_secs(3600));
        cache.batch_set(vec![
            BatchSetItem::new(ContentType::Text, "key1", "value1", 100),
            BatchSetItem::new(ContentType::Image, "key2", "value2", 200),
            BatchSetItem::new(ContentType::Audio, "key3", "value3", 300),
            BatchSetItem::new(ContentType::Video, "key4", "value4", 400),
        ]);

        let results = cache.batch_get(&[
            BatchGetItem::new(ContentType::Text, "key1"),
            BatchGetItem::new(ContentType::Image, "key2"),
            BatchGetItem::new(ContentType::Audio, "key3"),
            BatchGetItem::new(ContentType::Video, "key4"),
            BatchGetItem::new(ContentType::Text, "nonexistent"),
        ]);

        assert_eq!(results.len(), 5);
        assert_eq!(results["key3"], BatchResult::hit("value3"));
        assert!(!results["nonexistent"].found);
        assert!(results["nonexistent"].value.is_none());

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_usage, 1000);
    }

    #[tokio::test]
    async fn test_batch_set_with_eviction() {
        let cache = CacheManager::new(3, Duration::from_secs(3600));
        let evicted = recording_callback(&cache);

        cache.batch_set(vec![
            BatchSetItem::new(ContentType::Text, "key1", 1, 100),
            BatchSetItem::new(ContentType::Image, "key2", 2, 200),
            BatchSetItem::new(ContentType::Audio, "key3", 3, 300),
        ]);
        assert_eq!(cache.len(), 3);

        let errors = cache.batch_set(vec![
            BatchSetItem::new(ContentType::Video, "key4", 4, 400),
            BatchSetItem::new(ContentType::Text, "key5", 5, 500),
        ]);
        assert!(errors.is_empty());
        assert_eq!(evicted.lock().len(), 2);
        assert_eq!(cache.len(), 3);

        let results = cache.batch_get(&[
            BatchGetItem::new(ContentType::Text, "key1"),
            BatchGetItem::new(ContentType::Image, "key2"),
            BatchGetItem::new(ContentType::Audio, "key3"),
            BatchGetItem::new(ContentType::Video, "key4"),
        ]);
        assert!(!results["key1"].found);
        assert!(!results["key2"].found);
        assert!(results["key3"].found);
        assert!(results["key4"].found);
    }

    #[tokio::test]
    async fn test_batch_larger_than_capacity() {
        let cache = CacheManager::new(2, Duration::from_secs(3600));
        let errors = cache.batch_set(vec![
            BatchSetItem::new(ContentType::Text, "a", 1, 1),
            BatchSetItem::new(ContentType::Text, "b", 2, 1),
            BatchSetItem::new(ContentType::Text, "c", 3, 1),
        ]);

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors["a"],
            Error::CapacityExceeded { max_entries: 2 }
        ));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(ContentType::Text, "c"), Some(3));
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let cache = CacheManager::new(4, Duration::from_secs(3600));
        cache.set(ContentType::Text, "a", 1, 1);
        cache.get(ContentType::Text, "a");
        cache.get(ContentType::Text, "b");

        cache.clear();

        let stats = cache.get_stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.accesses(), 0);
        assert!(stats.type_stats.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_callback_after_sweep() {
        let cache = CacheManager::<u32>::new(10, Duration::from_millis(200));
        cache.set_thresholds(CacheThresholds {
            hit_rate_min: 0.9,
            ..Default::default()
        });
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        cache.set_threshold_callback(move |stats| sink.lock().push(stats.hit_rate));

        cache.get(ContentType::Text, "missing");
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(*fired.lock(), vec![0.0]);
    }

    #[tokio::test]
    async fn test_clear_callbacks() {
        let cache = CacheManager::new(1, Duration::from_secs(60));
        let evicted = recording_callback(&cache);

        cache.set(ContentType::Text, "k1", 1u32, 8);
        cache.set(ContentType::Text, "k2", 2, 8);
        cache.clear_callbacks();
        cache.set(ContentType::Text, "k3", 3, 8);

        assert_eq!(evicted.lock().len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(CacheManager::new(64, Duration::from_secs(3600)));
        let mut handles = Vec::new();

        for worker in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let content = format!("w{}-{}", worker, i % 16);
                    if cache.get(ContentType::Text, &content).is_none() {
                        cache.set(ContentType::Text, &content, i, 8);
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.get_stats();
        assert!(stats.size <= 64);
        assert_eq!(stats.accesses(), 800);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
        }

        proptest! {
            #[test]
            fn sequential_inserts_keep_newest(n in 1usize..20, k in 0usize..20) {
                let rt = runtime();
                let _guard = rt.enter();
                let cache = CacheManager::new(n, Duration::from_secs(3600));
                let evicted = recording_callback(&cache);

                for i in 0..n + k {
                    cache.set(ContentType::Text, &format!("item-{}", i), i, 1);
                }

                prop_assert_eq!(cache.len(), n);
                let expected: Vec<String> = (0..k)
                    .map(|i| cache_key(ContentType::Text, &format!("item-{}", i)))
                    .collect();
                prop_assert_eq!(evicted.lock().clone(), expected);
                for i in k..n + k {
                    prop_assert_eq!(cache.get(ContentType::Text, &format!("item-{}", i)), Some(i));
                }
            }

            #[test]
            fn batch_set_evicts_exact_excess(max in 1usize..16, current in 0usize..16, incoming in 0usize..16) {
                prop_assume!(current <= max && incoming <= max);
                let rt = runtime();
                let _guard = rt.enter();
                let cache = CacheManager::new(max, Duration::from_secs(3600));

                for i in 0..current {
                    cache.set(ContentType::Text, &format!("old-{}", i), i, 1);
                }
                let evicted = recording_callback(&cache);

                let items = (0..incoming)
                    .map(|i| BatchSetItem::new(ContentType::Image, format!("new-{}", i), i, 1))
                    .collect();
                let errors = cache.batch_set(items);

                prop_assert!(errors.is_empty());
                prop_assert_eq!(evicted.lock().len(), (current + incoming).saturating_sub(max));
                prop_assert!(cache.len() <= max);
            }
        }
    }
}
