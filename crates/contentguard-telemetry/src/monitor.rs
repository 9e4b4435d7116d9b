//! Cache health monitor
//!
//! Samples a [`CacheManager`] on a fixed interval, writes each snapshot as a
//! JSON line, and raises an alert for every violated [`CacheThresholds`]
//! entry. Evictions and sweep-time threshold notifications from the manager
//! are written to the same sink.
//!
//! Lifecycle is `Idle -> Running -> Stopped`; a stopped monitor cannot be
//! restarted.

use contentguard_cache::{CacheEntry, CacheManager, CacheStats, CacheThresholds};
use contentguard_core::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives every alert raised by the sampling loop
pub type AlertCallback = Arc<dyn Fn(&str) + Send + Sync>;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Monitor configuration
#[derive(Clone)]
pub struct MonitorConfig {
    /// Sampling period
    pub interval: Duration,

    /// Append-only log file; `None` logs through `tracing` only
    pub log_path: Option<PathBuf>,

    pub thresholds: CacheThresholds,

    pub alert_callback: Option<AlertCallback>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            log_path: None,
            thresholds: CacheThresholds::default(),
            alert_callback: None,
        }
    }
}

impl fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("interval", &self.interval)
            .field("log_path", &self.log_path)
            .field("thresholds", &self.thresholds)
            .field("alert_callback", &self.alert_callback.is_some())
            .finish()
    }
}

impl MonitorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_thresholds(mut self, thresholds: CacheThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn on_alert<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.alert_callback = Some(Arc::new(callback));
        self
    }
}

/// Line-oriented sink mirrored to `tracing`
struct LogSink {
    file: Option<Mutex<BufWriter<File>>>,
}

impl LogSink {
    fn open(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Mutex::new(BufWriter::new(file)))
            }
            None => None,
        };
        Ok(Self { file })
    }

    fn info(&self, line: &str) {
        info!(target: "contentguard::monitor", "{}", line);
        self.write(line);
    }

    fn warn(&self, line: &str) {
        warn!(target: "contentguard::monitor", "{}", line);
        self.write(line);
    }

    fn write(&self, line: &str) {
        let Some(file) = &self.file else { return };
        let mut writer = file.lock();
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(error = %e, "Failed to write cache monitor log");
        }
    }
}

enum MonitorState {
    Idle,
    Running(CancellationToken),
    Stopped,
}

/// Periodic sampler for one cache
pub struct CacheMonitor<V> {
    cache: Arc<CacheManager<V>>,
    config: MonitorConfig,
    sink: Arc<LogSink>,
    state: Mutex<MonitorState>,
}

impl<V> CacheMonitor<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a monitor, opening the log file if one is configured
    pub fn new(cache: Arc<CacheManager<V>>, config: MonitorConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(Error::config("monitor interval must be greater than zero"));
        }
        let sink = Arc::new(LogSink::open(config.log_path.as_deref())?);

        Ok(Self {
            cache,
            config,
            sink,
            state: Mutex::new(MonitorState::Idle),
        })
    }

    /// Register with the cache and start the sampling task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            MonitorState::Idle => {}
            MonitorState::Running(_) => return Err(Error::internal("cache monitor already running")),
            MonitorState::Stopped => return Err(Error::internal("cache monitor has been stopped")),
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::internal("cache monitor requires a tokio runtime"))?;

        let sink = self.sink.clone();
        self.cache
            .set_eviction_callback(move |key: &str, entry: &CacheEntry<V>| {
                sink.info(&format!(
                    "Cache entry evicted: key={}, age={:.2}s, accesses={}, size={} bytes",
                    key,
                    entry.age().as_secs_f64(),
                    entry.access_count,
                    entry.size
                ));
            });

        let sink = self.sink.clone();
        let thresholds = self.config.thresholds.clone();
        self.cache.set_thresholds(thresholds.clone());
        self.cache.set_threshold_callback(move |stats: &CacheStats| {
            for violation in thresholds.violations(stats) {
                sink.warn(&format!("Cache threshold alert: {}", violation));
            }
        });

        let token = CancellationToken::new();
        handle.spawn(sample_loop(
            self.cache.clone(),
            self.sink.clone(),
            self.config.clone(),
            token.clone(),
        ));

        info!(interval_ms = self.config.interval.as_millis() as u64, "Cache monitor started");
        *state = MonitorState::Running(token);
        Ok(())
    }

    /// Stop sampling and detach from the cache. Calling this more than once,
    /// or before `start`, is a no-op apart from moving the monitor to its
    /// terminal state.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let MonitorState::Running(token) = &*state {
            token.cancel();
            self.cache.clear_callbacks();
            info!("Cache monitor stopped");
        }
        *state = MonitorState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), MonitorState::Running(_))
    }

    /// Take and record one sample immediately
    pub fn sample_now(&self) -> CacheStats {
        sample(&self.cache, &self.sink, &self.config)
    }
}

impl<V> Drop for CacheMonitor<V> {
    fn drop(&mut self) {
        if let MonitorState::Running(token) = &*self.state.lock() {
            token.cancel();
        }
    }
}

async fn sample_loop<V>(
    cache: Arc<CacheManager<V>>,
    sink: Arc<LogSink>,
    config: MonitorConfig,
    token: CancellationToken,
) where
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                sample(&cache, &sink, &config);
            }
        }
    }

    debug!("Cache monitor task exited");
}

fn sample<V>(cache: &CacheManager<V>, sink: &LogSink, config: &MonitorConfig) -> CacheStats
where
    V: Clone + Send + Sync + 'static,
{
    let stats = cache.get_stats();

    match serde_json::to_string(&stats) {
        Ok(line) => sink.info(&line),
        Err(e) => warn!(error = %e, "Failed to serialize cache stats"),
    }

    for alert in config.thresholds.violations(&stats) {
        sink.warn(&format!("ALERT: {}", alert));
        if let Some(callback) = &config.alert_callback {
            callback(&alert);
        }
    }

    stats
}
