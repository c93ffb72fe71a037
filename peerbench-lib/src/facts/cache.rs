//! An in-memory cache with per-entry expiry and a periodic sweep.
//!
//! [`ExpiringCache`] checks expiry lazily on every read and, once
//! [`started`](ExpiringCache::start), also walks all entries on a fixed interval
//! so that keys written once and never read again do not accumulate.

use core::fmt::{Debug, Formatter};
use core::hash::Hash;
use core::time::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const LOG_TARGET: &str = "     cache";

/// Upper bound used when `now + ttl` overflows the clock.
const FAR_FUTURE: Duration = Duration::from_hours(24 * 365 * 30);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    created_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

type Entries<K, V> = Mutex<HashMap<K, CacheEntry<V>>>;

/// Snapshot of a cache's size, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatus {
    /// Number of stored entries, including expired ones not yet swept.
    pub entries: usize,

    /// Age of the oldest stored entry.
    pub oldest_entry_age: Option<Duration>,
}

/// A key/value store whose entries expire after a per-entry TTL.
///
/// All operations are short critical sections; the lock is never held across
/// an `.await`. A hit observed by one call may have expired by the next, so
/// callers treat every miss as a reason to re-fetch.
pub struct ExpiringCache<K, V> {
    name: &'static str,
    entries: Arc<Entries<K, V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> Debug for ExpiringCache<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("name", &self.name)
            .field("entries", &lock(&self.entries).len())
            .field("sweeping", &self.is_running())
            .finish()
    }
}

impl<K, V> ExpiringCache<K, V> {
    /// Create an empty cache. The name only appears in log output.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(Mutex::new(HashMap::new())),
            sweeper: Mutex::new(None),
        }
    }

    /// Returns the number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Age of the oldest stored entry, or `None` when the cache is empty.
    #[must_use]
    pub fn oldest_entry_age(&self) -> Option<Duration> {
        let now = Instant::now();
        lock(&self.entries)
            .values()
            .map(|entry| now.saturating_duration_since(entry.created_at))
            .max()
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            entries: self.len(),
            oldest_entry_age: self.oldest_entry_age(),
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Remove every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        sweep_entries(self.name, &self.entries)
    }

    /// Returns whether the periodic sweep task is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.sweeper).as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the periodic sweep task, if running.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.sweeper).take() {
            task.abort();
            log::debug!(target: LOG_TARGET, "Stopped sweeping '{}'", self.name);
        }
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Store `value` under `key` until `now + ttl`, replacing any previous entry.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE);
        let _ = lock(&self.entries).insert(
            key,
            CacheEntry {
                payload: value,
                created_at: now,
                expires_at,
            },
        );
    }

    /// Returns the value for `key` if it has not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = lock(&self.entries);

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.payload.clone()),
            Some(_) => {
                let _ = entries.remove(key);
                log::debug!(target: LOG_TARGET, "Expired entry evicted from '{}' on read", self.name);
                None
            }
            None => None,
        }
    }

    /// Remove the entry for `key`. Returns `true` if one was present.
    pub fn invalidate(&self, key: &K) -> bool {
        lock(&self.entries).remove(key).is_some()
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Start sweeping expired entries every `interval`.
    ///
    /// Calling this while a sweep task is already running does nothing. Requires a tokio runtime.
    pub fn start(&self, interval: Duration) {
        if interval.is_zero() {
            log::warn!(target: LOG_TARGET, "Refusing to sweep '{}' with a zero interval", self.name);
            return;
        }

        let mut sweeper = lock(&self.sweeper);
        if sweeper.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let name = self.name;
        let entries = Arc::clone(&self.entries);

        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // the first tick completes immediately
            let _ = ticker.tick().await;

            #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
            loop {
                let _ = ticker.tick().await;
                let _ = sweep_entries(name, &entries);
            }
        }));

        log::debug!(target: LOG_TARGET, "Sweeping '{name}' every {}ms", interval.as_millis());
    }
}

impl<K, V> Drop for ExpiringCache<K, V> {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.sweeper).take() {
            task.abort();
        }
    }
}

fn sweep_entries<K, V>(name: &str, entries: &Entries<K, V>) -> usize {
    let now = Instant::now();
    let mut entries = lock(entries);
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    let removed = before - entries.len();

    if removed > 0 {
        log::debug!(target: LOG_TARGET, "Swept {removed} expired entries from '{name}'");
    }

    removed
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
