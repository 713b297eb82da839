//! Small TTL cache for master data.
//!
//! The clock is injected so expiry can be tested without sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        *now = now.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Key/value cache whose entries expire a fixed time after being set.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value, if present and not expired. Expired entries are dropped.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!("cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Store a value; it expires `ttl` from now.
    pub fn set(&self, key: K, value: V) {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries().insert(key, Entry { value, expires_at });
    }

    /// Drop an entry now.
    pub fn expire(&self, key: &K) {
        self.entries().remove(key);
    }

    /// Cached value, or the result of `load` which is then cached.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load()?;
        self.set(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cache(ttl_secs: u64) -> (Arc<ManualClock>, TtlCache<&'static str, u32>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_get_before_and_after_expiry() {
        let (clock, cache) = cache(600);
        cache.set("note_types", 3);

        clock.advance(Duration::from_secs(599));
        assert_eq!(cache.get(&"note_types"), Some(3));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"note_types"), None);
    }

    #[test]
    fn test_expire_drops_entry() {
        let (_clock, cache) = cache(600);
        cache.set("a", 1);
        cache.expire(&"a");
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_set_refreshes_expiry() {
        let (clock, cache) = cache(10);
        cache.set("a", 1);
        clock.advance(Duration::from_secs(8));
        cache.set("a", 2);
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get(&"a"), Some(2));
    }

    #[test]
    fn test_get_or_try_insert_with_loads_once() {
        let (clock, cache) = cache(60);
        let mut loads = 0;

        for _ in 0..3 {
            let v: Result<u32, ()> = cache.get_or_try_insert_with("k", || {
                loads += 1;
                Ok(7)
            });
            assert_eq!(v, Ok(7));
        }
        assert_eq!(loads, 1);

        clock.advance(Duration::from_secs(61));
        let _ = cache.get_or_try_insert_with("k", || -> Result<u32, ()> {
            loads += 1;
            Ok(8)
        });
        assert_eq!(loads, 2);
        assert_eq!(cache.get(&"k"), Some(8));
    }

    #[test]
    fn test_loader_error_is_not_cached() {
        let (_clock, cache) = cache(60);
        let err: Result<u32, &str> = cache.get_or_try_insert_with("k", || Err("disk"));
        assert_eq!(err, Err("disk"));
        assert_eq!(cache.get(&"k"), None);
    }
}
