use crate::models::{DataPoint, ValuationSeries};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Exact input tuple a fetch result is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The fetch results cached per request key: the price history and the
/// resolved valuation series. Entries are immutable once written.
#[derive(Debug, Clone)]
pub struct CachedFetch {
    pub prices: Vec<DataPoint>,
    pub valuation: ValuationSeries,
}

struct CacheEntry {
    stored_at: Instant,
    payload: CachedFetch,
}

/// Read-through cache with a fixed expiry. Concurrent requests for the
/// same key may each recompute; the last write wins and entries are
/// replaced wholesale.
pub struct RequestCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl RequestCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached payload, or None if absent or expired.
    /// Expired entries are evicted on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<CachedFetch> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: CacheKey, payload: CachedFetch) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                payload,
            },
        );
    }

    /// True when the key is absent or its entry has outlived the TTL.
    pub fn is_expired(&self, key: &CacheKey) -> bool {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => true,
        }
    }
}

static SHARED: Lazy<RequestCache> = Lazy::new(|| RequestCache::new(Duration::from_secs(3600)));

/// Process-wide cache instance (one-hour TTL), created at first use and
/// cleared on restart. Callers wanting a different TTL own their own
/// `RequestCache`.
pub fn shared() -> &'static RequestCache {
    &SHARED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValuationSeries;

    fn key() -> CacheKey {
        CacheKey {
            ticker: "AAPL".to_string(),
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        }
    }

    fn payload() -> CachedFetch {
        CachedFetch {
            prices: Vec::new(),
            valuation: ValuationSeries::unavailable(),
        }
    }

    #[test]
    fn test_put_then_get_within_ttl() {
        let cache = RequestCache::new(Duration::from_secs(60));
        assert!(cache.is_expired(&key()));

        cache.put(key(), payload());
        assert!(!cache.is_expired(&key()));
        assert!(cache.get(&key()).is_some());
    }

    #[test]
    fn test_expired_entry_treated_as_absent() {
        let cache = RequestCache::new(Duration::ZERO);
        cache.put(key(), payload());

        assert!(cache.is_expired(&key()));
        assert!(cache.get(&key()).is_none());
        // get() evicted it
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_keys_are_exact_tuples() {
        let cache = RequestCache::new(Duration::from_secs(60));
        cache.put(key(), payload());

        let other = CacheKey {
            ticker: "MSFT".to_string(),
            ..key()
        };
        assert!(cache.get(&other).is_none());
    }
}
