//! Time-boxed cache of result sets keyed by rounded bounding box.
//!
//! Staleness is checked only on read: a stale entry is not removed, it is
//! simply not served and gets overwritten by the next successful fetch.
//! Size is bounded separately by least-recently-used eviction.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use mmdir_core::PlaceRecord;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    records: Vec<PlaceRecord>,
}

#[derive(Debug)]
pub struct ViewportCache {
    entries: LruCache<String, CacheEntry>,
    ttl: Duration,
}

impl ViewportCache {
    /// A zero `capacity` is treated as one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Records stored under `key` less than one TTL before `now`.
    pub fn get_fresh(&mut self, key: &str, now: Instant) -> Option<Vec<PlaceRecord>> {
        let ttl = self.ttl;
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < ttl)
            .map(|entry| entry.records.clone())
    }

    /// Stores `records` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: String, records: Vec<PlaceRecord>, now: Instant) {
        self.entries.put(
            key,
            CacheEntry {
                stored_at: now,
                records,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    const TTL: Duration = Duration::from_secs(180);

    fn records(id: &str) -> Vec<PlaceRecord> {
        vec![PlaceRecord {
            id: id.to_owned(),
            name: "Shwe Kyin".to_owned(),
            name_local: String::new(),
            name_latin: String::new(),
            address: String::new(),
            city: String::new(),
            region: String::new(),
            phone: String::new(),
            website: String::new(),
            lat: Some(21.97),
            lon: Some(96.08),
            raw: BTreeMap::new(),
        }]
    }

    #[test]
    fn entry_is_served_until_ttl_elapses() {
        let mut cache = ViewportCache::new(8, TTL);
        let t = Instant::now();
        cache.insert("16.80,96.10,16.86,96.20".to_owned(), records("node/1"), t);

        let key = "16.80,96.10,16.86,96.20";
        assert!(cache.get_fresh(key, t + Duration::from_secs(179)).is_some());
        assert!(cache.get_fresh(key, t + Duration::from_secs(180)).is_none());
        assert!(cache.get_fresh(key, t + Duration::from_secs(181)).is_none());
    }

    #[test]
    fn stale_entry_is_kept_and_overwritten() {
        let mut cache = ViewportCache::new(8, TTL);
        let t = Instant::now();
        cache.insert("k".to_owned(), records("node/1"), t);
        assert!(cache.get_fresh("k", t + Duration::from_secs(200)).is_none());
        assert_eq!(cache.len(), 1);

        let later = t + Duration::from_secs(200);
        cache.insert("k".to_owned(), records("node/2"), later);
        let fresh = cache.get_fresh("k", later + Duration::from_secs(1)).unwrap();
        assert_eq!(fresh[0].id, "node/2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unknown_key_misses() {
        let mut cache = ViewportCache::new(8, TTL);
        assert!(cache.get_fresh("nope", Instant::now()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut cache = ViewportCache::new(2, TTL);
        let t = Instant::now();
        cache.insert("a".to_owned(), records("node/1"), t);
        cache.insert("b".to_owned(), records("node/2"), t);
        assert!(cache.get_fresh("a", t).is_some());
        cache.insert("c".to_owned(), records("node/3"), t);

        assert_eq!(cache.len(), 2);
        assert!(cache.get_fresh("a", t).is_some());
        assert!(cache.get_fresh("b", t).is_none());
        assert!(cache.get_fresh("c", t).is_some());
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = ViewportCache::new(0, TTL);
        let t = Instant::now();
        cache.insert("a".to_owned(), records("node/1"), t);
        assert!(cache.get_fresh("a", t).is_some());
    }
}
