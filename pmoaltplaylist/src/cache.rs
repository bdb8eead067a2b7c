//! Validated-ID cache
//!
//! Remembers which recommendation-engine ID a source track resolved to, so
//! the fuzzy search runs once per track rather than once per build. Entries
//! are keyed by source track URI and stamped with their last use; when the
//! cache grows past its bound the least recently used entry is evicted.
//!
//! The whole map is persisted after every mutation as a flat JSON object:
//!
//! ```text
//! {"spotify:track:111": {"id": "rec-111", "timestamp": 1718000000000}, ...}
//! ```

use crate::store::KeyValueStore;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Store key under which the cache is persisted
pub const VALIDATED_IDS_KEY: &str = "validated-ids";

/// Default bound on the number of cached resolutions
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Cache handle shared between the resolver and its owner
pub type SharedIdCache = Arc<Mutex<ValidatedIdCache>>;

/// A resolved recommendation-engine ID and when it was last used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedIdEntry {
    /// Recommendation-engine track ID
    pub id: String,
    /// Last use, Unix milliseconds
    pub timestamp: i64,
}

/// Bounded, timestamp-ordered map from source track URI to recommendation-engine ID
pub struct ValidatedIdCache {
    entries: HashMap<String, (ValidatedIdEntry, u64)>,
    /// (timestamp, insertion sequence) → key; first item is the eviction candidate
    by_age: BTreeMap<(i64, u64), String>,
    next_seq: u64,
    max_entries: usize,
    store: Arc<dyn KeyValueStore>,
}

impl ValidatedIdCache {
    /// Opens the cache persisted in `store`
    ///
    /// A missing or unreadable document yields an empty cache.
    pub fn open(store: Arc<dyn KeyValueStore>, max_entries: usize) -> Self {
        let mut cache = Self {
            entries: HashMap::new(),
            by_age: BTreeMap::new(),
            next_seq: 0,
            max_entries: max_entries.max(1),
            store,
        };

        let persisted = match cache.store.read(VALIDATED_IDS_KEY) {
            Ok(Some(json)) => {
                match serde_json::from_str::<HashMap<String, ValidatedIdEntry>>(&json) {
                    Ok(map) => map,
                    Err(e) => {
                        warn!("Validated-ID cache is corrupt, starting empty: {}", e);
                        HashMap::new()
                    }
                }
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Cannot read validated-ID cache, starting empty: {}", e);
                HashMap::new()
            }
        };

        let mut loaded: Vec<_> = persisted.into_iter().collect();
        loaded.sort_by_key(|(_, entry)| entry.timestamp);
        for (key, entry) in loaded {
            cache.insert(key, entry);
        }
        while cache.entries.len() > cache.max_entries {
            cache.evict_oldest();
        }

        info!(
            entries = cache.entries.len(),
            max_entries = cache.max_entries,
            "Validated-ID cache loaded"
        );
        cache
    }

    /// Wraps the cache for sharing across tasks
    pub fn shared(self) -> SharedIdCache {
        Arc::new(Mutex::new(self))
    }

    /// Entry for `source_key`, without touching its timestamp
    pub fn get(&self, source_key: &str) -> Option<&ValidatedIdEntry> {
        self.entries.get(source_key).map(|(entry, _)| entry)
    }

    /// Inserts or refreshes `source_key → id` stamped with the current time, then persists
    pub fn put(&mut self, source_key: &str, id: &str) {
        self.put_at(source_key, id, Utc::now().timestamp_millis());
    }

    pub(crate) fn put_at(&mut self, source_key: &str, id: &str, timestamp: i64) {
        self.insert(
            source_key.to_string(),
            ValidatedIdEntry {
                id: id.to_string(),
                timestamp,
            },
        );

        if self.entries.len() > self.max_entries {
            self.evict_oldest();
        }

        self.persist();
    }

    fn insert(&mut self, key: String, entry: ValidatedIdEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.by_age.insert((entry.timestamp, seq), key.clone());
        if let Some((previous, previous_seq)) = self.entries.insert(key, (entry, seq)) {
            self.by_age.remove(&(previous.timestamp, previous_seq));
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.by_age.pop_first() {
            debug!("Evicting validated ID for {}", key);
            self.entries.remove(&key);
        }
    }

    fn persist(&self) {
        let snapshot: BTreeMap<&str, &ValidatedIdEntry> = self
            .entries
            .iter()
            .map(|(key, (entry, _))| (key.as_str(), entry))
            .collect();

        let result = serde_json::to_string(&snapshot)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.write(VALIDATED_IDS_KEY, &json));

        if let Err(e) = result {
            warn!("Failed to persist validated-ID cache: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Drops every entry and persists the empty map
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_age.clear();
        self.persist();
    }

    /// Entry count and age range
    pub fn stats(&self) -> CacheStats {
        let stamp = |ts: i64| Utc.timestamp_millis_opt(ts).single();
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            oldest: self
                .by_age
                .first_key_value()
                .and_then(|((ts, _), _)| stamp(*ts)),
            newest: self
                .by_age
                .last_key_value()
                .and_then(|((ts, _), _)| stamp(*ts)),
        }
    }
}

/// Statistiques du cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn empty(max: usize) -> (ValidatedIdCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ValidatedIdCache::open(store.clone(), max), store)
    }

    #[test]
    fn test_put_then_get_overwrites() {
        let (mut cache, _) = empty(10);

        cache.put("platform:track:1", "rec-a");
        cache.put("platform:track:1", "rec-b");

        assert_eq!(cache.get("platform:track:1").unwrap().id, "rec-b");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_never_exceeds_bound_and_keeps_latest() {
        let (mut cache, _) = empty(3);

        for i in 0..20 {
            let key = format!("k{}", i % 7);
            cache.put(&key, &format!("v{}", i));
            assert!(cache.len() <= 3);
            assert_eq!(cache.get(&key).unwrap().id, format!("v{}", i));
        }
    }

    #[test]
    fn test_evicts_globally_oldest_timestamp() {
        let (mut cache, _) = empty(3);

        cache.put_at("b", "2", 200);
        cache.put_at("a", "1", 100);
        cache.put_at("c", "3", 300);
        cache.put_at("d", "4", 400);

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_refreshed_entry_survives_eviction() {
        let (mut cache, _) = empty(2);

        cache.put_at("a", "1", 100);
        cache.put_at("b", "2", 200);
        // "a" is used again and becomes the newest
        cache.put_at("a", "1", 300);
        cache.put_at("c", "3", 400);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_ties_evict_first_inserted() {
        let (mut cache, _) = empty(2);

        cache.put_at("first", "1", 100);
        cache.put_at("second", "2", 100);
        cache.put_at("third", "3", 100);

        assert!(cache.get("first").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_persisted_after_every_put_and_reloaded() {
        let (mut cache, store) = empty(10);
        cache.put_at("platform:track:111", "rec-111", 1_000);

        let json = store.read(VALIDATED_IDS_KEY).unwrap().unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["platform:track:111"]["id"], "rec-111");
        assert_eq!(raw["platform:track:111"]["timestamp"], 1_000);

        let reopened = ValidatedIdCache::open(store, 10);
        assert_eq!(
            reopened.get("platform:track:111"),
            Some(&ValidatedIdEntry {
                id: "rec-111".to_string(),
                timestamp: 1_000
            })
        );
    }

    #[test]
    fn test_corrupt_store_is_empty() {
        let store = Arc::new(MemoryStore::new());
        store.write(VALIDATED_IDS_KEY, "{not json").unwrap();

        let cache = ValidatedIdCache::open(store, 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reload_with_smaller_bound_drops_oldest() {
        let (mut cache, store) = empty(10);
        cache.put_at("a", "1", 100);
        cache.put_at("b", "2", 200);
        cache.put_at("c", "3", 300);

        let reopened = ValidatedIdCache::open(store, 2);
        assert_eq!(reopened.len(), 2);
        assert!(reopened.get("a").is_none());
    }

    #[test]
    fn test_stats_and_clear() {
        let (mut cache, store) = empty(10);
        cache.put_at("a", "1", 1_000);
        cache.put_at("b", "2", 5_000);

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.oldest.unwrap().timestamp_millis(), 1_000);
        assert_eq!(stats.newest.unwrap().timestamp_millis(), 5_000);

        cache.clear();
        assert!(cache.is_empty());
        assert!(ValidatedIdCache::open(store, 10).is_empty());
    }
}
