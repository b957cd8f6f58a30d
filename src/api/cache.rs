//! Small TTL cache for near-static metadata lookups.
//!
//! Problem metadata barely changes, so adapters cache it for about a day
//! keyed by identifier. Verification results are time-sensitive and
//! user-specific and must never go through here.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, evicting it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, (value, Instant::now()));
    }

    /// Drop every expired entry. Adapters call this opportunistically; there
    /// is no background sweeper.
    pub fn evict_expired(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_values() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("two-sum", 1);
        assert_eq!(cache.get(&"two-sum"), Some(1));
        assert_eq!(cache.get(&"three-sum"), None);
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = TtlCache::new(Duration::from_millis(0));
        cache.insert("two-sum", 1);
        assert_eq!(cache.get(&"two-sum"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn evict_expired_sweeps_dead_entries() {
        let cache = TtlCache::new(Duration::from_millis(0));
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.len(), 2);
        cache.evict_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_refreshes_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
