// TTL cache for remote catalog responses (hotel list, hotel detail, room lists).
// Keys look like `hotels`, `hotel:<id>` or `rooms:<id>`.

use std::{
    collections::{BTreeMap, HashSet},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::RwLock;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub invalidated_count: usize,
}

pub const HOTELS_KEY: &str = "hotels";

pub fn hotel_key(hotel_id: &str) -> String {
    format!("hotel:{hotel_id}")
}

pub fn rooms_key(hotel_id: &str) -> String {
    format!("rooms:{hotel_id}")
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct CatalogCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    stats: RwLock<CacheStats>,
    // expiry instant -> keys, oldest first
    expiry_index: RwLock<BTreeMap<Instant, HashSet<String>>>,
}

impl<V: Clone> CatalogCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            default_ttl,
            stats: RwLock::new(CacheStats::default()),
            expiry_index: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn store(&self, key: &str, value: V, ttl: Option<Duration>) {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);

        let previous = self.store.insert(
            key.to_string(),
            CacheEntry { value, expires_at },
        );

        let mut index = self.expiry_index.write();
        if let Some(previous) = previous {
            Self::unindex(&mut index, previous.expires_at, key);
        } else {
            self.stats.write().items_count += 1;
        }
        index
            .entry(expires_at)
            .or_default()
            .insert(key.to_string());
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.cleanup_expired();

        let hit = self.store.get(key).map(|entry| entry.value.clone());

        let mut stats = self.stats.write();
        if hit.is_some() {
            stats.hit_count += 1;
        } else {
            stats.miss_count += 1;
        }
        hit
    }

    // Drops every entry that mentions `hotel_id`, plus the hotel list
    pub fn invalidate_hotel(&self, hotel_id: &str) -> usize {
        let keys = [HOTELS_KEY.to_string(), hotel_key(hotel_id), rooms_key(hotel_id)];
        let removed = keys.iter().filter(|key| self.remove(key)).count();
        self.stats.write().invalidated_count += removed;
        removed
    }

    pub fn clear(&self) -> usize {
        let removed = self.store.len();
        self.store.clear();
        self.expiry_index.write().clear();

        let mut stats = self.stats.write();
        stats.items_count = 0;
        stats.invalidated_count += removed;
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    fn remove(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Some((key, entry)) => {
                Self::unindex(&mut self.expiry_index.write(), entry.expires_at, &key);
                let mut stats = self.stats.write();
                stats.items_count = stats.items_count.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    fn unindex(index: &mut BTreeMap<Instant, HashSet<String>>, at: Instant, key: &str) {
        if let Some(keys) = index.get_mut(&at) {
            keys.remove(key);
            if keys.is_empty() {
                index.remove(&at);
            }
        }
    }

    fn cleanup_expired(&self) {
        let now = Instant::now();

        loop {
            let expired = {
                let mut index = self.expiry_index.write();
                match index.first_key_value() {
                    Some((at, _)) if *at <= now => index.pop_first(),
                    _ => None,
                }
            };

            let Some((_, keys)) = expired else {
                break;
            };

            // a key re-stored since it was indexed carries a later expiry
            for key in keys {
                if self
                    .store
                    .remove_if(&key, |_, entry| entry.expires_at <= now)
                    .is_some()
                {
                    let mut stats = self.stats.write();
                    stats.expired_count += 1;
                    stats.items_count = stats.items_count.saturating_sub(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_hit_and_miss_are_counted() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.store(HOTELS_KEY, vec!["h1".to_string()], None);

        assert_eq!(cache.get(HOTELS_KEY), Some(vec!["h1".to_string()]));
        assert_eq!(cache.get(&hotel_key("h1")), None);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.items_count, 1);
    }

    #[test]
    fn test_entries_expire() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.store("short", 1u32, Some(Duration::from_millis(20)));
        cache.store("long", 2u32, None);

        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
        assert_eq!(cache.stats().expired_count, 1);
        assert_eq!(cache.stats().items_count, 1);
    }

    #[test]
    fn test_overwrite_refreshes_ttl() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.store("k", 1u32, Some(Duration::from_millis(20)));
        cache.store("k", 2u32, Some(Duration::from_secs(60)));

        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.stats().items_count, 1);
        assert_eq!(cache.stats().expired_count, 0);
    }

    #[test]
    fn test_invalidate_hotel_drops_related_keys() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.store(HOTELS_KEY, 0u32, None);
        cache.store(&hotel_key("h1"), 1u32, None);
        cache.store(&rooms_key("h1"), 2u32, None);
        cache.store(&rooms_key("h2"), 3u32, None);

        assert_eq!(cache.invalidate_hotel("h1"), 3);
        assert_eq!(cache.get(&rooms_key("h2")), Some(3));
        assert_eq!(cache.get(&hotel_key("h1")), None);

        assert_eq!(cache.clear(), 1);
        assert_eq!(cache.stats().items_count, 0);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(CatalogCache::new(Duration::from_secs(60)));
        let mut handles = vec![];

        for i in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                for j in 0..200 {
                    let key = hotel_key(&format!("hotel{}", (i * 200 + j) % 50));
                    if j % 4 == 0 {
                        cache.store(&key, j, None);
                    } else {
                        let _ = cache.get(&key);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.items_count <= 50);
        assert_eq!(stats.hit_count + stats.miss_count, 8 * 150);
    }
}
