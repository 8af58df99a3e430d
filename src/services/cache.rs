use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Live entries kept before the oldest one is evicted to make room.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

struct CacheEntry {
    value: Value,
    tag: String,
    stored_at: Instant,
}

/// In-process, time-bounded response cache.
///
/// Entries carry a tag so a whole family of responses can be dropped at
/// once. Concurrent fills for the same key are not coordinated; the last
/// writer wins. At most `max_entries` live entries are held.
pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: String, tag: &str, value: Value) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(evicted = %oldest, "Response cache full, evicting oldest entry");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                tag: tag.to_string(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every entry carrying `tag`. Returns how many were removed.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.tag != tag);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.insert("k".into(), "xs2-events", json!({"a": 1})).await;
        assert_eq!(cache.get("k").await, Some(json!({"a": 1})));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("k".into(), "xs2-events", json!(1)).await;
        cache.insert("k".into(), "xs2-events", json!(2)).await;
        assert_eq!(cache.get("k").await, Some(json!(2)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidation_is_scoped_to_tag() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("a".into(), "xs2-events", json!(1)).await;
        cache.insert("b".into(), "xs2-events", json!(2)).await;
        cache.insert("c".into(), "other", json!(3)).await;

        assert_eq!(cache.invalidate_tag("xs2-events").await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("c").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn full_cache_evicts_the_oldest_entry() {
        let cache = ResponseCache::with_capacity(Duration::from_secs(60), 3);
        for i in 0..10 {
            cache.insert(format!("events?junk={i}"), "xs2-events", json!(i)).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.get("events?junk=0").await, None);
        assert_eq!(cache.get("events?junk=6").await, None);
        assert_eq!(cache.get("events?junk=9").await, Some(json!(9)));
        assert_eq!(cache.get("events?junk=7").await, Some(json!(7)));
    }

    #[tokio::test]
    async fn overwriting_a_key_in_a_full_cache_evicts_nothing() {
        let cache = ResponseCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("a".into(), "xs2-events", json!(1)).await;
        cache.insert("b".into(), "xs2-events", json!(2)).await;
        cache.insert("a".into(), "xs2-events", json!(3)).await;

        assert_eq!(cache.get("a").await, Some(json!(3)));
        assert_eq!(cache.get("b").await, Some(json!(2)));
    }
}
