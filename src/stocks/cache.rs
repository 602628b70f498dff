use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

/// In-memory cache with a single time-to-live for every entry.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                    debug!(%key, "cache hit");
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        debug!(%key, "cache expired");
        self.entries.write().await.remove(key);
        None
    }

    pub async fn insert(&self, key: String, value: V) {
        self.entries.write().await.insert(key, (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("price_AAPL".into(), 186).await;
        assert_eq!(cache.get("price_AAPL").await, Some(186));
        assert_eq!(cache.get("price_MSFT").await, None);
    }

    #[tokio::test]
    async fn zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("price_AAPL".into(), 186).await;
        assert_eq!(cache.get("price_AAPL").await, None);
        assert!(cache.entries.read().await.is_empty());
    }
}
