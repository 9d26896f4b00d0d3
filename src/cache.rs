//! In-memory cache with TTL expiration
//!
//! Holds player lookups and logo colors so repeated plays and restarted
//! sessions do not hit the upstream API again.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::gradient::TeamColors;
use crate::nhl::PlayerInfo;

/// Default TTL for cache entries (24 hours)
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached entry with expiration time
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Keyed cache where every entry lives for the same TTL
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get cached value if not expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let cache = self.entries.read().await;
        cache.get(key).and_then(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.value.clone())
            }
        })
    }

    /// Store a value, replacing any previous entry
    pub async fn insert(&self, key: K, value: V) {
        let mut cache = self.entries.write().await;
        cache.retain(|_, entry| !entry.is_expired());
        cache.insert(key, CacheEntry::new(value, self.ttl));
    }
}

/// Player details keyed by NHL player id
pub type PlayerCache = TtlCache<u64, PlayerInfo>;

/// Clustered logo colors keyed by logo URL
pub type LogoColorCache = TtlCache<String, TeamColors>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    fn player(last_name: &str) -> PlayerInfo {
        PlayerInfo {
            first_name: "Test".to_string(),
            last_name: last_name.to_string(),
            sweater_number: Some(9),
            headshot: String::new(),
            hero_image: String::new(),
        }
    }

    #[tokio::test]
    async fn test_get_and_insert() {
        let cache = PlayerCache::new(CACHE_TTL);
        assert!(cache.get(&1).await.is_none());

        cache.insert(1, player("One")).await;
        assert_eq!(cache.get(&1).await.map(|p| p.last_name), Some("One".to_string()));

        cache.insert(1, player("Replaced")).await;
        assert_eq!(cache.get(&1).await.map(|p| p.last_name), Some("Replaced".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = LogoColorCache::new(Duration::ZERO);
        cache
            .insert("https://example.com/logo.png".to_string(), TeamColors::fallback())
            .await;
        assert!(cache.get(&"https://example.com/logo.png".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_logo_colors_round_trip() {
        let cache = LogoColorCache::new(CACHE_TTL);
        let colors = TeamColors {
            primary: Rgb::new(1, 2, 3),
            secondary: Rgb::new(4, 5, 6),
            tertiary: Rgb::new(7, 8, 9),
        };
        cache.insert("logo".to_string(), colors).await;
        assert_eq!(cache.get(&"logo".to_string()).await, Some(colors));
    }
}
