use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::WeatherRecord;
use crate::ports::CachePort;

/// One cached record plus its absolute expiry. The payload is kept in its
/// serialized form and reconstructed on read, so a stored entry that no
/// longer deserializes into a valid record can be detected and dropped.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    expires_at: DateTime<Utc>,
}

/// Concurrency-safe in-memory TTL cache.
///
/// A single mutex serializes every operation, so readers never observe a
/// torn entry. Expiry is lazy on read, with [`InMemoryCache::cleanup_expired`]
/// available for periodic sweeps of entries nobody reads.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached record for `key`, or `None` on miss.
    ///
    /// An entry past its expiry is deleted and reported as a miss. An entry
    /// that fails to reconstruct into a valid record is treated as corrupted:
    /// deleted and reported as a miss, never surfaced as an error.
    pub async fn get(&self, key: &str) -> Option<WeatherRecord> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?.clone();

        if Utc::now() > entry.expires_at {
            tracing::debug!(key, "cache entry expired");
            entries.remove(key);
            return None;
        }

        match serde_json::from_value::<WeatherRecord>(entry.data) {
            Ok(record) => {
                tracing::debug!(key, "cache hit");
                Some(record)
            }
            Err(err) => {
                tracing::error!(key, error = %err, "corrupted cache entry, dropping");
                entries.remove(key);
                None
            }
        }
    }

    /// Stores `value` under `key`, overwriting any existing entry.
    ///
    /// `ttl_secs = 0` produces an entry that is already expired, which is
    /// useful for exercising expiry boundaries.
    pub async fn set(&self, key: &str, value: &WeatherRecord, ttl_secs: u64) -> anyhow::Result<()> {
        let data = serde_json::to_value(value)?;
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);

        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), CacheEntry { data, expires_at });
        tracing::debug!(key, ttl_secs, "cached entry");
        Ok(())
    }

    /// Idempotent; removing an absent key is not an error.
    pub async fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            tracing::debug!(key, "deleted cache entry");
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        tracing::info!("cleared all cache entries");
    }

    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Removes every entry past its expiry and returns the count removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= now);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::info!(removed, "cleaned up expired cache entries");
        }
        removed
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<WeatherRecord>> {
        Ok(InMemoryCache::get(self, key).await)
    }

    async fn set(&self, key: &str, value: &WeatherRecord, ttl_secs: u64) -> anyhow::Result<()> {
        InMemoryCache::set(self, key, value, ttl_secs).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        InMemoryCache::delete(self, key).await;
        Ok(())
    }
}
