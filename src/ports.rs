use async_trait::async_trait;

use crate::domain::WeatherRecord;
use crate::errors::WeatherError;

/// Capability to fetch current weather for a city from the upstream provider.
///
/// Implementations classify every failure into the [`WeatherError`] taxonomy;
/// nothing unexpected leaks out raw.
#[async_trait]
pub trait UpstreamPort: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, WeatherError>;
}

/// Capability to cache weather records with a per-entry TTL.
///
/// The cache is strictly best-effort: methods are fallible so that callers
/// can absorb faults (a failed `get` is a miss, a failed `set` is ignored).
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<WeatherRecord>>;
    async fn set(&self, key: &str, value: &WeatherRecord, ttl_secs: u64) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
