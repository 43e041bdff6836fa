use std::sync::Arc;

use crate::domain::{WeatherRecord, MAX_CITY_LEN};
use crate::errors::WeatherError;
use crate::ports::{CachePort, UpstreamPort};

/// Orchestrates one weather retrieval: validate, consult the cache, fetch
/// upstream, populate the cache.
///
/// The cache is strictly an optimization. Faults from it are logged and
/// absorbed; only validation and upstream outcomes decide the result.
pub struct GetWeatherUseCase {
    upstream: Arc<dyn UpstreamPort>,
    cache: Option<Arc<dyn CachePort>>,
    cache_ttl_secs: u64,
}

impl GetWeatherUseCase {
    pub fn new(
        upstream: Arc<dyn UpstreamPort>,
        cache: Option<Arc<dyn CachePort>>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            upstream,
            cache,
            cache_ttl_secs,
        }
    }

    pub async fn execute(&self, city_input: &str) -> Result<WeatherRecord, WeatherError> {
        let city = city_input.trim();
        if city.is_empty() {
            return Err(WeatherError::validation("City name cannot be empty", "city"));
        }
        if city.chars().count() > MAX_CITY_LEN {
            return Err(WeatherError::validation(
                format!("City name cannot exceed {} characters", MAX_CITY_LEN),
                "city",
            ));
        }

        let cache_key = format!("weather:{}", city.to_lowercase());

        if let Some(cache) = &self.cache {
            match cache.get(&cache_key).await {
                Ok(Some(record)) => {
                    tracing::info!(city, "weather served from cache");
                    return Ok(record);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(city, error = %err, "cache read failed, treating as miss");
                }
            }
        }

        tracing::info!(city, "fetching weather from upstream");
        let record = self.upstream.fetch(city).await?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.set(&cache_key, &record, self.cache_ttl_secs).await {
                tracing::warn!(city, error = %err, "cache write failed");
            } else {
                tracing::debug!(city, "weather cached");
            }
        }

        Ok(record)
    }
}
