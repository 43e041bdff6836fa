use std::env;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Process configuration, read once at startup and passed into component
/// constructors. No global state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub weather_api_key: String,
    pub weather_api_base_url: String,
    pub api_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            weather_api_key: env::var("WEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("WEATHER_API_KEY not set"))?,
            weather_api_base_url: env::var("WEATHER_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.weatherapi.com/v1".to_string()),
            api_timeout_secs: parse_var("API_TIMEOUT_SECS", 10)?,
            cache_ttl_secs: parse_var("CACHE_TTL_SECS", 300)?,
            cleanup_interval_secs: parse_var("CLEANUP_INTERVAL_SECS", 300)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 8000)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid {}: {}", name, err)),
        Err(_) => Ok(default),
    }
}
