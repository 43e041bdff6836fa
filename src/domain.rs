use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::WeatherError;

/// Fixed identifier of the upstream data source.
pub const PROVIDER: &str = "weatherapi";

pub const MAX_CITY_LEN: usize = 100;
pub const TEMP_MIN_C: f64 = -100.0;
pub const TEMP_MAX_C: f64 = 60.0;

/// Validated weather snapshot for one city.
///
/// A record failing any field constraint is never constructed: the only ways
/// in are [`WeatherRecord::new`] / [`WeatherRecord::with_fetched_at`] and
/// deserialization, which re-runs the same checks via `TryFrom`. Fields are
/// private so a record cannot be mutated into an invalid state afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeatherRecord")]
pub struct WeatherRecord {
    city: String,
    temperature: f64,
    humidity: u8,
    wind_speed: f64,
    condition: String,
    fetched_at: DateTime<Utc>,
    provider: String,
}

/// Unvalidated mirror used as the deserialization entry point.
#[derive(Debug, Deserialize)]
struct RawWeatherRecord {
    city: String,
    temperature: f64,
    humidity: i64,
    wind_speed: f64,
    condition: String,
    fetched_at: DateTime<Utc>,
    provider: String,
}

impl TryFrom<RawWeatherRecord> for WeatherRecord {
    type Error = WeatherError;

    fn try_from(raw: RawWeatherRecord) -> Result<Self, Self::Error> {
        if raw.provider != PROVIDER {
            return Err(WeatherError::validation(
                format!("Unknown weather provider: {}", raw.provider),
                "provider",
            ));
        }
        Self::with_fetched_at(
            &raw.city,
            raw.temperature,
            raw.humidity,
            raw.wind_speed,
            &raw.condition,
            raw.fetched_at,
        )
    }
}

impl WeatherRecord {
    /// Builds a record stamped with the current time.
    pub fn new(
        city: &str,
        temperature: f64,
        humidity: i64,
        wind_speed: f64,
        condition: &str,
    ) -> Result<Self, WeatherError> {
        Self::with_fetched_at(city, temperature, humidity, wind_speed, condition, Utc::now())
    }

    pub fn with_fetched_at(
        city: &str,
        temperature: f64,
        humidity: i64,
        wind_speed: f64,
        condition: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::validation("City name cannot be empty", "city"));
        }
        if city.chars().count() > MAX_CITY_LEN {
            return Err(WeatherError::validation(
                format!("City name cannot exceed {} characters", MAX_CITY_LEN),
                "city",
            ));
        }
        if !(TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature) {
            return Err(WeatherError::validation(
                format!(
                    "Temperature must be between {}°C and {}°C",
                    TEMP_MIN_C, TEMP_MAX_C
                ),
                "temperature",
            ));
        }
        if !(0..=100).contains(&humidity) {
            return Err(WeatherError::validation(
                "Humidity must be between 0 and 100",
                "humidity",
            ));
        }
        if wind_speed < 0.0 || wind_speed.is_nan() {
            return Err(WeatherError::validation(
                "Wind speed cannot be negative",
                "wind_speed",
            ));
        }
        let condition = condition.trim();
        if condition.is_empty() {
            return Err(WeatherError::validation(
                "Weather condition cannot be empty",
                "condition",
            ));
        }

        Ok(Self {
            city: title_case(city),
            temperature,
            humidity: humidity as u8,
            wind_speed,
            condition: condition.to_string(),
            fetched_at,
            provider: PROVIDER.to_string(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> u8 {
        self.humidity
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Uppercases the first letter of each word, lowercases the rest. A word
/// boundary is any non-alphabetic character, so "port-au-prince" becomes
/// "Port-Au-Prince".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

/// Uniform wire shape for all failures surfaced to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Map<String, Value>,
}

impl ErrorDetail {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Map<String, Value>,
    ) -> Self {
        Self {
            code: code.into().to_uppercase(),
            message: message.into(),
            details,
        }
    }
}
