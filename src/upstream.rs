use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::domain::WeatherRecord;
use crate::errors::WeatherError;
use crate::ports::UpstreamPort;

/// Shape of the provider's `current.json` payload, reduced to the fields we
/// consume.
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    location: Location,
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    humidity: i64,
    wind_kph: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

/// Adapter for weatherapi.com.
///
/// Classifies every outcome into the [`WeatherError`] taxonomy: 400 means
/// the city is unknown, auth failures and 5xx mean the service is
/// unavailable, a blown deadline means timeout. Malformed payloads are
/// surfaced as unavailable, never as a crash.
pub struct WeatherApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent("CityWeatherServer/1.0")
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.weather_api_key.clone(),
            base_url: config.weather_api_base_url.clone(),
        }
    }
}

#[async_trait]
impl UpstreamPort for WeatherApiClient {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        let url = format!("{}/current.json", self.base_url);

        tracing::info!(city, "requesting current weather from provider");
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await
            .map_err(|err| classify_transport_error(err, city))?;

        match response.status() {
            StatusCode::OK => {
                let payload: CurrentWeatherResponse = response.json().await.map_err(|err| {
                    tracing::error!(city, error = %err, "provider payload has unexpected shape");
                    let mut details = Map::new();
                    details.insert("error".to_string(), Value::String(err.to_string()));
                    WeatherError::unavailable_with(
                        "Invalid response format from weather service",
                        details,
                    )
                })?;
                map_to_record(payload, city)
            }
            StatusCode::BAD_REQUEST => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                tracing::warn!(city, "provider does not recognize city");
                let mut details = Map::new();
                details.insert("response".to_string(), body);
                Err(WeatherError::invalid_city_with(city, details))
            }
            StatusCode::UNAUTHORIZED => {
                tracing::error!("provider rejected API key");
                let mut details = Map::new();
                details.insert("status_code".to_string(), Value::from(401));
                Err(WeatherError::unavailable_with(
                    "Weather service authentication failed",
                    details,
                ))
            }
            status if status.is_server_error() => {
                tracing::error!(city, status = status.as_u16(), "provider server error");
                let mut details = Map::new();
                details.insert("status_code".to_string(), Value::from(status.as_u16()));
                Err(WeatherError::unavailable_with(
                    "Weather service is temporarily unavailable",
                    details,
                ))
            }
            status => {
                tracing::error!(city, status = status.as_u16(), "unexpected provider response");
                let mut details = Map::new();
                details.insert("status_code".to_string(), Value::from(status.as_u16()));
                Err(WeatherError::unavailable_with(
                    format!("Unexpected response from weather service: {}", status.as_u16()),
                    details,
                ))
            }
        }
    }
}

fn classify_transport_error(err: reqwest::Error, city: &str) -> WeatherError {
    if err.is_timeout() {
        tracing::error!(city, "request to weather provider timed out");
        WeatherError::timeout(format!(
            "Request timed out while fetching weather for {}",
            city
        ))
    } else {
        tracing::error!(city, error = %err, "request to weather provider failed");
        let mut details = Map::new();
        details.insert("error".to_string(), Value::String(err.to_string()));
        WeatherError::unavailable_with(
            "An unexpected error occurred while fetching weather data",
            details,
        )
    }
}

/// Builds the domain record from the provider payload. The provider may
/// resolve the requested city to a differently-formatted name; the resolved
/// name wins.
fn map_to_record(payload: CurrentWeatherResponse, city: &str) -> Result<WeatherRecord, WeatherError> {
    WeatherRecord::new(
        &payload.location.name,
        payload.current.temp_c,
        payload.current.humidity,
        payload.current.wind_kph,
        &payload.current.condition.text,
    )
    .map_err(|err| {
        tracing::error!(city, error = %err, "provider payload failed domain validation");
        let mut details = Map::new();
        details.insert("error".to_string(), Value::String(err.to_string()));
        WeatherError::unavailable_with("Invalid data format from weather service", details)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String, timeout_secs: u64) -> Config {
        Config {
            weather_api_key: "test-key".to_string(),
            weather_api_base_url: base_url,
            api_timeout_secs: timeout_secs,
            cache_ttl_secs: 300,
            cleanup_interval_secs: 300,
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    fn current_payload() -> Value {
        json!({
            "location": {"name": "London"},
            "current": {
                "temp_c": 15.5,
                "humidity": 65,
                "wind_kph": 12.3,
                "condition": {"text": "Partly cloudy"}
            }
        })
    }

    #[tokio::test]
    async fn test_maps_success_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", "London"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload()))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let record = client.fetch("London").await.unwrap();

        assert_eq!(record.city(), "London");
        assert_eq!(record.temperature(), 15.5);
        assert_eq!(record.humidity(), 65);
        assert_eq!(record.wind_speed(), 12.3);
        assert_eq!(record.condition(), "Partly cloudy");
        assert_eq!(record.provider(), "weatherapi");
    }

    #[tokio::test]
    async fn test_bad_request_is_unknown_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 1006, "message": "No matching location found."}
            })))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("Nowhereville").await.unwrap_err();

        assert!(matches!(err, WeatherError::InvalidCity { ref city, .. } if city == "Nowhereville"));
        assert_eq!(err.code(), "UNKNOWN_CITY");
    }

    #[tokio::test]
    async fn test_auth_failure_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_unexpected_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(418))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": "London"}
            })))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_out_of_range_payload_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": "London"},
                "current": {
                    "temp_c": 15.5,
                    "humidity": 400,
                    "wind_kph": 12.3,
                    "condition": {"text": "Partly cloudy"}
                }
            })))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_payload())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 1));
        let err = client.fetch("London").await.unwrap_err();

        assert_eq!(err.code(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_resolved_city_name_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", "london"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload()))
            .mount(&server)
            .await;

        let client = WeatherApiClient::new(&test_config(server.uri(), 5));
        let record = client.fetch("london").await.unwrap();

        // Provider-resolved name, not the raw request string
        assert_eq!(record.city(), "London");
    }
}
