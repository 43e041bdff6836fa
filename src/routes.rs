use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config, domain::WeatherRecord, errors::WeatherError, usecase::GetWeatherUseCase,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub use_case: Arc<GetWeatherUseCase>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub health: String,
}

/// Error code to transport status: client mistakes are 422, a blown upstream
/// deadline is 504, any other upstream failure is 502.
impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = match self {
            WeatherError::Validation { .. } | WeatherError::InvalidCity { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WeatherError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            WeatherError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(self.to_detail())).into_response()
    }
}

// Route handlers
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherRecord>, WeatherError> {
    let city = params.city.unwrap_or_default();
    tracing::info!(%city, "received weather request");
    let record = state.use_case.execute(&city).await?;
    Ok(Json(record))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Welcome to the {} API", env!("CARGO_PKG_NAME")),
        version: env!("CARGO_PKG_VERSION").to_string(),
        health: "/api/health".to_string(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/weather", get(get_weather))
        .with_state(state)
}
