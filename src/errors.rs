use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::ErrorDetail;

/// Domain error taxonomy. Every variant carries a stable uppercase code that
/// the route layer translates into an HTTP status.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{message}")]
    Validation { message: String, field: String },
    #[error("Invalid or unknown city: {city}")]
    InvalidCity {
        city: String,
        details: Map<String, Value>,
    },
    #[error("{message}")]
    ServiceUnavailable {
        message: String,
        details: Map<String, Value>,
    },
    #[error("{message}")]
    Timeout { message: String },
}

impl WeatherError {
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.into(),
        }
    }

    pub fn invalid_city(city: impl Into<String>) -> Self {
        Self::InvalidCity {
            city: city.into(),
            details: Map::new(),
        }
    }

    pub fn invalid_city_with(city: impl Into<String>, details: Map<String, Value>) -> Self {
        Self::InvalidCity {
            city: city.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn unavailable_with(message: impl Into<String>, details: Map<String, Value>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "BAD_REQUEST",
            Self::InvalidCity { .. } => "UNKNOWN_CITY",
            Self::ServiceUnavailable { .. } => "UPSTREAM_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    pub fn details(&self) -> Map<String, Value> {
        match self {
            Self::Validation { field, .. } => {
                let mut details = Map::new();
                details.insert("field".to_string(), Value::String(field.clone()));
                details
            }
            Self::InvalidCity { details, .. } | Self::ServiceUnavailable { details, .. } => {
                details.clone()
            }
            Self::Timeout { .. } => Map::new(),
        }
    }

    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail::new(self.code(), self.to_string(), self.details())
    }
}
