//! Request parsing and error mapping for the population endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use geopop::PopulationError;

/// Raw query string of `GET /population`.
///
/// Both fields are taken as strings so that missing or non-integer values
/// produce our own 400 body instead of the extractor's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PopulationQueryParams {
    /// Place name (any case, exact match)
    pub place: Option<String>,
    /// Radius in kilometres
    pub radius: Option<String>,
}

impl PopulationQueryParams {
    pub fn parse(&self) -> Result<(String, i64), PopulationError> {
        let place = self
            .place
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing_key("place"))?;

        let radius = self
            .radius
            .as_deref()
            .ok_or_else(|| missing_key("radius"))?;
        let radius = radius.trim().parse::<i64>().map_err(|_| {
            PopulationError::InvalidInput(format!("expected int for radius, got '{}'", radius))
        })?;

        Ok((place.to_string(), radius))
    }
}

fn missing_key(key: &str) -> PopulationError {
    PopulationError::InvalidInput(format!("required key not provided: {}", key))
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

/// HTTP view of a failed request.
#[derive(Debug)]
pub enum ApiError {
    Population(PopulationError),
    /// The blocking query task panicked or was cancelled
    Internal(String),
}

impl From<PopulationError> for ApiError {
    fn from(err: PopulationError) -> Self {
        ApiError::Population(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Population(PopulationError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Population(PopulationError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Population(PopulationError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Population(PopulationError::RecordSkipped(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Population(e) => e.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!("Population query failed: {}", message);
        }
        (status, Json(ErrorBody { message })).into_response()
    }
}
