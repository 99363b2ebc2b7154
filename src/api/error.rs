use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

/// JSON error body; every failure carries an `error` key.
#[derive(Debug, Serialize)]
struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_cities: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Feed has not delivered a reading yet.
    NoCurrentData,
    /// History window is empty.
    NoHistory,
    UnknownCity {
        city: String,
        available: Vec<String>,
    },
    Upstream(String),
    Internal(String),
}

impl From<common::Error> for ApiError {
    fn from(err: common::Error) -> Self {
        match err {
            common::Error::NoDataAvailable => ApiError::NoHistory,
            common::Error::UpstreamUnavailable(msg) => ApiError::Upstream(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Status and JSON body an `ApiError` renders to.
struct ErrorParts {
    status: StatusCode,
    body: ErrorBody,
}

impl From<ApiError> for ErrorParts {
    fn from(err: ApiError) -> Self {
        let (status, body) = match err {
            ApiError::NoCurrentData => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "No weather data available yet".into(),
                    message: Some("Waiting for data from MQTT broker".into()),
                    available_cities: None,
                },
            ),
            ApiError::NoHistory => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "No historical data available".into(),
                    message: None,
                    available_cities: None,
                },
            ),
            ApiError::UnknownCity { city, available } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Unknown city".into(),
                    message: Some(format!("City '{city}' is not supported")),
                    available_cities: Some(available),
                },
            ),
            ApiError::Upstream(msg) => {
                warn!("Upstream request failed: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        error: "Failed to fetch weather data".into(),
                        message: Some(msg),
                        available_cities: None,
                    },
                )
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".into(),
                    message: Some(msg),
                    available_cities: None,
                },
            ),
        };

        ErrorParts { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ErrorParts { status, body } = self.into();
        (status, Json(body)).into_response()
    }
}
