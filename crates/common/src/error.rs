//! Unified error type for the weather dashboard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("No data available yet")]
    NoDataAvailable,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("MQTT error: {0}")]
    Mqtt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
