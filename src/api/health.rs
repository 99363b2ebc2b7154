use axum::Json;
use common::now_iso;
use serde::Serialize;

pub const SERVICE_NAME: &str = "Weather Dashboard API";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: now_iso(),
    })
}

/// Service metadata returned from `/`.
#[derive(Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub mode: &'static str,
    pub endpoints: Vec<EndpointDoc>,
}

#[derive(Serialize)]
pub struct EndpointDoc {
    pub route: &'static str,
    pub description: &'static str,
}

pub fn index_response(mode: &'static str, endpoints: &[(&'static str, &'static str)]) -> IndexResponse {
    IndexResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        mode,
        endpoints: endpoints
            .iter()
            .map(|&(route, description)| EndpointDoc { route, description })
            .collect(),
    }
}
