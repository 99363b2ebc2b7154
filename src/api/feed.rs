//! Routes served in feed mode, backed by the MQTT-fed store.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use common::{CurrentSnapshot, HistoryData, WindowStats};
use history::WeatherStore;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::health::{self, IndexResponse};

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /api/health", "Health check"),
    ("GET /api/weather/current", "Get current weather data"),
    ("GET /api/weather/history?limit=100", "Get historical weather data"),
    ("GET /api/weather/stats", "Get weather statistics"),
];

#[derive(Clone)]
pub struct FeedState {
    pub store: WeatherStore,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct CurrentResponse {
    pub status: &'static str,
    pub data: CurrentSnapshot,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub status: &'static str,
    pub count: usize,
    pub data: HistoryData,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub data: WindowStats,
}

/// Unparseable limits fall back to the full window.
fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

pub fn feed_router(state: FeedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health::health))
        .route("/api/weather/current", get(current))
        .route("/api/weather/history", get(history))
        .route("/api/weather/stats", get(stats))
        .with_state(state)
}

async fn index() -> Json<IndexResponse> {
    Json(health::index_response("feed", ENDPOINTS))
}

async fn current(State(state): State<FeedState>) -> Result<Json<CurrentResponse>, ApiError> {
    let reading = state.store.current().await.ok_or(ApiError::NoCurrentData)?;
    Ok(Json(CurrentResponse {
        status: "success",
        data: reading.into(),
    }))
}

async fn history(
    State(state): State<FeedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let data = state
        .store
        .history(parse_limit(query.limit.as_deref()))
        .await;
    Json(HistoryResponse {
        status: "success",
        count: data.len(),
        data,
    })
}

async fn stats(State(state): State<FeedState>) -> Result<Json<StatsResponse>, ApiError> {
    let data = state.store.stats().await?;
    Ok(Json(StatsResponse {
        status: "success",
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some("25")), Some(25));
        assert_eq!(parse_limit(Some(" -3 ")), Some(-3));
        assert_eq!(parse_limit(Some("lots")), None);
        assert_eq!(parse_limit(None), None);
    }
}
