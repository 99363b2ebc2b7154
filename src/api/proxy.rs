//! Routes served in proxy mode; every request is answered from a fresh
//! Open-Meteo call for the requested city.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use common::config::{AppConfig, CityConfig};
use common::{ForecastDay, HistoryData, Reading, WindowStats};
use history::compute_stats;
use open_meteo_client::{OpenMeteoClient, MAX_HISTORY_HOURS};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::health::{self, IndexResponse};

const DEFAULT_HISTORY_HOURS: u32 = 24;

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /api/health", "Health check"),
    ("GET /api/cities", "List supported cities"),
    ("GET /api/weather/current?city=Tokyo", "Get current weather for a city"),
    (
        "GET /api/weather/history?city=Tokyo&hours=24",
        "Get hourly history for a city (max 48 hours)",
    ),
    ("GET /api/weather/stats?city=Tokyo", "Get 24-hour statistics for a city"),
    ("GET /api/weather/forecast?city=Tokyo", "Get the 7-day forecast for a city"),
];

#[derive(Clone)]
pub struct ProxyState {
    pub client: OpenMeteoClient,
    pub config: Arc<AppConfig>,
}

impl ProxyState {
    /// Resolve the requested city, falling back to the configured default.
    fn resolve_city(&self, requested: Option<&str>) -> Result<&CityConfig, ApiError> {
        let name = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.default_city.as_str());

        self.config
            .find_city(name)
            .ok_or_else(|| ApiError::UnknownCity {
                city: name.to_string(),
                available: self.config.city_names(),
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
    pub limit: Option<String>,
    pub hours: Option<String>,
}

impl CityQuery {
    fn hours(&self) -> u32 {
        self.hours
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|h| h.clamp(1, i64::from(MAX_HISTORY_HOURS)) as u32)
            .unwrap_or(DEFAULT_HISTORY_HOURS)
    }

    fn limit(&self) -> Option<i64> {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
    }
}

#[derive(Serialize)]
pub struct CurrentResponse {
    pub status: &'static str,
    pub city: String,
    pub data: Reading,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub status: &'static str,
    pub city: String,
    pub count: usize,
    pub data: HistoryData,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub city: String,
    pub data: WindowStats,
}

#[derive(Serialize)]
pub struct ForecastResponse {
    pub status: &'static str,
    pub city: String,
    pub data: Vec<ForecastDay>,
}

#[derive(Serialize)]
pub struct CitiesResponse {
    pub status: &'static str,
    pub cities: Vec<String>,
}

pub fn proxy_router(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health::health))
        .route("/api/cities", get(cities))
        .route("/api/weather/current", get(current))
        .route("/api/weather/history", get(history))
        .route("/api/weather/stats", get(stats))
        .route("/api/weather/forecast", get(forecast))
        .with_state(state)
}

async fn index() -> Json<IndexResponse> {
    Json(health::index_response("proxy", ENDPOINTS))
}

async fn cities(State(state): State<ProxyState>) -> Json<CitiesResponse> {
    Json(CitiesResponse {
        status: "success",
        cities: state.config.city_names(),
    })
}

async fn current(
    State(state): State<ProxyState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let city = state.resolve_city(query.city.as_deref())?;
    let data = state.client.fetch_current(city).await?;
    info!(
        "Current weather for {}: temp={:.1}°C humidity={:.0}% wind={:.1}km/h",
        city.name, data.temperature, data.humidity, data.wind_speed
    );

    Ok(Json(CurrentResponse {
        status: "success",
        city: city.name.clone(),
        data,
    }))
}

async fn history(
    State(state): State<ProxyState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let city = state.resolve_city(query.city.as_deref())?;
    let window = state.client.fetch_history(city, query.hours()).await?;
    let data = window.snapshot(query.limit());

    Ok(Json(HistoryResponse {
        status: "success",
        city: city.name.clone(),
        count: data.len(),
        data,
    }))
}

async fn stats(
    State(state): State<ProxyState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let city = state.resolve_city(query.city.as_deref())?;
    let window = state
        .client
        .fetch_history(city, DEFAULT_HISTORY_HOURS)
        .await?;
    let data = compute_stats(&window)?;

    Ok(Json(StatsResponse {
        status: "success",
        city: city.name.clone(),
        data,
    }))
}

async fn forecast(
    State(state): State<ProxyState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let city = state.resolve_city(query.city.as_deref())?;
    let data = state.client.fetch_forecast(city).await?;

    Ok(Json(ForecastResponse {
        status: "success",
        city: city.name.clone(),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(hours: Option<&str>) -> CityQuery {
        CityQuery {
            hours: hours.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_hours_default_and_clamp() {
        assert_eq!(query(None).hours(), DEFAULT_HISTORY_HOURS);
        assert_eq!(query(Some("6")).hours(), 6);
        assert_eq!(query(Some("500")).hours(), MAX_HISTORY_HOURS);
        assert_eq!(query(Some("0")).hours(), 1);
        assert_eq!(query(Some("soon")).hours(), DEFAULT_HISTORY_HOURS);
    }
}
