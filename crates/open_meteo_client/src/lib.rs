//! Open-Meteo forecast API client.
//!
//! Fetches current conditions, recent hourly history and the daily forecast
//! for a configured city and reshapes them into the dashboard's `Reading`,
//! `HistoryWindow` and `ForecastDay` types.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use common::config::CityConfig;
use common::{now_iso, Error, ForecastDay, Reading};
use history::{normalize_object, FieldNames, HistoryWindow};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,relative_humidity_2m_mean,wind_speed_10m_max,wind_direction_10m_dominant";

/// Upper bound on hours of history served per request.
pub const MAX_HISTORY_HOURS: u32 = 48;
/// Number of daily forecast entries served.
pub const FORECAST_DAYS: usize = 7;

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Open-Meteo client with connection pooling and a fixed per-call timeout.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

// ── Open-Meteo response types ─────────────────────────────────────────

/// Response to a `current=` request.
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub current: Option<Map<String, Value>>,
}

/// Response to an `hourly=` request.
#[derive(Debug, Deserialize)]
pub struct HourlyResponse {
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m: Vec<Option<f64>>,
}

/// Response to a `daily=` request.
#[derive(Debug, Deserialize)]
pub struct DailyResponse {
    #[serde(default)]
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent("weather-dashboard/0.1")
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build Open-Meteo HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        city: &CityConfig,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let mut query = vec![
            ("latitude", format!("{:.4}", city.lat)),
            ("longitude", format!("{:.4}", city.lon)),
        ];
        query.extend(params.iter().cloned());

        debug!("Fetching Open-Meteo data: {} city={}", self.base_url, city.name);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                Error::UpstreamUnavailable(format!("HTTP error for {}: {}", city.name, e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "Open-Meteo returned {} for {}: {}",
                status.as_u16(),
                city.name,
                body.chars().take(500).collect::<String>()
            )));
        }

        resp.json().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("JSON parse error for {}: {}", city.name, e))
        })
    }

    /// Fetch current conditions for a city.
    pub async fn fetch_current(&self, city: &CityConfig) -> Result<Reading, Error> {
        let payload: CurrentResponse = self
            .get_json(city, &[("current", CURRENT_FIELDS.to_string())])
            .await?;
        current_reading(&city.name, payload)
    }

    /// Fetch the last `hours` hourly readings (clamped to 1..=48), oldest first.
    pub async fn fetch_history(&self, city: &CityConfig, hours: u32) -> Result<HistoryWindow, Error> {
        let hours = hours.clamp(1, MAX_HISTORY_HOURS);
        let past_days = hours.div_ceil(24);

        let payload: HourlyResponse = self
            .get_json(
                city,
                &[
                    ("hourly", HOURLY_FIELDS.to_string()),
                    ("past_days", past_days.to_string()),
                    ("forecast_days", "1".to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        let now_local =
            Utc::now().naive_utc() + chrono::Duration::seconds(payload.utc_offset_seconds);
        let Some(hourly) = payload.hourly else {
            return Err(Error::UpstreamUnavailable(format!(
                "Open-Meteo missing hourly block for {}",
                city.name
            )));
        };

        let window = hourly_window(&hourly, now_local, hours as usize);
        debug!("Got {} hourly readings for {}", window.len(), city.name);
        Ok(window)
    }

    /// Fetch the daily forecast (at most seven days) for a city.
    pub async fn fetch_forecast(&self, city: &CityConfig) -> Result<Vec<ForecastDay>, Error> {
        let payload: DailyResponse = self
            .get_json(
                city,
                &[
                    ("daily", DAILY_FIELDS.to_string()),
                    ("forecast_days", FORECAST_DAYS.to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        let Some(daily) = payload.daily else {
            return Err(Error::UpstreamUnavailable(format!(
                "Open-Meteo missing daily block for {}",
                city.name
            )));
        };

        Ok(forecast_days(&daily))
    }
}

fn value_at(series: &[Option<f64>], i: usize) -> f64 {
    series.get(i).copied().flatten().unwrap_or(0.0)
}

fn current_reading(city_name: &str, payload: CurrentResponse) -> Result<Reading, Error> {
    let Some(current) = payload.current else {
        return Err(Error::UpstreamUnavailable(format!(
            "Open-Meteo missing current block for {city_name}"
        )));
    };

    let timestamp = current
        .get("time")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(now_iso);

    normalize_object(&current, &FieldNames::OPEN_METEO, timestamp)
        .map_err(|e| Error::UpstreamUnavailable(format!("{city_name}: {e}")))
}

/// Keep hourly rows at or before `now_local`, retaining the newest `hours`.
fn hourly_window(hourly: &HourlyBlock, now_local: NaiveDateTime, hours: usize) -> HistoryWindow {
    let rows = hourly.time.iter().enumerate().filter(|(_, t)| {
        NaiveDateTime::parse_from_str(t, LOCAL_TIME_FORMAT)
            .map(|t| t <= now_local)
            .unwrap_or(false)
    });

    HistoryWindow::from_readings(
        hours,
        rows.map(|(i, time)| Reading {
            temperature: value_at(&hourly.temperature_2m, i),
            humidity: value_at(&hourly.relative_humidity_2m, i),
            wind_speed: value_at(&hourly.wind_speed_10m, i),
            wind_direction: value_at(&hourly.wind_direction_10m, i),
            timestamp: time.clone(),
        }),
    )
}

fn forecast_days(daily: &DailyBlock) -> Vec<ForecastDay> {
    daily
        .time
        .iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(i, date)| ForecastDay {
            date: date.clone(),
            temperature_max: value_at(&daily.temperature_2m_max, i),
            temperature_min: value_at(&daily.temperature_2m_min, i),
            humidity: value_at(&daily.relative_humidity_2m_mean, i),
            wind_speed: value_at(&daily.wind_speed_10m_max, i),
            wind_direction: value_at(&daily.wind_direction_10m_dominant, i),
        })
        .collect()
}
