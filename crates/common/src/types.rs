//! Domain types shared across the dashboard.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Readings ──────────────────────────────────────────────────────────

/// One normalized weather measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: f64,
    /// ISO-8601 time the reading was taken or received.
    pub timestamp: String,
}

/// Latest reading as served by the feed dashboard.
///
/// `last_updated` mirrors `timestamp` for dashboards that key on it.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentSnapshot {
    #[serde(flatten)]
    pub reading: Reading,
    pub last_updated: String,
}

impl From<Reading> for CurrentSnapshot {
    fn from(reading: Reading) -> Self {
        let last_updated = reading.timestamp.clone();
        Self {
            reading,
            last_updated,
        }
    }
}

/// History window exposed as parallel arrays, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub timestamps: Vec<String>,
}

impl HistoryData {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

// ── Statistics ────────────────────────────────────────────────────────

/// Summary of one metric over a history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Per-metric statistics over a history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub temperature: Stat,
    pub humidity: Stat,
    pub wind_speed: Stat,
}

// ── Forecast ──────────────────────────────────────────────────────────

/// Daily forecast entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Local calendar date (YYYY-MM-DD).
    pub date: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    /// Mean relative humidity in %.
    pub humidity: f64,
    /// Max wind speed in km/h.
    pub wind_speed: f64,
    /// Dominant wind direction in degrees.
    pub wind_direction: f64,
}
