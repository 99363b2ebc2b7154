//! Dashboard configuration types.

use serde::{Deserialize, Serialize};

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// MQTT broker and topic used by the feed and the publisher.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Sliding-window history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Open-Meteo upstream settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Publisher settings.
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// City served when a request names none.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Cities the proxy may serve.
    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,
}

/// Configuration for a single city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    /// Human-readable name, also the `city` query value.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_mqtt_topic")]
    pub topic: String,

    /// Client id used by the feed subscriber.
    #[serde(default = "default_feed_client_id")]
    pub client_id: String,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Bound of the channel between the MQTT event loop and the consumer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of readings retained by the feed window.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Open-Meteo forecast endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to every outbound call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// City whose current conditions are published.
    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default = "default_publish_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_publisher_client_id")]
    pub client_id: String,
}

impl AppConfig {
    /// Look up a configured city by exact name.
    pub fn find_city(&self, name: &str) -> Option<&CityConfig> {
        self.cities.iter().find(|c| c.name == name)
    }

    pub fn city_names(&self) -> Vec<String> {
        self.cities.iter().map(|c| c.name.clone()).collect()
    }
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}
fn default_mqtt_host() -> String {
    "localhost".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_mqtt_topic() -> String {
    "weather/data".into()
}
fn default_feed_client_id() -> String {
    "weather-dashboard-feed".into()
}
fn default_publisher_client_id() -> String {
    "weather-dashboard-publisher".into()
}
fn default_keep_alive() -> u64 {
    60
}
fn default_channel_capacity() -> usize {
    64
}

fn default_capacity() -> usize {
    100
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".into()
}
fn default_timeout() -> u64 {
    10
}

fn default_publish_interval() -> u64 {
    10
}

fn default_city() -> String {
    "Tokyo".into()
}

fn default_cities() -> Vec<CityConfig> {
    [
        ("Tokyo", 35.6895, 139.6917),
        ("Kyoto", 35.0116, 135.7681),
        ("Osaka", 34.6937, 135.5023),
        ("Hokkaido", 43.0642, 141.3469),
        ("New Delhi", 28.6139, 77.2090),
        ("Beijing", 39.9042, 116.4074),
        ("Shanghai", 31.2304, 121.4737),
        ("New York", 40.7128, -74.0060),
        ("Frankfurt", 50.1109, 8.6821),
    ]
    .into_iter()
    .map(|(name, lat, lon)| CityConfig {
        name: name.into(),
        lat,
        lon,
    })
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
            client_id: default_feed_client_id(),
            keep_alive_secs: default_keep_alive(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            interval_secs: default_publish_interval(),
            client_id: default_publisher_client_id(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            mqtt: MqttConfig::default(),
            history: HistoryConfig::default(),
            upstream: UpstreamConfig::default(),
            publisher: PublisherConfig::default(),
            default_city: default_city(),
            cities: default_cities(),
        }
    }
}
