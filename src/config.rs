//! Configuration loader: merges .env, config.toml and environment variables.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use common::config::AppConfig;
use common::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const MIN_KEEP_ALIVE_SECS: u64 = 5;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_non_empty(raw: &str, env_name: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Config(format!("{env_name} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.server.bind_addr.parse::<SocketAddr>().is_err() {
        issues.push(format!(
            "server.bind_addr is not a socket address: {}",
            config.server.bind_addr
        ));
    }

    if config.mqtt.host.trim().is_empty() {
        issues.push("mqtt.host must not be empty".into());
    }
    if config.mqtt.port == 0 {
        issues.push("mqtt.port must be > 0".into());
    }
    if config.mqtt.topic.trim().is_empty() {
        issues.push("mqtt.topic must not be empty".into());
    }
    if config.mqtt.topic.contains(['+', '#']) {
        issues.push("mqtt.topic must be a concrete topic without wildcards".into());
    }
    if config.mqtt.client_id.trim().is_empty() {
        issues.push("mqtt.client_id must not be empty".into());
    }
    if config.mqtt.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
        issues.push(format!("mqtt.keep_alive_secs must be >= {MIN_KEEP_ALIVE_SECS}"));
    }
    if config.mqtt.channel_capacity == 0 {
        issues.push("mqtt.channel_capacity must be > 0".into());
    }

    if config.history.capacity == 0 {
        issues.push("history.capacity must be > 0".into());
    }

    if !config.upstream.base_url.starts_with("http://")
        && !config.upstream.base_url.starts_with("https://")
    {
        issues.push("upstream.base_url must be an http(s) URL".into());
    }
    if config.upstream.timeout_secs == 0 {
        issues.push("upstream.timeout_secs must be > 0".into());
    }

    if config.publisher.interval_secs == 0 {
        issues.push("publisher.interval_secs must be > 0".into());
    }
    if config.publisher.client_id.trim().is_empty() {
        issues.push("publisher.client_id must not be empty".into());
    }

    if config.cities.is_empty() {
        issues.push("cities must contain at least one city".into());
    }
    let mut seen = HashSet::new();
    for city in &config.cities {
        if !seen.insert(city.name.as_str()) {
            issues.push(format!("duplicate city: {}", city.name));
        }
        if !(-90.0..=90.0).contains(&city.lat) || !(-180.0..=180.0).contains(&city.lon) {
            issues.push(format!("city {} has out-of-range coordinates", city.name));
        }
    }
    if !config.cities.is_empty() && config.find_city(&config.default_city).is_none() {
        issues.push(format!(
            "default_city {} is not in cities",
            config.default_city
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply environment overrides, reading variables through `var`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, var: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var("WEATHER_BIND_ADDR") {
        config.server.bind_addr = parse_non_empty(&raw, "WEATHER_BIND_ADDR")?;
    }
    if let Some(raw) = var("MQTT_HOST") {
        config.mqtt.host = parse_non_empty(&raw, "MQTT_HOST")?;
    }
    if let Some(raw) = var("MQTT_PORT") {
        config.mqtt.port = raw
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| Error::Config("MQTT_PORT must be a port number > 0".into()))?;
    }
    if let Some(raw) = var("MQTT_TOPIC") {
        config.mqtt.topic = parse_non_empty(&raw, "MQTT_TOPIC")?;
    }
    if let Some(raw) = var("MQTT_CLIENT_ID") {
        config.mqtt.client_id = parse_non_empty(&raw, "MQTT_CLIENT_ID")?;
    }
    if let Some(raw) = var("HISTORY_CAPACITY") {
        let capacity = parse_positive_u64(&raw, "HISTORY_CAPACITY")?;
        config.history.capacity = usize::try_from(capacity)
            .map_err(|_| Error::Config("HISTORY_CAPACITY is too large".into()))?;
    }
    if let Some(raw) = var("OPEN_METEO_URL") {
        config.upstream.base_url = parse_non_empty(&raw, "OPEN_METEO_URL")?;
    }
    if let Some(raw) = var("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse_positive_u64(&raw, "UPSTREAM_TIMEOUT_SECS")?;
    }
    if let Some(raw) = var("PUBLISH_CITY") {
        config.publisher.city = parse_non_empty(&raw, "PUBLISH_CITY")?;
    }
    if let Some(raw) = var("PUBLISH_INTERVAL_SECS") {
        config.publisher.interval_secs = parse_positive_u64(&raw, "PUBLISH_INTERVAL_SECS")?;
    }
    Ok(())
}

/// Load configuration from defaults, an optional TOML file and the environment.
///
/// An explicitly passed `path` must exist; otherwise `config.toml` in the
/// working directory is used when present.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = AppConfig::default();

    // 3. Try loading the config file.
    let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if path.is_some() || config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}
