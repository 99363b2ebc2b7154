//! Weather publisher.
//!
//! Periodically fetches current conditions for one city from Open-Meteo and
//! publishes them as a JSON `Reading` on the feed topic, so a feed-mode
//! dashboard has something to show without dedicated sensors.

use std::time::Duration;

use common::config::{AppConfig, CityConfig};
use common::{now_iso, Error, Reading};
use open_meteo_client::OpenMeteoClient;
use rumqttc::{AsyncClient, EventLoop, QoS};
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::feed::{mqtt_options, Backoff, CLIENT_QUEUE};

/// City to publish; an unknown configured city falls back to the default.
fn publish_city(config: &AppConfig) -> Result<&CityConfig, Error> {
    if let Some(city) = config.find_city(&config.publisher.city) {
        return Ok(city);
    }
    warn!(
        "City {} not found, using default: {}",
        config.publisher.city, config.default_city
    );
    config
        .find_city(&config.default_city)
        .ok_or_else(|| Error::UnknownCity(config.default_city.clone()))
}

/// Reading published when the upstream call fails.
fn placeholder_reading(timestamp: String) -> Reading {
    Reading {
        temperature: 20.0,
        humidity: 50.0,
        wind_speed: 0.0,
        wind_direction: 0.0,
        timestamp,
    }
}

async fn next_reading(client: &OpenMeteoClient, city: &CityConfig) -> Reading {
    match client.fetch_current(city).await {
        Ok(reading) => Reading {
            timestamp: now_iso(),
            ..reading
        },
        Err(e) => {
            error!("Error fetching weather data for {}: {}", city.name, e);
            placeholder_reading(now_iso())
        }
    }
}

/// Queue a reading for the broker without waiting.
///
/// While the broker is down the client queue fills up; further readings are
/// rejected with an error instead of blocking the publish loop.
fn publish_reading(
    client: &AsyncClient,
    topic: &str,
    city: &str,
    reading: &Reading,
) -> Result<(), Error> {
    let payload = serde_json::to_vec(reading)?;
    client
        .try_publish(topic, QoS::AtMostOnce, false, payload)
        .map_err(|e| Error::Mqtt(format!("failed to publish message: {e}")))?;

    info!(
        "Published [{}]: temp={:.2}°C humidity={:.2}% wind={:.2}km/h @ {:.2}°",
        city, reading.temperature, reading.humidity, reading.wind_speed, reading.wind_direction
    );
    Ok(())
}

/// Keep the MQTT connection alive; rumqttc reconnects on the next poll.
async fn drive_eventloop(mut eventloop: EventLoop) {
    let mut backoff = Backoff::new();
    loop {
        match eventloop.poll().await {
            Ok(event) => {
                debug!("MQTT event: {:?}", event);
                backoff.reset();
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("MQTT connection lost: {}. Reconnecting in {:?}", e, delay);
                sleep(delay).await;
            }
        }
    }
}

/// Run the publisher until Ctrl+C.
pub async fn run_publisher(config: &AppConfig) -> Result<(), Error> {
    let city = publish_city(config)?;
    let weather = OpenMeteoClient::new(
        config.upstream.base_url.clone(),
        Duration::from_secs(config.upstream.timeout_secs),
    )?;

    let (client, eventloop) = AsyncClient::new(
        mqtt_options(&config.mqtt, &config.publisher.client_id),
        CLIENT_QUEUE,
    );
    let eventloop_handle = tokio::spawn(drive_eventloop(eventloop));

    let mut ticker = tokio::time::interval(Duration::from_secs(config.publisher.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Publishing {} to {} every {}s",
        city.name, config.mqtt.topic, config.publisher.interval_secs
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reading = next_reading(&weather, city).await;
                if let Err(e) = publish_reading(&client, &config.mqtt.topic, &city.name, &reading) {
                    warn!("Dropping reading for {}: {}", city.name, e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Err(e) = client.try_disconnect() {
        warn!("MQTT disconnect failed: {}", e);
    }
    // Let the event loop flush the DISCONNECT packet.
    sleep(Duration::from_millis(250)).await;
    eventloop_handle.abort();
    info!("Disconnected from MQTT broker");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_city_uses_configured_city() {
        let mut config = AppConfig::default();
        config.publisher.city = "Frankfurt".into();
        assert_eq!(publish_city(&config).expect("city").name, "Frankfurt");
    }

    #[test]
    fn test_publish_city_falls_back_to_default() {
        let mut config = AppConfig::default();
        config.publisher.city = "Gotham".into();
        assert_eq!(publish_city(&config).expect("city").name, "Tokyo");
    }

    #[test]
    fn test_placeholder_reading_round_trips_as_feed_payload() {
        let reading = placeholder_reading("2026-01-01T00:00:00.000Z".into());
        let payload = serde_json::to_vec(&reading).expect("serialize");
        let parsed = history::normalize_payload(&payload, reading.timestamp.clone())
            .expect("feed accepts published payloads");
        assert_eq!(parsed, reading);
    }

    #[tokio::test]
    async fn test_publish_never_blocks_while_broker_is_down() {
        let mqtt = common::config::MqttConfig {
            host: "127.0.0.1".into(),
            port: 9,
            ..Default::default()
        };
        let (client, eventloop) =
            AsyncClient::new(mqtt_options(&mqtt, "publisher-test"), CLIENT_QUEUE);
        let eventloop_handle = tokio::spawn(drive_eventloop(eventloop));
        let reading = placeholder_reading("2026-01-01T00:00:00.000Z".into());

        // Give the event loop a chance to fail its first connect.
        sleep(Duration::from_millis(50)).await;

        let queued = (0..CLIENT_QUEUE + 5)
            .filter(|_| publish_reading(&client, &mqtt.topic, "Tokyo", &reading).is_ok())
            .count();
        assert!(queued <= CLIENT_QUEUE);
        assert!(publish_reading(&client, &mqtt.topic, "Tokyo", &reading).is_err());

        // Shutdown must not wait on the full queue either.
        let _ = client.try_disconnect();
        eventloop_handle.abort();
    }

    #[tokio::test]
    async fn test_unreachable_upstream_yields_placeholder() {
        let client = OpenMeteoClient::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client");
        let city = CityConfig {
            name: "Tokyo".into(),
            lat: 35.6895,
            lon: 139.6917,
        };
        let reading = next_reading(&client, &city).await;
        assert_eq!(reading.temperature, 20.0);
        assert_eq!(reading.humidity, 50.0);
    }
}
