//! MQTT feed ingestion.
//!
//! The broker event loop runs on its own task and forwards raw payloads over
//! a bounded channel; a separate consumer task normalizes them into the
//! shared store. A bad message is logged and dropped without touching the
//! subscription.

use std::time::Duration;

use common::config::MqttConfig;
use common::now_iso;
use history::WeatherStore;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Requests rumqttc buffers before the event loop drains them.
pub(crate) const CLIENT_QUEUE: usize = 10;

/// Reconnect delay shared by the feed subscriber and the publisher:
/// doubles from 1s up to a 60s cap.
#[derive(Debug)]
pub(crate) struct Backoff {
    current: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }

    /// Delay to wait now; the following call waits twice as long.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

/// What the subscriber does with one event from the broker.
#[derive(Debug, PartialEq)]
enum FeedAction {
    Subscribe,
    Forward(Vec<u8>),
    Ignore,
}

fn on_event(event: &Event, topic: &str) -> FeedAction {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => FeedAction::Subscribe,
        Event::Incoming(Packet::Publish(publish)) if publish.topic == topic => {
            FeedAction::Forward(publish.payload.to_vec())
        }
        Event::Incoming(Packet::Publish(publish)) => {
            debug!("Ignoring message on topic {}", publish.topic);
            FeedAction::Ignore
        }
        _ => FeedAction::Ignore,
    }
}

/// Handles of the two feed tasks.
pub struct FeedHandles {
    pub subscriber: JoinHandle<()>,
    pub consumer: JoinHandle<()>,
}

pub fn mqtt_options(config: &MqttConfig, client_id: &str) -> MqttOptions {
    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    options
}

/// Spawn the subscriber and consumer tasks feeding `store`.
pub fn spawn_feed(config: &MqttConfig, store: WeatherStore) -> FeedHandles {
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let (client, eventloop) = AsyncClient::new(mqtt_options(config, &config.client_id), CLIENT_QUEUE);

    let topic = config.topic.clone();
    let subscriber = tokio::spawn(async move {
        run_subscriber(client, eventloop, topic, tx).await;
    });
    let consumer = tokio::spawn(async move {
        run_consumer(rx, store).await;
    });

    FeedHandles {
        subscriber,
        consumer,
    }
}

/// Drive the MQTT event loop, reconnecting with backoff on transport errors.
///
/// The subscription is reissued on every ConnAck, so it survives reconnects.
/// Returns once the consumer side of `tx` is gone.
async fn run_subscriber(
    client: AsyncClient,
    mut eventloop: EventLoop,
    topic: String,
    tx: mpsc::Sender<Vec<u8>>,
) {
    let mut backoff = Backoff::new();

    loop {
        let event = match eventloop.poll().await {
            Ok(event) => event,
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("MQTT connection error: {}. Reconnecting in {:?}", e, delay);
                sleep(delay).await;
                continue;
            }
        };

        match on_event(&event, &topic) {
            FeedAction::Subscribe => {
                info!("Connected to MQTT broker");
                backoff.reset();
                match client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                    Ok(()) => info!("Subscribed to topic: {}", topic),
                    Err(e) => error!("Failed to subscribe to {}: {}", topic, e),
                }
            }
            FeedAction::Forward(payload) => {
                if !forward(&tx, payload).await {
                    warn!("Feed consumer stopped; closing MQTT subscriber");
                    return;
                }
            }
            FeedAction::Ignore => {}
        }
    }
}

/// Hand a payload to the consumer; `false` once the consumer is gone.
async fn forward(tx: &mpsc::Sender<Vec<u8>>, payload: Vec<u8>) -> bool {
    tx.send(payload).await.is_ok()
}

/// Normalize and record every payload until the channel closes.
pub async fn run_consumer(mut rx: mpsc::Receiver<Vec<u8>>, store: WeatherStore) {
    while let Some(payload) = rx.recv().await {
        match store.ingest(&payload, now_iso()).await {
            Ok(reading) => info!(
                "Weather data updated: temp={:.1}°C humidity={:.0}% wind={:.1}km/h (window={})",
                reading.temperature,
                reading.humidity,
                reading.wind_speed,
                store.len().await
            ),
            Err(e) => error!("Error processing MQTT message: {}", e),
        }
    }
    debug!("Feed channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, ConnectReturnCode, Outgoing, Publish};

    #[tokio::test]
    async fn test_consumer_skips_bad_messages_and_keeps_going() {
        let store = WeatherStore::new(100);
        let (tx, rx) = mpsc::channel(8);
        let consumer = tokio::spawn(run_consumer(rx, store.clone()));

        tx.send(br#"{"temperature": 20.5, "humidity": 40}"#.to_vec())
            .await
            .expect("send");
        tx.send(b"garbage".to_vec()).await.expect("send");
        tx.send(br#"{"temperature": 22.0, "wind_speed": 8}"#.to_vec())
            .await
            .expect("send");
        drop(tx);
        consumer.await.expect("consumer finished");

        let history = store.history(None).await;
        assert_eq!(history.temperature, vec![20.5, 22.0]);
        let current = store.current().await.expect("current set");
        assert_eq!(current.wind_speed, 8.0);
        assert_eq!(current.humidity, 0.0);
    }

    const TOPIC: &str = "weather/data";

    fn publish_on(topic: &str, payload: &[u8]) -> Event {
        Event::Incoming(Packet::Publish(Publish::new(
            topic,
            QoS::AtMostOnce,
            payload.to_vec(),
        )))
    }

    #[test]
    fn test_connack_triggers_subscribe() {
        let connack = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(on_event(&connack, TOPIC), FeedAction::Subscribe);
        // A second ConnAck after a reconnect subscribes again.
        assert_eq!(on_event(&connack, TOPIC), FeedAction::Subscribe);
    }

    #[test]
    fn test_publish_on_feed_topic_is_forwarded() {
        let event = publish_on(TOPIC, br#"{"temperature": 21.5}"#);
        assert_eq!(
            on_event(&event, TOPIC),
            FeedAction::Forward(br#"{"temperature": 21.5}"#.to_vec())
        );
    }

    #[test]
    fn test_foreign_topics_and_housekeeping_are_ignored() {
        let foreign = publish_on("weather/other", br#"{"temperature": 99}"#);
        assert_eq!(on_event(&foreign, TOPIC), FeedAction::Ignore);
        assert_eq!(
            on_event(&Event::Incoming(Packet::PingResp), TOPIC),
            FeedAction::Ignore
        );
        assert_eq!(
            on_event(&Event::Outgoing(Outgoing::PingReq), TOPIC),
            FeedAction::Ignore
        );
    }

    #[test]
    fn test_backoff_doubles_up_to_cap_and_resets() {
        let mut backoff = Backoff::new();
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_forward_stops_once_consumer_is_gone() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(forward(&tx, b"first".to_vec()).await);
        assert_eq!(rx.recv().await, Some(b"first".to_vec()));

        drop(rx);
        assert!(!forward(&tx, b"second".to_vec()).await);
    }

    #[test]
    fn test_mqtt_options_use_config() {
        let config = MqttConfig::default();
        let options = mqtt_options(&config, "test-client");
        assert_eq!(options.client_id(), "test-client");
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }
}
