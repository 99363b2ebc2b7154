//! weather-dashboard: REST backend for a small weather dashboard.
//!
//! Single-binary Tokio application with three subcommands:
//! 1. `feed`: serve readings received on an MQTT topic
//! 2. `proxy`: serve per-city data fetched from Open-Meteo
//! 3. `publish`: publish Open-Meteo readings onto the MQTT topic

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use common::config::AppConfig;
use history::WeatherStore;
use open_meteo_client::OpenMeteoClient;
use tokio::net::TcpListener;
use tracing::{error, info};

use weather_dashboard::api::{self, FeedState, ProxyState};
use weather_dashboard::{config, feed, publisher};

/// Weather Dashboard backend
#[derive(Parser)]
#[command(name = "weather-dashboard", about = "Weather dashboard REST backend")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the latest readings received from the MQTT feed.
    Feed,
    /// Serve per-city weather fetched on demand from Open-Meteo.
    Proxy,
    /// Publish Open-Meteo readings onto the MQTT feed topic.
    Publish,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_dashboard=info,history=info,open_meteo_client=info,tower_http=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Feed => run_feed(cfg).await,
        Command::Proxy => run_proxy(cfg).await,
        Command::Publish => publisher::run_publisher(&cfg).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn bind(cfg: &AppConfig) -> Result<TcpListener, common::Error> {
    let listener = TcpListener::bind(&cfg.server.bind_addr).await?;
    info!("Starting HTTP server on http://{}", cfg.server.bind_addr);
    Ok(listener)
}

async fn run_feed(cfg: AppConfig) -> Result<(), common::Error> {
    info!("🌤️  Weather Dashboard (feed mode) starting up...");
    info!("MQTT broker: {}:{}", cfg.mqtt.host, cfg.mqtt.port);
    info!("MQTT topic: {}", cfg.mqtt.topic);
    info!("History capacity: {}", cfg.history.capacity);

    let store = WeatherStore::new(cfg.history.capacity);
    let handles = feed::spawn_feed(&cfg.mqtt, store.clone());

    let listener = bind(&cfg).await?;
    let app = api::feed_router(FeedState { store });

    tokio::select! {
        r = api::serve(listener, app) => r?,
        r = handles.subscriber => error!("MQTT subscriber task exited: {:?}", r),
        r = handles.consumer => error!("Feed consumer task exited: {:?}", r),
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    info!("Weather Dashboard shut down.");
    Ok(())
}

async fn run_proxy(cfg: AppConfig) -> Result<(), common::Error> {
    info!("🌤️  Weather Dashboard (proxy mode) starting up...");
    info!("Upstream: {} (timeout {}s)", cfg.upstream.base_url, cfg.upstream.timeout_secs);
    info!("Cities: {:?}", cfg.city_names());

    let client = OpenMeteoClient::new(
        cfg.upstream.base_url.clone(),
        Duration::from_secs(cfg.upstream.timeout_secs),
    )?;

    let listener = bind(&cfg).await?;
    let app = api::proxy_router(ProxyState {
        client,
        config: Arc::new(cfg),
    });

    tokio::select! {
        r = api::serve(listener, app) => r?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    info!("Weather Dashboard shut down.");
    Ok(())
}
