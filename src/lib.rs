//! Weather dashboard backend.
//!
//! Two serving modes share one query surface: `feed` relays readings from an
//! MQTT topic through a bounded history window, `proxy` answers per-city
//! requests from Open-Meteo. A `publish` mode feeds the topic from
//! Open-Meteo.

pub mod api;
pub mod config;
pub mod feed;
pub mod publisher;
