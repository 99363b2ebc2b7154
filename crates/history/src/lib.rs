//! Sliding-window history crate.
//!
//! Normalizes raw payloads into readings, keeps a bounded FIFO window of
//! them, and computes current/min/max/avg statistics on demand.

pub mod normalize;
pub mod stats;
pub mod store;
pub mod window;

pub use normalize::{normalize_object, normalize_payload, FieldNames};
pub use stats::compute_stats;
pub use store::WeatherStore;
pub use window::HistoryWindow;
