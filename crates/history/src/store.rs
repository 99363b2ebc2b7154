//! Shared feed store holding the current snapshot and the history window.
//!
//! One write lock covers both halves, so a reader never sees a new
//! snapshot paired with stale history or the other way round.

use std::sync::Arc;

use common::{Error, HistoryData, Reading, WindowStats};
use tokio::sync::RwLock;
use tracing::debug;

use crate::normalize::normalize_payload;
use crate::stats::compute_stats;
use crate::window::HistoryWindow;

#[derive(Debug)]
struct StoreState {
    current: Option<Reading>,
    window: HistoryWindow,
}

/// Cloneable handle to the feed's in-memory state.
#[derive(Debug, Clone)]
pub struct WeatherStore {
    inner: Arc<RwLock<StoreState>>,
}

impl WeatherStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreState {
                current: None,
                window: HistoryWindow::new(capacity),
            })),
        }
    }

    /// Replace the current snapshot and append to history in one step.
    pub async fn record(&self, reading: Reading) {
        let mut state = self.inner.write().await;
        state.window.record(reading.clone());
        state.current = Some(reading);
        debug!("Recorded reading; window holds {}", state.window.len());
    }

    /// Normalize a raw feed payload and record it.
    ///
    /// Malformed payloads return an error and leave the store untouched.
    pub async fn ingest(&self, payload: &[u8], received_at: String) -> Result<Reading, Error> {
        let reading = normalize_payload(payload, received_at)?;
        self.record(reading.clone()).await;
        Ok(reading)
    }

    pub async fn current(&self) -> Option<Reading> {
        self.inner.read().await.current.clone()
    }

    pub async fn history(&self, limit: Option<i64>) -> HistoryData {
        self.inner.read().await.window.snapshot(limit)
    }

    pub async fn stats(&self) -> Result<WindowStats, Error> {
        compute_stats(&self.inner.read().await.window)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.window.len()
    }
}
