//! Fixed-capacity FIFO of readings.
//!
//! Readings are kept as whole records in one deque, so the parallel
//! arrays handed out by `snapshot` can never differ in length.

use std::collections::VecDeque;

use common::{HistoryData, Reading};

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Build a window of `capacity` from readings in arrival order.
    pub fn from_readings<I>(capacity: usize, readings: I) -> Self
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut window = Self::new(capacity);
        for reading in readings {
            window.record(reading);
        }
        window
    }

    /// Append a reading, evicting the oldest once capacity is exceeded.
    pub fn record(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }

    /// Last `min(limit, len)` readings as parallel arrays, oldest first.
    ///
    /// `None` means the full capacity. Non-positive limits yield an empty
    /// result.
    pub fn snapshot(&self, limit: Option<i64>) -> HistoryData {
        let limit = match limit {
            Some(l) if l <= 0 => return HistoryData::default(),
            Some(l) => usize::try_from(l).unwrap_or(usize::MAX),
            None => self.capacity,
        };

        let take = limit.min(self.readings.len());
        let skip = self.readings.len() - take;

        let mut data = HistoryData {
            temperature: Vec::with_capacity(take),
            humidity: Vec::with_capacity(take),
            wind_speed: Vec::with_capacity(take),
            timestamps: Vec::with_capacity(take),
        };
        for reading in self.readings.iter().skip(skip) {
            data.temperature.push(reading.temperature);
            data.humidity.push(reading.humidity);
            data.wind_speed.push(reading.wind_speed);
            data.timestamps.push(reading.timestamp.clone());
        }
        data
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
