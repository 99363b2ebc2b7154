//! Statistics over a history window.

use common::{Error, Stat, WindowStats};

use crate::window::HistoryWindow;

/// Summarize a series; `None` when it is empty.
fn summarize<I>(values: I) -> Option<Stat>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut current = None;

    for v in values {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
        current = Some(v);
    }

    Some(Stat {
        current: current?,
        min,
        max,
        avg: sum / count as f64,
    })
}

/// Compute per-metric current/min/max/avg over every retained reading.
///
/// An empty window is `Error::NoDataAvailable`, never a zero-filled result.
pub fn compute_stats(window: &HistoryWindow) -> Result<WindowStats, Error> {
    if window.is_empty() {
        return Err(Error::NoDataAvailable);
    }

    let temperature = summarize(window.iter().map(|r| r.temperature));
    let humidity = summarize(window.iter().map(|r| r.humidity));
    let wind_speed = summarize(window.iter().map(|r| r.wind_speed));

    match (temperature, humidity, wind_speed) {
        (Some(temperature), Some(humidity), Some(wind_speed)) => Ok(WindowStats {
            temperature,
            humidity,
            wind_speed,
        }),
        _ => Err(Error::NoDataAvailable),
    }
}
