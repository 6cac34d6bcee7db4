//! Chart panels.
//!
//! A [`ChartPanel`] mirrors a board's series into a render buffer of
//! points. It observes the series and never writes to it.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::data::{SensorDataSeries, SeriesEntry};

/// Default number of points kept in the render buffer.
pub const DEFAULT_CHART_WINDOW: usize = 1000;

/// Default width of the visible x range.
pub const DEFAULT_VISIBLE_INTERVAL: Duration = Duration::from_secs(20);

/// A plotted point. `x` is seconds since the chart origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartPoint {
    /// Seconds since the origin.
    pub x: f64,
    /// Plotted value.
    pub y: f64,
}

/// Maps a recorded value to the plotted value.
pub type ValueTransform = fn(f32) -> f32;

fn identity(value: f32) -> f32 {
    value
}

/// Render buffer for one series.
pub struct ChartPanel {
    series: Arc<SensorDataSeries<f32>>,
    points: VecDeque<ChartPoint>,
    origin: DateTime<Utc>,
    synced_count: u64,
    synced_generation: u64,
    window: usize,
    visible_interval: Duration,
    transform: ValueTransform,
}

impl ChartPanel {
    /// Create a panel over `series`. Call [`reload`](Self::reload) to fill it.
    pub fn new(series: Arc<SensorDataSeries<f32>>) -> Self {
        Self {
            series,
            points: VecDeque::new(),
            origin: Utc::now(),
            synced_count: 0,
            synced_generation: 0,
            window: DEFAULT_CHART_WINDOW,
            visible_interval: DEFAULT_VISIBLE_INTERVAL,
            transform: identity,
        }
    }

    /// Keep at most `window` points (minimum 1).
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Set the width of the visible x range.
    pub fn with_visible_interval(mut self, interval: Duration) -> Self {
        self.visible_interval = interval;
        self
    }

    /// The observed series.
    pub fn series(&self) -> &Arc<SensorDataSeries<f32>> {
        &self.series
    }

    /// Change the value transform. Takes effect on the next reload.
    pub fn set_transform(&mut self, transform: ValueTransform) {
        self.transform = transform;
    }

    /// Rebuild the buffer from the whole series.
    ///
    /// The origin becomes the first entry's timestamp, or now if the series
    /// is empty.
    pub fn reload(&mut self) {
        let (entries, appended, generation) = self.series.snapshot();
        self.origin = entries.first().map(|e| e.timestamp).unwrap_or_else(Utc::now);

        let skip = entries.len().saturating_sub(self.window);
        self.points = entries
            .iter()
            .skip(skip)
            .map(|e| self.point(e))
            .collect();
        self.synced_count = appended;
        self.synced_generation = generation;
    }

    /// Append the series' last entry if the series grew since the last
    /// sync. Returns `true` if the buffer changed.
    ///
    /// A cleared series triggers a full reload.
    pub fn append_latest(&mut self) -> bool {
        if self.series.generation() != self.synced_generation {
            self.reload();
            return true;
        }

        let Some((entry, count)) = self.series.last_with_count() else {
            return false;
        };
        if count <= self.synced_count {
            return false;
        }

        let point = self.point(&entry);
        self.points.push_back(point);
        while self.points.len() > self.window {
            self.points.pop_front();
        }
        self.synced_count = count;
        true
    }

    /// Points in the buffer, oldest first.
    pub fn points(&self) -> Vec<ChartPoint> {
        self.points.iter().copied().collect()
    }

    /// Most recent point.
    pub fn last_point(&self) -> Option<ChartPoint> {
        self.points.back().copied()
    }

    /// Number of points in the buffer.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// X range that keeps the newest point in view.
    pub fn visible_range(&self) -> (f64, f64) {
        let width = self.visible_interval.as_secs_f64();
        let end = self.last_point().map(|p| p.x).unwrap_or(0.0).max(width);
        (end - width, end)
    }

    fn point(&self, entry: &SeriesEntry<f32>) -> ChartPoint {
        let elapsed = (entry.timestamp - self.origin)
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or(0.0);
        ChartPoint {
            x: elapsed,
            y: f64::from((self.transform)(entry.value)),
        }
    }
}

impl std::fmt::Debug for ChartPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartPanel")
            .field("points", &self.points.len())
            .field("synced_count", &self.synced_count)
            .field("window", &self.window)
            .finish()
    }
}
