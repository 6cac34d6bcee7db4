//! Sensor data series.
//!
//! A bounded, timestamped history of readings for one sensor. The board
//! session owns each series; chart panels observe them.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Default number of entries kept per series.
pub const DEFAULT_SERIES_CAPACITY: usize = 1000;

/// A single recorded reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesEntry<T> {
    /// The recorded value.
    pub value: T,
    /// When the value was received.
    pub timestamp: DateTime<Utc>,
}

impl<T> SeriesEntry<T> {
    /// Create an entry stamped with the current time.
    pub fn now(value: T) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
        }
    }
}

struct SeriesState<T> {
    entries: VecDeque<SeriesEntry<T>>,
    /// Total entries ever appended (never decreases).
    appended: u64,
    /// Incremented every time the series is cleared.
    generation: u64,
}

/// Ring buffer of timestamped readings.
///
/// When full, appending evicts the oldest entry. Index 0 is always the
/// oldest entry still held.
pub struct SensorDataSeries<T> {
    state: RwLock<SeriesState<T>>,
    capacity: usize,
}

impl<T: Clone> SensorDataSeries<T> {
    /// Create a series with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SERIES_CAPACITY)
    }

    /// Create a series holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: RwLock::new(SeriesState {
                entries: VecDeque::with_capacity(capacity),
                appended: 0,
                generation: 0,
            }),
            capacity,
        }
    }

    /// Append a value stamped with the current time.
    ///
    /// Returns the new append count.
    pub fn push(&self, value: T) -> u64 {
        self.push_entry(SeriesEntry::now(value))
    }

    /// Append a pre-stamped entry.
    pub fn push_entry(&self, entry: SeriesEntry<T>) -> u64 {
        let mut state = self.state.write();
        if state.entries.len() == self.capacity {
            state.entries.pop_front();
        }
        state.entries.push_back(entry);
        state.appended += 1;
        state.appended
    }

    /// Get the entry at `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<SeriesEntry<T>> {
        self.state.read().entries.get(index).cloned()
    }

    /// Oldest entry held.
    pub fn first(&self) -> Option<SeriesEntry<T>> {
        self.state.read().entries.front().cloned()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<SeriesEntry<T>> {
        self.state.read().entries.back().cloned()
    }

    /// Most recent entry together with the append count it corresponds to.
    pub fn last_with_count(&self) -> Option<(SeriesEntry<T>, u64)> {
        let state = self.state.read();
        state.entries.back().cloned().map(|e| (e, state.appended))
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Check if the series holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Maximum number of entries held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries ever appended, including evicted ones.
    pub fn appended_count(&self) -> u64 {
        self.state.read().appended
    }

    /// Number of times the series has been cleared.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Snapshot of all entries held, oldest first, with the append count
    /// and generation at the time of the snapshot.
    pub fn snapshot(&self) -> (Vec<SeriesEntry<T>>, u64, u64) {
        let state = self.state.read();
        (
            state.entries.iter().cloned().collect(),
            state.appended,
            state.generation,
        )
    }

    /// All entries held, oldest first.
    pub fn to_vec(&self) -> Vec<SeriesEntry<T>> {
        self.state.read().entries.iter().cloned().collect()
    }

    /// Entries appended after the append count `since`, oldest first.
    ///
    /// Entries already evicted are not returned.
    pub fn entries_since(&self, since: u64) -> Vec<SeriesEntry<T>> {
        let state = self.state.read();
        let missing = state.appended.saturating_sub(since) as usize;
        let skip = state.entries.len().saturating_sub(missing);
        state.entries.iter().skip(skip).cloned().collect()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.generation += 1;
    }
}

impl<T: Clone> Default for SensorDataSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SensorDataSeries<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SensorDataSeries")
            .field("len", &state.entries.len())
            .field("capacity", &self.capacity)
            .field("appended", &state.appended)
            .finish()
    }
}
