//! Per-sensor value hub.
//!
//! A [`SensorChannel`] caches the last reading of one sensor, records a
//! series, and fans readings out to the live-update owner, observers and
//! async subscribers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::data::SensorDataSeries;
use crate::error::Result;
use crate::observers::{CallbackHandle, LiveSlot, ObserverList};
use crate::sensor::SensorKind;

/// Maps a reading to the value stored in the series. `None` skips it.
pub type SeriesMapper<T, S> = fn(&T) -> Option<S>;

/// Last value, series and registrations for one sensor.
///
/// `T` is the reading type and `S` the type recorded in the series.
pub struct SensorChannel<T, S = T> {
    kind: SensorKind,
    last: RwLock<Option<(T, DateTime<Utc>)>>,
    series: Arc<SensorDataSeries<S>>,
    recording: AtomicBool,
    to_series: SeriesMapper<T, S>,
    live: LiveSlot<T>,
    observers: ObserverList<T>,
    tx: broadcast::Sender<T>,
}

impl<T> SensorChannel<T, T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a channel that records readings as they are.
    pub fn new(kind: SensorKind, capacity: usize, recording: bool) -> Self {
        Self::with_mapper(kind, capacity, recording, |v| Some(v.clone()))
    }
}

impl<T, S> SensorChannel<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Clone,
{
    /// Create a channel that records `to_series(reading)`.
    pub fn with_mapper(
        kind: SensorKind,
        capacity: usize,
        recording: bool,
        to_series: SeriesMapper<T, S>,
    ) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            kind,
            last: RwLock::new(None),
            series: Arc::new(SensorDataSeries::with_capacity(capacity)),
            recording: AtomicBool::new(recording),
            to_series,
            live: LiveSlot::new(kind),
            observers: ObserverList::new(),
            tx,
        }
    }

    /// The sensor this channel carries.
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Most recent reading.
    pub fn last_value(&self) -> Option<T> {
        self.last.read().as_ref().map(|(v, _)| v.clone())
    }

    /// When the most recent reading arrived.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last.read().as_ref().map(|(_, t)| *t)
    }

    /// Recorded series, shared with any chart observing it.
    pub fn series(&self) -> Arc<SensorDataSeries<S>> {
        self.series.clone()
    }

    /// Check if readings are being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Turn series recording on or off.
    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::SeqCst);
    }

    /// Claim live updates for this sensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LiveSlotOccupied`](crate::Error::LiveSlotOccupied)
    /// if another registrant holds the slot.
    pub fn claim_live<F>(&self, callback: F) -> Result<CallbackHandle>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.live.claim(callback)
    }

    /// Claim live updates, revoking the current owner.
    pub fn take_over_live<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.live.take_over(callback)
    }

    /// Check if live updates are claimed.
    pub fn has_live_owner(&self) -> bool {
        self.live.is_claimed()
    }

    /// Id of the live-update owner.
    pub fn live_owner(&self) -> Option<u64> {
        self.live.owner()
    }

    /// Register an additional observer.
    pub fn observe<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.observers.observe(callback)
    }

    /// Receive readings asynchronously.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Publish a reading.
    ///
    /// Updates the last value and series, then delivers to the live owner,
    /// the observers and the async subscribers, in that order.
    pub fn publish(&self, value: T) {
        *self.last.write() = Some((value.clone(), Utc::now()));

        if self.is_recording() {
            if let Some(entry) = (self.to_series)(&value) {
                self.series.push(entry);
            }
        }

        let delivered = self.live.deliver(&value);
        if !delivered {
            trace!("No live owner for {}, update dropped", self.kind);
        }
        self.observers.notify(&value);
        let _ = self.tx.send(value);
    }

    /// Forget the last value and clear the series.
    pub fn reset(&self) {
        *self.last.write() = None;
        self.series.clear();
    }
}

impl<T, S> std::fmt::Debug for SensorChannel<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorChannel")
            .field("kind", &self.kind)
            .field("recording", &self.recording.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_publish_updates_last_and_series() {
        let channel: SensorChannel<f32> = SensorChannel::new(SensorKind::Light, 10, true);
        assert!(channel.last_value().is_none());

        channel.publish(120.0);
        channel.publish(130.0);

        assert_eq!(channel.last_value(), Some(130.0));
        assert!(channel.last_updated().is_some());
        assert_eq!(channel.series().len(), 2);
    }

    #[test]
    fn test_recording_disabled() {
        let channel: SensorChannel<f32> = SensorChannel::new(SensorKind::Light, 10, false);
        channel.publish(1.0);
        assert_eq!(channel.last_value(), Some(1.0));
        assert!(channel.series().is_empty());

        channel.set_recording(true);
        channel.publish(2.0);
        assert_eq!(channel.series().len(), 1);
    }

    #[test]
    fn test_mapper_skips() {
        let channel: SensorChannel<f64, f32> =
            SensorChannel::with_mapper(SensorKind::Sound, 10, true, |v| {
                v.is_finite().then_some(*v as f32)
            });
        channel.publish(-30.0);
        channel.publish(f64::NEG_INFINITY);
        channel.publish(f64::NAN);
        assert_eq!(channel.series().len(), 1);
        assert!(channel.last_value().map(f64::is_nan).unwrap_or(false));
    }

    #[test]
    fn test_series_updated_before_live_delivery() {
        let channel = Arc::new(SensorChannel::<f32>::new(SensorKind::BarometricPressure, 10, true));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let series = channel.series();
        let sink = seen.clone();
        let _handle = channel.claim_live(move |v: &f32| {
            let last = series.last().map(|e| e.value);
            sink.lock().push((*v, last));
        });

        channel.publish(1001.0);
        assert_eq!(*seen.lock(), vec![(1001.0, Some(1001.0))]);
    }

    #[tokio::test]
    async fn test_broadcast_subscribers() {
        let channel: SensorChannel<f32> = SensorChannel::new(SensorKind::Temperature, 10, true);
        let mut rx = channel.subscribe();
        channel.publish(22.5);
        assert_eq!(rx.recv().await.ok(), Some(22.5));
    }

    #[test]
    fn test_reset() {
        let channel: SensorChannel<f32> = SensorChannel::new(SensorKind::Humidity, 10, true);
        channel.publish(45.0);
        channel.reset();
        assert!(channel.last_value().is_none());
        assert!(channel.series().is_empty());
    }
}
