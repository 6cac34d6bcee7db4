//! Board session configuration.

use std::collections::HashSet;
use std::time::Duration;

use crate::ble::connection::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};
use crate::data::DEFAULT_SERIES_CAPACITY;
use crate::sensor::{BoardService, SensorKind, DEFAULT_SENSOR_PERIOD};

/// Default time without data before a board is considered stale.
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default NeoPixel brightness.
pub const DEFAULT_NEOPIXEL_BRIGHTNESS: f32 = 0.25;

/// Configuration for a board session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardConfig {
    /// Services to enable on connect, in order.
    pub services: Vec<BoardService>,
    /// Sensors whose readings are recorded in a series.
    pub recorded_sensors: HashSet<SensorKind>,
    /// Entries kept per series.
    pub series_capacity: usize,
    /// Measurement period requested for periodic sensors.
    pub sensor_period: Duration,
    /// Negate accelerometer x and z on boards that need it.
    pub auto_adjust_accelerometer: bool,
    /// Rotate the quaternion half a turn about y on boards that need it.
    pub auto_adjust_quaternion: bool,
    /// Time without data before the board is stale.
    pub stale_timeout: Duration,
    /// Connection attempts before giving up.
    pub reconnect_attempts: u32,
    /// Delay between connection attempts.
    pub reconnect_delay: Duration,
    /// Reconnect automatically after a link loss.
    pub maintain_connection: bool,
    /// Brightness applied to NeoPixel colors (`0.0..=1.0`).
    pub neopixel_brightness: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            services: BoardService::ALL.to_vec(),
            recorded_sensors: [
                SensorKind::Light,
                SensorKind::Temperature,
                SensorKind::Humidity,
                SensorKind::BarometricPressure,
                SensorKind::Sound,
            ]
            .into_iter()
            .collect(),
            series_capacity: DEFAULT_SERIES_CAPACITY,
            sensor_period: DEFAULT_SENSOR_PERIOD,
            auto_adjust_accelerometer: true,
            auto_adjust_quaternion: true,
            stale_timeout: DEFAULT_STALE_TIMEOUT,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            maintain_connection: true,
            neopixel_brightness: DEFAULT_NEOPIXEL_BRIGHTNESS,
        }
    }
}

impl BoardConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable only these services.
    pub fn with_services(mut self, services: impl IntoIterator<Item = BoardService>) -> Self {
        self.services = services.into_iter().collect();
        self
    }

    /// Turn series recording on or off for one sensor.
    pub fn with_recording(mut self, sensor: SensorKind, enabled: bool) -> Self {
        if enabled {
            self.recorded_sensors.insert(sensor);
        } else {
            self.recorded_sensors.remove(&sensor);
        }
        self
    }

    /// Set the number of entries kept per series.
    pub fn with_series_capacity(mut self, capacity: usize) -> Self {
        self.series_capacity = capacity.max(1);
        self
    }

    /// Set the measurement period for periodic sensors.
    pub fn with_sensor_period(mut self, period: Duration) -> Self {
        self.sensor_period = period;
        self
    }

    /// Turn both orientation adjustments on or off.
    pub fn with_orientation_adjustment(mut self, enabled: bool) -> Self {
        self.auto_adjust_accelerometer = enabled;
        self.auto_adjust_quaternion = enabled;
        self
    }

    /// Set the stale timeout.
    pub fn with_stale_timeout(mut self, timeout: Duration) -> Self {
        self.stale_timeout = timeout;
        self
    }

    /// Set the connection retry parameters.
    pub fn with_reconnect(mut self, attempts: u32, delay: Duration) -> Self {
        self.reconnect_attempts = attempts.max(1);
        self.reconnect_delay = delay;
        self
    }

    /// Set the NeoPixel brightness, clamped to `0.0..=1.0`.
    pub fn with_neopixel_brightness(mut self, brightness: f32) -> Self {
        self.neopixel_brightness = if brightness.is_nan() {
            DEFAULT_NEOPIXEL_BRIGHTNESS
        } else {
            brightness.clamp(0.0, 1.0)
        };
        self
    }

    /// Check if a sensor's readings are recorded.
    pub fn records(&self, sensor: SensorKind) -> bool {
        self.recorded_sensors.contains(&sensor)
    }

    /// Check if a service is enabled on connect.
    pub fn enables(&self, service: BoardService) -> bool {
        self.services.contains(&service)
    }

    /// Measurement period to request for a service, if it has one.
    pub fn period_for(&self, service: BoardService) -> Option<Duration> {
        service.default_period().map(|default| {
            if default == DEFAULT_SENSOR_PERIOD {
                self.sensor_period
            } else {
                default
            }
        })
    }
}
