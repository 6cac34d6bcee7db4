//! Data structures for board readings.
//!
//! This module contains the sensor value types, the bounded data series
//! kept per sensor, and orientation helpers.

pub mod orientation;
pub mod series;
pub mod values;

pub use orientation::{EulerAngles, LowPassFilter};
pub use series::{SensorDataSeries, SeriesEntry, DEFAULT_SERIES_CAPACITY};
pub use values::{
    AccelerometerValue, ButtonState, ButtonsState, ColorValue, GyroscopeValue,
    MagnetometerValue, QuaternionValue, RgbColor, SlideSwitch, SoundAmplitudes,
};
