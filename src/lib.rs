// Allow holding locks across await points - we use parking_lot which is designed for this
#![allow(clippy::await_holding_lock)]
// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # bluefruit-playground-ble
//!
//! A cross-platform Rust library for reading live sensor data from Adafruit
//! Bluefruit boards (Circuit Playground Bluefruit, CLUE, Feather nRF52840)
//! over Bluetooth Low Energy.
//!
//! ## Features
//!
//! - **Board Discovery**: Find nearby boards and identify their model
//! - **Live Sensors**: Pressure, sound, light, temperature, humidity,
//!   accelerometer, gyroscope, magnetometer, quaternion, color and buttons
//! - **Data Series**: Bounded timestamped history per sensor
//! - **Live Slots**: Checked single-owner live updates per sensor
//! - **Presentation**: Gauges, charts and module screens with explicit
//!   `start()`/`stop()` lifecycles
//! - **Outputs**: NeoPixels and tone generator
//! - **Simulation**: Drive a board session without hardware
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bluefruit_playground_ble::{BoardManager, PressureScreen, PressureView, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = BoardManager::new().await?;
//!     manager.start_scanning().await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!
//!     if let Some(board) = manager.nearest_board() {
//!         manager.start_board(board).await?;
//!     }
//!
//!     let screen = PressureScreen::for_current_board(&manager, PressureView::default());
//!     screen.start()?;
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     println!("Pressure: {} hPa", screen.render_state().label);
//!     screen.stop();
//!
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types and
//!   [`BoardConfig`]

// Public modules
pub mod ble;
pub mod board;
pub mod board_manager;
pub mod channel;
pub mod config;
pub mod data;
pub mod error;
pub mod observers;
pub mod presentation;
pub mod protocol;
pub mod sensor;
pub mod simulation;
pub mod utils;

// Re-exports for convenience
pub use board::{Board, DeviceInfo};
pub use board_manager::{BoardManager, MAX_BOARDS};
pub use channel::SensorChannel;
pub use config::BoardConfig;
pub use error::{Error, Result};
pub use observers::CallbackHandle;
pub use sensor::{BoardService, SensorKind, SensorReading, DEFAULT_SENSOR_PERIOD};
pub use simulation::SimulatedBoard;
pub use utils::{celsius_to_fahrenheit, clamp_unit, fahrenheit_to_celsius, format_reading};

// Re-export commonly used types from submodules
pub use ble::advertising::BoardModel;
pub use ble::connection::ConnectionState;
pub use data::{
    AccelerometerValue, ButtonState, ButtonsState, ColorValue, GyroscopeValue, MagnetometerValue,
    QuaternionValue, RgbColor, SensorDataSeries, SeriesEntry, SlideSwitch, SoundAmplitudes,
};
pub use presentation::{
    AccelerometerScreen, AccelerometerView, ButtonsScreen, ButtonsView, ChartPanel, GaugeScale,
    HumidityScreen, HumidityView, LevelMeter, LightScreen, LightView, ModuleScreen, NeedleGauge,
    PressureScreen, PressureView, PuppetScreen, QuaternionScreen, QuaternionView, SensorView,
    SoundScreen, SoundView, TemperatureScreen, TemperatureUnit, TemperatureView,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _ = std::any::TypeId::of::<BoardManager>();
        let _ = std::any::TypeId::of::<Board>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<SensorReading>();
        let _ = std::any::TypeId::of::<PressureScreen>();
        let _ = std::any::TypeId::of::<SimulatedBoard>();
    }

    #[test]
    fn test_temperature_conversion() {
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.001);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 0.001);
    }
}
