//! Presentation components.
//!
//! UI-toolkit-neutral screens for each sensor module. A screen is started
//! when it becomes visible and stopped when it goes away; in between it
//! receives live readings from the board session and exposes a render
//! state any front end can draw.

pub mod chart;
pub mod gauge;
pub mod module;
pub mod puppet;
pub mod screens;

pub use chart::{ChartPanel, ChartPoint, DEFAULT_CHART_WINDOW, DEFAULT_VISIBLE_INTERVAL};
pub use gauge::{FillIndicator, GaugeScale, LevelFill, LevelMeter, NeedleGauge, NeedlePosition};
pub use module::{ModuleScreen, SensorView};
pub use puppet::{PuppetAnimation, PuppetScreen, PuppetState, PuppetView};
pub use screens::{
    AccelerometerState, AccelerometerView, ButtonChanges, ButtonsView, ButtonsViewState,
    HumidityState, HumidityView, LightState, LightView, PressureState, PressureView,
    QuaternionState, QuaternionView, SoundState, SoundView, TemperatureState, TemperatureUnit,
    TemperatureView,
};

/// Barometer screen.
pub type PressureScreen = ModuleScreen<PressureView>;
/// Sound screen.
pub type SoundScreen = ModuleScreen<SoundView>;
/// Light screen.
pub type LightScreen = ModuleScreen<LightView>;
/// Thermometer screen.
pub type TemperatureScreen = ModuleScreen<TemperatureView>;
/// Humidity screen.
pub type HumidityScreen = ModuleScreen<HumidityView>;
/// Buttons screen.
pub type ButtonsScreen = ModuleScreen<ButtonsView>;
/// Accelerometer orientation screen.
pub type AccelerometerScreen = ModuleScreen<AccelerometerView>;
/// Quaternion orientation screen.
pub type QuaternionScreen = ModuleScreen<QuaternionView>;
