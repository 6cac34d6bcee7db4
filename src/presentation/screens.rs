//! Sensor views.

use std::sync::Arc;
use std::time::Duration;

use crate::board::Board;
use crate::channel::SensorChannel;
use crate::data::orientation::{euler_from_acceleration, quaternion_to_euler};
use crate::data::{
    AccelerometerValue, ButtonsState, EulerAngles, QuaternionValue, SensorDataSeries,
    SoundAmplitudes,
};
use crate::sensor::DEFAULT_SENSOR_PERIOD;
use crate::utils::{celsius_to_fahrenheit, format_reading};

use super::chart::ValueTransform;
use super::gauge::{FillIndicator, LevelFill, LevelMeter, NeedleGauge, NeedlePosition};
use super::module::{ModuleScreen, SensorView};

// === Pressure ===

/// Barometer render output.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureState {
    /// Value label, `"--"` without a reading.
    pub label: String,
    /// Needle pose.
    pub needle: NeedlePosition,
}

/// Barometric pressure dial with chart.
#[derive(Debug, Clone, Default)]
pub struct PressureView {
    pressure: Option<f32>,
}

impl SensorView for PressureView {
    type Value = f32;
    type Series = f32;
    type State = PressureState;

    fn channel(board: &Board) -> &SensorChannel<f32> {
        board.pressure()
    }

    fn chart_series(&self, board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        Some(board.pressure().series())
    }

    fn render(&mut self, value: Option<&f32>) {
        self.pressure = value.copied();
    }

    fn state(&self) -> PressureState {
        PressureState {
            label: format_reading(self.pressure, 0, ""),
            needle: NeedleGauge::PRESSURE.position(self.pressure),
        }
    }
}

// === Sound ===

/// Sound meter render output.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundState {
    /// Amplitude label in dBFS, `"--"` without a reading.
    pub label: String,
    /// Lit bars.
    pub meter: LevelFill,
}

/// Sound level bars with chart. Only the first channel is shown.
#[derive(Debug, Clone, Default)]
pub struct SoundView {
    amplitude: Option<f32>,
}

impl SensorView for SoundView {
    type Value = SoundAmplitudes;
    type Series = f32;
    type State = SoundState;

    fn channel(board: &Board) -> &SensorChannel<SoundAmplitudes, f32> {
        board.sound()
    }

    fn chart_series(&self, board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        Some(board.sound().series())
    }

    fn render(&mut self, value: Option<&SoundAmplitudes>) {
        self.amplitude = value.and_then(SoundAmplitudes::first).map(|a| a as f32);
    }

    fn state(&self) -> SoundState {
        SoundState {
            label: format_reading(self.amplitude, 0, ""),
            meter: LevelMeter::SOUND.fill(self.amplitude),
        }
    }
}

// === Light ===

/// Light bar render output.
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    /// Lux label, `"--"` without a reading.
    pub label: String,
    /// Bar fill.
    pub fill: f32,
}

/// Light scale with chart.
#[derive(Debug, Clone, Default)]
pub struct LightView {
    lux: Option<f32>,
}

impl SensorView for LightView {
    type Value = f32;
    type Series = f32;
    type State = LightState;

    fn channel(board: &Board) -> &SensorChannel<f32> {
        board.light()
    }

    fn chart_series(&self, board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        Some(board.light().series())
    }

    fn render(&mut self, value: Option<&f32>) {
        self.lux = value.copied();
    }

    fn state(&self) -> LightState {
        LightState {
            label: format_reading(self.lux, 0, ""),
            fill: FillIndicator::LIGHT.fill(self.lux),
        }
    }
}

// === Temperature ===

fn unchanged(celsius: f32) -> f32 {
    celsius
}

/// Display unit for temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Unit suffix.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Convert a Celsius reading to this unit.
    pub fn from_celsius(&self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    /// The other unit.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

/// Thermometer render output.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureState {
    /// Label with unit, `"--°F"` without a reading.
    pub label: String,
    /// Display unit.
    pub unit: TemperatureUnit,
    /// Reading in the display unit.
    pub value: Option<f32>,
}

/// Thermometer with chart.
#[derive(Debug, Clone, Default)]
pub struct TemperatureView {
    celsius: Option<f32>,
    unit: TemperatureUnit,
}

impl TemperatureView {
    /// Create a view showing `unit`.
    pub fn with_unit(unit: TemperatureUnit) -> Self {
        Self { celsius: None, unit }
    }

    /// Display unit.
    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }
}

impl SensorView for TemperatureView {
    type Value = f32;
    type Series = f32;
    type State = TemperatureState;

    fn channel(board: &Board) -> &SensorChannel<f32> {
        board.temperature()
    }

    fn chart_series(&self, board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        Some(board.temperature().series())
    }

    fn chart_transform(&self) -> ValueTransform {
        match self.unit {
            TemperatureUnit::Celsius => unchanged,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit,
        }
    }

    fn render(&mut self, value: Option<&f32>) {
        self.celsius = value.copied();
    }

    fn state(&self) -> TemperatureState {
        let value = self.celsius.map(|c| self.unit.from_celsius(c));
        TemperatureState {
            label: format_reading(value, 1, self.unit.symbol()),
            unit: self.unit,
            value,
        }
    }
}

impl ModuleScreen<TemperatureView> {
    /// Change the display unit and replot the chart.
    pub fn set_unit(&self, unit: TemperatureUnit) {
        self.update_view(|view| view.unit = unit);
    }

    /// Switch between Celsius and Fahrenheit.
    pub fn toggle_unit(&self) -> TemperatureUnit {
        let mut unit = TemperatureUnit::default();
        self.update_view(|view| {
            view.unit = view.unit.toggled();
            unit = view.unit;
        });
        unit
    }
}

// === Humidity ===

/// Humidity render output.
#[derive(Debug, Clone, PartialEq)]
pub struct HumidityState {
    /// Label, `"--%"` without a reading.
    pub label: String,
    /// Drop fill.
    pub fill: f32,
}

/// Humidity drop with chart.
#[derive(Debug, Clone, Default)]
pub struct HumidityView {
    humidity: Option<f32>,
}

impl SensorView for HumidityView {
    type Value = f32;
    type Series = f32;
    type State = HumidityState;

    fn channel(board: &Board) -> &SensorChannel<f32> {
        board.humidity()
    }

    fn chart_series(&self, board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        Some(board.humidity().series())
    }

    fn render(&mut self, value: Option<&f32>) {
        self.humidity = value.copied();
    }

    fn state(&self) -> HumidityState {
        HumidityState {
            label: format_reading(self.humidity, 1, "%"),
            fill: FillIndicator::HUMIDITY.fill(self.humidity),
        }
    }
}

// === Buttons ===

/// Controls that changed with the last reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonChanges {
    /// Slide switch moved.
    pub slide_switch: bool,
    /// Button A changed.
    pub button_a: bool,
    /// Button B changed.
    pub button_b: bool,
}

/// Buttons panel render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonsViewState {
    /// Current controls, `None` before the first reading.
    pub buttons: Option<ButtonsState>,
    /// What to animate.
    pub changes: ButtonChanges,
}

/// Slide switch and button status.
///
/// The first switch position is drawn without animation.
#[derive(Debug, Clone, Default)]
pub struct ButtonsView {
    current: Option<ButtonsState>,
    changes: ButtonChanges,
}

impl SensorView for ButtonsView {
    type Value = ButtonsState;
    type Series = ButtonsState;
    type State = ButtonsViewState;

    fn channel(board: &Board) -> &SensorChannel<ButtonsState> {
        board.buttons()
    }

    fn render(&mut self, value: Option<&ButtonsState>) {
        let Some(next) = value.copied() else {
            return;
        };
        self.changes = match self.current {
            Some(previous) if previous == next => self.changes,
            Some(previous) => ButtonChanges {
                slide_switch: previous.slide_switch != next.slide_switch,
                button_a: previous.button_a != next.button_a,
                button_b: previous.button_b != next.button_b,
            },
            None => ButtonChanges::default(),
        };
        self.current = Some(next);
    }

    fn state(&self) -> ButtonsViewState {
        ButtonsViewState {
            buttons: self.current,
            changes: self.changes,
        }
    }
}

// === Orientation ===

fn component_labels<const N: usize>(components: Option<[f32; N]>) -> [String; N] {
    match components {
        Some(values) => values.map(|v| format_reading(Some(v), 1, "")),
        None => std::array::from_fn(|_| format_reading(None, 1, "")),
    }
}

fn degree_labels(euler: Option<EulerAngles>) -> [String; 3] {
    match euler {
        Some(e) => [e.x, e.y, e.z].map(|r| format_reading(Some(r.to_degrees()), 0, "")),
        None => std::array::from_fn(|_| format_reading(None, 0, "")),
    }
}

/// Board orientation from gravity.
#[derive(Debug, Clone, PartialEq)]
pub struct AccelerometerState {
    /// Last reading, `None` before the first one.
    pub acceleration: Option<AccelerometerValue>,
    /// Pose of the board model in radians. Level without a reading.
    pub euler: EulerAngles,
    /// x, y and z in m/s², one decimal.
    pub values: [String; 3],
    /// Euler angles in whole degrees.
    pub euler_degrees: [String; 3],
    /// Pose transition duration.
    pub animation: Duration,
}

/// Board model tilted by the accelerometer, with a values panel.
#[derive(Debug, Clone, Default)]
pub struct AccelerometerView {
    acceleration: Option<AccelerometerValue>,
}

impl SensorView for AccelerometerView {
    type Value = AccelerometerValue;
    type Series = AccelerometerValue;
    type State = AccelerometerState;

    fn channel(board: &Board) -> &SensorChannel<AccelerometerValue> {
        board.accelerometer()
    }

    fn render(&mut self, value: Option<&AccelerometerValue>) {
        if let Some(value) = value {
            self.acceleration = Some(*value);
        }
    }

    fn state(&self) -> AccelerometerState {
        let euler = self.acceleration.as_ref().map(euler_from_acceleration);
        AccelerometerState {
            acceleration: self.acceleration,
            euler: euler.unwrap_or_default(),
            values: component_labels(self.acceleration.map(|a| [a.x, a.y, a.z])),
            euler_degrees: degree_labels(euler),
            animation: DEFAULT_SENSOR_PERIOD,
        }
    }
}

/// Board orientation from the sensor fusion quaternion.
#[derive(Debug, Clone, PartialEq)]
pub struct QuaternionState {
    /// Last reading, `None` before the first one.
    pub quaternion: Option<QuaternionValue>,
    /// Pitch, yaw and roll of the board model in radians.
    pub euler: EulerAngles,
    /// x, y, z and w, one decimal.
    pub values: [String; 4],
    /// Euler angles in whole degrees.
    pub euler_degrees: [String; 3],
    /// Pose transition duration.
    pub animation: Duration,
}

/// Board model rotated by the quaternion, with a values panel.
#[derive(Debug, Clone, Default)]
pub struct QuaternionView {
    quaternion: Option<QuaternionValue>,
}

impl SensorView for QuaternionView {
    type Value = QuaternionValue;
    type Series = QuaternionValue;
    type State = QuaternionState;

    fn channel(board: &Board) -> &SensorChannel<QuaternionValue> {
        board.quaternion()
    }

    fn render(&mut self, value: Option<&QuaternionValue>) {
        if let Some(value) = value {
            self.quaternion = Some(*value);
        }
    }

    fn state(&self) -> QuaternionState {
        let euler = self.quaternion.as_ref().map(quaternion_to_euler);
        QuaternionState {
            quaternion: self.quaternion,
            euler: euler.unwrap_or_default(),
            values: component_labels(self.quaternion.map(|q| [q.x, q.y, q.z, q.w])),
            euler_degrees: degree_labels(euler),
            animation: DEFAULT_SENSOR_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ButtonState, SlideSwitch};

    #[test]
    fn test_pressure_state() {
        let mut view = PressureView::default();
        view.render(None);
        let state = view.state();
        assert_eq!(state.label, "--");
        assert_eq!(state.needle.degrees, -136.0);

        view.render(Some(&1010.0));
        let state = view.state();
        assert_eq!(state.label, "1010");
        assert_eq!(state.needle.progress, 0.5);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut view = HumidityView::default();
        view.render(Some(&45.0));
        let first = view.state();
        view.render(Some(&45.0));
        assert_eq!(view.state(), first);
        assert_eq!(first.label, "45.0%");
        assert_eq!(first.fill, 0.45);
    }

    #[test]
    fn test_sound_uses_first_channel() {
        let mut view = SoundView::default();
        view.render(Some(&SoundAmplitudes::new(vec![-60.0, -10.0])));
        let state = view.state();
        assert_eq!(state.label, "-60");
        assert_eq!(state.meter.lit, 6);

        view.render(Some(&SoundAmplitudes::new(vec![])));
        assert_eq!(view.state().label, "--");
        assert_eq!(view.state().meter.lit, 0);
    }

    #[test]
    fn test_temperature_units() {
        let mut view = TemperatureView::default();
        assert_eq!(view.state().label, "--°F");

        view.render(Some(&20.0));
        assert_eq!(view.state().label, "68.0°F");

        let mut celsius = TemperatureView::with_unit(TemperatureUnit::Celsius);
        celsius.render(Some(&20.0));
        assert_eq!(celsius.state().label, "20.0°C");
        assert_eq!((celsius.chart_transform())(20.0), 20.0);
        assert_eq!((view.chart_transform())(20.0), 68.0);
    }

    #[test]
    fn test_light_state() {
        let mut view = LightView::default();
        view.render(None);
        assert_eq!(view.state().fill, 0.001);
        view.render(Some(&800.0));
        assert_eq!(view.state(), LightState { label: "800".to_string(), fill: 1.0 });
    }

    #[test]
    fn test_button_changes() {
        let mut view = ButtonsView::default();
        let first = ButtonsState {
            slide_switch: SlideSwitch::Left,
            button_a: ButtonState::Released,
            button_b: ButtonState::Released,
        };
        view.render(Some(&first));
        assert_eq!(view.state().changes, ButtonChanges::default());

        let pressed = ButtonsState {
            button_a: ButtonState::Pressed,
            ..first
        };
        view.render(Some(&pressed));
        assert_eq!(
            view.state().changes,
            ButtonChanges {
                slide_switch: false,
                button_a: true,
                button_b: false,
            }
        );

        // Same reading again keeps the state unchanged
        view.render(Some(&pressed));
        assert!(view.state().changes.button_a);
        assert_eq!(view.state().buttons, Some(pressed));
    }

    #[test]
    fn test_accelerometer_panel() {
        let mut view = AccelerometerView::default();
        view.render(None);
        let state = view.state();
        assert_eq!(state.euler, EulerAngles::default());
        assert_eq!(state.values, ["--", "--", "--"]);
        assert_eq!(state.euler_degrees, ["--", "--", "--"]);

        view.render(Some(&AccelerometerValue::new(-9.8, 0.0, 9.8)));
        let state = view.state();
        assert_eq!(state.values, ["-9.8", "0.0", "9.8"]);
        assert_eq!(state.euler_degrees, ["0", "45", "0"]);
        assert!((state.euler.y - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_quaternion_panel() {
        let mut view = QuaternionView::default();
        assert_eq!(view.state().values, ["--", "--", "--", "--"]);

        let half = std::f32::consts::FRAC_PI_4;
        view.render(Some(&QuaternionValue::new(0.0, 0.0, half.sin(), half.cos())));
        let state = view.state();
        assert_eq!(state.values, ["0.0", "0.0", "0.7", "0.7"]);
        assert_eq!(state.euler_degrees, ["0", "90", "0"]);
        assert!((state.euler.y - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }
}
