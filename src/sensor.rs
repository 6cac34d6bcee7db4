//! Board services and sensor kinds.
//!
//! A [`BoardService`] is anything the board exposes over GATT (sensors and
//! actuators). A [`SensorKind`] is the subset that produces readings.

use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::ble::uuids::*;
use crate::data::{
    AccelerometerValue, ButtonsState, ColorValue, GyroscopeValue, MagnetometerValue,
    QuaternionValue, SoundAmplitudes,
};

/// Default time between sensor measurements.
pub const DEFAULT_SENSOR_PERIOD: Duration = Duration::from_millis(100);

/// A GATT service offered by an Adafruit board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardService {
    /// Addressable RGB LEDs.
    NeoPixels,
    /// Ambient light sensor.
    Light,
    /// Push buttons and slide switch.
    Buttons,
    /// Piezo tone generator.
    ToneGenerator,
    /// Accelerometer.
    Accelerometer,
    /// Temperature sensor.
    Temperature,
    /// Relative humidity sensor.
    Humidity,
    /// Barometric pressure sensor.
    BarometricPressure,
    /// Microphone.
    Sound,
    /// Gyroscope.
    Gyroscope,
    /// Sensor-fusion orientation quaternion.
    Quaternion,
    /// Magnetometer.
    Magnetometer,
    /// RGB color sensor.
    ColorSensor,
}

impl BoardService {
    /// Every service, in setup order.
    pub const ALL: [BoardService; 13] = [
        Self::NeoPixels,
        Self::Light,
        Self::Buttons,
        Self::ToneGenerator,
        Self::Accelerometer,
        Self::Temperature,
        Self::Humidity,
        Self::BarometricPressure,
        Self::Sound,
        Self::Gyroscope,
        Self::Quaternion,
        Self::Magnetometer,
        Self::ColorSensor,
    ];

    /// GATT service UUID.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            Self::NeoPixels => NEOPIXELS_SERVICE_UUID,
            Self::Light => LIGHT_SERVICE_UUID,
            Self::Buttons => BUTTONS_SERVICE_UUID,
            Self::ToneGenerator => TONE_GENERATOR_SERVICE_UUID,
            Self::Accelerometer => ACCELEROMETER_SERVICE_UUID,
            Self::Temperature => TEMPERATURE_SERVICE_UUID,
            Self::Humidity => HUMIDITY_SERVICE_UUID,
            Self::BarometricPressure => BAROMETRIC_PRESSURE_SERVICE_UUID,
            Self::Sound => SOUND_SERVICE_UUID,
            Self::Gyroscope => GYROSCOPE_SERVICE_UUID,
            Self::Quaternion => QUATERNION_SERVICE_UUID,
            Self::Magnetometer => MAGNETOMETER_SERVICE_UUID,
            Self::ColorSensor => COLOR_SENSOR_SERVICE_UUID,
        }
    }

    /// UUID of the characteristic carrying the service's data.
    pub fn main_characteristic_uuid(&self) -> Uuid {
        match self {
            Self::NeoPixels => NEOPIXELS_DATA_UUID,
            Self::Light => LIGHT_UUID,
            Self::Buttons => BUTTONS_UUID,
            Self::ToneGenerator => TONE_GENERATOR_UUID,
            Self::Accelerometer => ACCELEROMETER_UUID,
            Self::Temperature => TEMPERATURE_UUID,
            Self::Humidity => HUMIDITY_UUID,
            Self::BarometricPressure => BAROMETRIC_PRESSURE_UUID,
            Self::Sound => SOUND_SAMPLES_UUID,
            Self::Gyroscope => GYROSCOPE_UUID,
            Self::Quaternion => QUATERNION_UUID,
            Self::Magnetometer => MAGNETOMETER_UUID,
            Self::ColorSensor => COLOR_SENSOR_UUID,
        }
    }

    /// Service version this crate understands.
    pub fn expected_version(&self) -> u32 {
        1
    }

    /// Measurement period requested when the service is enabled.
    ///
    /// `None` means the service has no measurement period (actuators).
    /// `Some(Duration::ZERO)` asks the board to notify only on change.
    pub fn default_period(&self) -> Option<Duration> {
        match self {
            Self::NeoPixels | Self::ToneGenerator => None,
            Self::Buttons => Some(Duration::ZERO),
            _ => Some(DEFAULT_SENSOR_PERIOD),
        }
    }

    /// The sensor this service produces readings for, if any.
    pub fn sensor(&self) -> Option<SensorKind> {
        match self {
            Self::NeoPixels | Self::ToneGenerator => None,
            Self::Light => Some(SensorKind::Light),
            Self::Buttons => Some(SensorKind::Buttons),
            Self::Accelerometer => Some(SensorKind::Accelerometer),
            Self::Temperature => Some(SensorKind::Temperature),
            Self::Humidity => Some(SensorKind::Humidity),
            Self::BarometricPressure => Some(SensorKind::BarometricPressure),
            Self::Sound => Some(SensorKind::Sound),
            Self::Gyroscope => Some(SensorKind::Gyroscope),
            Self::Quaternion => Some(SensorKind::Quaternion),
            Self::Magnetometer => Some(SensorKind::Magnetometer),
            Self::ColorSensor => Some(SensorKind::Color),
        }
    }

    /// Find the service whose main characteristic has this UUID.
    pub fn from_characteristic(uuid: &Uuid) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|service| service.main_characteristic_uuid() == *uuid)
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NeoPixels => "NeoPixels",
            Self::ToneGenerator => "Tone Generator",
            other => other.sensor().map(|s| s.name()).unwrap_or("Unknown"),
        }
    }
}

impl fmt::Display for BoardService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A board service that produces readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Light in lux.
    Light,
    /// Buttons and slide switch.
    Buttons,
    /// Acceleration in m/s².
    Accelerometer,
    /// Temperature in °C.
    Temperature,
    /// Relative humidity in %.
    Humidity,
    /// Pressure in hPa.
    BarometricPressure,
    /// Sound amplitude per channel in dBFS.
    Sound,
    /// Angular rate in rad/s.
    Gyroscope,
    /// Orientation quaternion.
    Quaternion,
    /// Magnetic field in µT.
    Magnetometer,
    /// Normalized RGB color.
    Color,
}

impl SensorKind {
    /// Service that produces this sensor's readings.
    pub fn service(&self) -> BoardService {
        match self {
            Self::Light => BoardService::Light,
            Self::Buttons => BoardService::Buttons,
            Self::Accelerometer => BoardService::Accelerometer,
            Self::Temperature => BoardService::Temperature,
            Self::Humidity => BoardService::Humidity,
            Self::BarometricPressure => BoardService::BarometricPressure,
            Self::Sound => BoardService::Sound,
            Self::Gyroscope => BoardService::Gyroscope,
            Self::Quaternion => BoardService::Quaternion,
            Self::Magnetometer => BoardService::Magnetometer,
            Self::Color => BoardService::ColorSensor,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Buttons => "Buttons",
            Self::Accelerometer => "Accelerometer",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::BarometricPressure => "Barometric Pressure",
            Self::Sound => "Sound",
            Self::Gyroscope => "Gyroscope",
            Self::Quaternion => "Quaternion",
            Self::Magnetometer => "Magnetometer",
            Self::Color => "Color",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded reading from any sensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorReading {
    /// Light in lux.
    Light(f32),
    /// Buttons and slide switch.
    Buttons(ButtonsState),
    /// Acceleration in m/s².
    Accelerometer(AccelerometerValue),
    /// Temperature in °C.
    Temperature(f32),
    /// Relative humidity in %.
    Humidity(f32),
    /// Pressure in hPa.
    BarometricPressure(f32),
    /// Per-channel amplitude in dBFS.
    Sound(SoundAmplitudes),
    /// Angular rate in rad/s.
    Gyroscope(GyroscopeValue),
    /// Orientation quaternion.
    Quaternion(QuaternionValue),
    /// Magnetic field in µT.
    Magnetometer(MagnetometerValue),
    /// Normalized RGB color.
    Color(ColorValue),
}

impl SensorReading {
    /// The sensor this reading came from.
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Light(_) => SensorKind::Light,
            Self::Buttons(_) => SensorKind::Buttons,
            Self::Accelerometer(_) => SensorKind::Accelerometer,
            Self::Temperature(_) => SensorKind::Temperature,
            Self::Humidity(_) => SensorKind::Humidity,
            Self::BarometricPressure(_) => SensorKind::BarometricPressure,
            Self::Sound(_) => SensorKind::Sound,
            Self::Gyroscope(_) => SensorKind::Gyroscope,
            Self::Quaternion(_) => SensorKind::Quaternion,
            Self::Magnetometer(_) => SensorKind::Magnetometer,
            Self::Color(_) => SensorKind::Color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_sensor_roundtrip() {
        for service in BoardService::ALL {
            if let Some(sensor) = service.sensor() {
                assert_eq!(sensor.service(), service);
            }
        }
    }

    #[test]
    fn test_from_characteristic() {
        assert_eq!(
            BoardService::from_characteristic(&BAROMETRIC_PRESSURE_UUID),
            Some(BoardService::BarometricPressure)
        );
        assert_eq!(
            BoardService::from_characteristic(&SOUND_SAMPLES_UUID),
            Some(BoardService::Sound)
        );
        assert_eq!(BoardService::from_characteristic(&SOUND_CHANNELS_UUID), None);
    }

    #[test]
    fn test_default_periods() {
        assert_eq!(BoardService::Buttons.default_period(), Some(Duration::ZERO));
        assert_eq!(BoardService::ToneGenerator.default_period(), None);
        assert_eq!(
            BoardService::BarometricPressure.default_period(),
            Some(DEFAULT_SENSOR_PERIOD)
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(BoardService::ToneGenerator.to_string(), "Tone Generator");
        assert_eq!(BoardService::ColorSensor.to_string(), "Color");
        assert_eq!(SensorKind::BarometricPressure.to_string(), "Barometric Pressure");
    }

    #[test]
    fn test_reading_kind() {
        assert_eq!(
            SensorReading::BarometricPressure(1010.0).kind(),
            SensorKind::BarometricPressure
        );
        assert_eq!(
            SensorReading::Sound(SoundAmplitudes::new(vec![-30.0])).kind(),
            SensorKind::Sound
        );
    }
}
