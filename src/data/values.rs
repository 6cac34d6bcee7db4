//! Sensor value types.
//!
//! Plain value types for the readings an Adafruit board reports. Decoding
//! from the wire lives in [`crate::protocol::readings`].

/// Acceleration in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelerometerValue {
    /// X axis.
    pub x: f32,
    /// Y axis.
    pub y: f32,
    /// Z axis.
    pub z: f32,
}

impl AccelerometerValue {
    /// Create a new value.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Angular rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GyroscopeValue {
    /// X axis.
    pub x: f32,
    /// Y axis.
    pub y: f32,
    /// Z axis.
    pub z: f32,
}

/// Magnetic field in µT.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagnetometerValue {
    /// X axis.
    pub x: f32,
    /// Y axis.
    pub y: f32,
    /// Z axis.
    pub z: f32,
}

/// Orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuaternionValue {
    /// Imaginary x.
    pub x: f32,
    /// Imaginary y.
    pub y: f32,
    /// Imaginary z.
    pub z: f32,
    /// Real part.
    pub w: f32,
}

impl QuaternionValue {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a new quaternion.
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for QuaternionValue {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position of the slide switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlideSwitch {
    /// Switch to the right.
    #[default]
    Right,
    /// Switch to the left.
    Left,
}

/// State of a push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ButtonState {
    /// Not pressed.
    #[default]
    Released,
    /// Held down.
    Pressed,
}

impl ButtonState {
    /// Check if the button is pressed.
    pub fn is_pressed(&self) -> bool {
        matches!(self, Self::Pressed)
    }
}

/// Buttons and slide switch state.
///
/// Reported as a `u32` mask: bit 0 slide switch (1 = left), bit 1 button A,
/// bit 2 button B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonsState {
    /// Slide switch position.
    pub slide_switch: SlideSwitch,
    /// Button A.
    pub button_a: ButtonState,
    /// Button B.
    pub button_b: ButtonState,
}

impl ButtonsState {
    /// Decode from the board's bit mask.
    pub fn from_mask(mask: u32) -> Self {
        let bit = |n: u32| (mask >> n) & 0b1 == 1;
        Self {
            slide_switch: if bit(0) {
                SlideSwitch::Left
            } else {
                SlideSwitch::Right
            },
            button_a: if bit(1) {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            },
            button_b: if bit(2) {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            },
        }
    }

    /// Encode to the board's bit mask.
    pub fn to_mask(&self) -> u32 {
        let mut mask = 0;
        if self.slide_switch == SlideSwitch::Left {
            mask |= 0b001;
        }
        if self.button_a.is_pressed() {
            mask |= 0b010;
        }
        if self.button_b.is_pressed() {
            mask |= 0b100;
        }
        mask
    }
}

/// Color sensor reading, each component normalized to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorValue {
    /// Red.
    pub red: f32,
    /// Green.
    pub green: f32,
    /// Blue.
    pub blue: f32,
}

/// Per-channel sound amplitude in dBFS.
///
/// A channel with no samples in the last buffer is `NaN`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundAmplitudes(pub Vec<f64>);

impl SoundAmplitudes {
    /// Wrap per-channel amplitudes.
    pub fn new(channels: Vec<f64>) -> Self {
        Self(channels)
    }

    /// Amplitude of the first channel, the one the UI shows.
    pub fn first(&self) -> Option<f64> {
        self.0.first().copied().filter(|v| !v.is_nan())
    }

    /// Amplitude of a given channel.
    pub fn channel(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.0.len()
    }
}

/// An 8-bit RGB color for NeoPixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RgbColor {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl RgbColor {
    /// All LEDs off.
    pub const OFF: Self = Self { r: 0, g: 0, b: 0 };

    /// Create a new color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every component by `brightness` (clamped to `0.0..=1.0`).
    pub fn scaled(&self, brightness: f32) -> Self {
        let factor = brightness.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }

    /// Bytes in the order the board expects.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}
