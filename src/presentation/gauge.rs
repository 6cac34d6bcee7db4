//! Gauge and fill rendering math.
//!
//! Everything here maps a scalar reading onto a bounded visual range. A
//! missing reading renders at the domain minimum.

use std::time::Duration;

use crate::sensor::DEFAULT_SENSOR_PERIOD;
use crate::utils::clamp_unit;

/// A closed value domain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaugeScale {
    /// Domain minimum.
    pub min: f32,
    /// Domain maximum.
    pub max: f32,
}

impl GaugeScale {
    /// Barometric pressure domain in hPa.
    pub const PRESSURE: Self = Self::new(960.0, 1060.0);
    /// Sound amplitude domain in dBFS.
    pub const SOUND: Self = Self::new(-120.0, 0.0);
    /// Light domain in lux.
    pub const LIGHT: Self = Self::new(0.0, 800.0);
    /// Relative humidity domain in %.
    pub const HUMIDITY: Self = Self::new(0.0, 100.0);

    /// Create a scale.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` to the domain and map it linearly to `0.0..=1.0`.
    ///
    /// NaN and degenerate domains map to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if value.is_nan() || !span.is_finite() || span <= 0.0 {
            return 0.0;
        }
        let clamped = value.clamp(self.min, self.max);
        clamp_unit((clamped - self.min) / span)
    }

    /// Like [`normalize`](Self::normalize), with a missing value at 0.
    pub fn progress(&self, value: Option<f32>) -> f32 {
        value.map(|v| self.normalize(v)).unwrap_or(0.0)
    }
}

/// Needle pose for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedlePosition {
    /// Normalized value.
    pub progress: f32,
    /// Needle angle in degrees.
    pub degrees: f32,
    /// Needle angle in radians.
    pub radians: f32,
    /// Duration of the transition to this pose.
    pub animation: Duration,
}

/// Rotating needle gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleGauge {
    /// Value domain.
    pub scale: GaugeScale,
    /// Needle angle at the domain minimum.
    pub min_degrees: f32,
    /// Needle angle at the domain maximum.
    pub max_degrees: f32,
    /// Transition duration.
    pub animation: Duration,
}

impl NeedleGauge {
    /// The barometer dial.
    pub const PRESSURE: Self = Self {
        scale: GaugeScale::PRESSURE,
        min_degrees: -136.0,
        max_degrees: 136.0,
        animation: DEFAULT_SENSOR_PERIOD,
    };

    /// Needle pose for `value`.
    pub fn position(&self, value: Option<f32>) -> NeedlePosition {
        let progress = self.scale.progress(value);
        let degrees = self.min_degrees + progress * (self.max_degrees - self.min_degrees);
        NeedlePosition {
            progress,
            degrees,
            radians: degrees.to_radians(),
            animation: self.animation,
        }
    }
}

/// Fill of a stepped level meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelFill {
    /// Lit levels.
    pub lit: u32,
    /// Total levels.
    pub levels: u32,
    /// `lit / levels`.
    pub proportion: f32,
}

/// Meter that fills in discrete steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMeter {
    /// Value domain.
    pub scale: GaugeScale,
    /// Number of steps.
    pub levels: u32,
}

impl LevelMeter {
    /// The sound level bars.
    pub const SOUND: Self = Self {
        scale: GaugeScale::SOUND,
        levels: 12,
    };

    /// Fill for `value`, rounded to the nearest level.
    pub fn fill(&self, value: Option<f32>) -> LevelFill {
        if self.levels == 0 {
            return LevelFill {
                lit: 0,
                levels: 0,
                proportion: 0.0,
            };
        }
        let progress = self.scale.progress(value);
        let lit = ((progress * self.levels as f32).round() as u32).min(self.levels);
        LevelFill {
            lit,
            levels: self.levels,
            proportion: lit as f32 / self.levels as f32,
        }
    }
}

/// Continuous fill indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillIndicator {
    /// Value domain.
    pub scale: GaugeScale,
    /// Smallest fill drawn.
    pub min_fill: f32,
}

impl FillIndicator {
    /// The humidity drop.
    pub const HUMIDITY: Self = Self {
        scale: GaugeScale::HUMIDITY,
        min_fill: 0.0,
    };

    /// The light scale bar. It never collapses to an empty mask.
    pub const LIGHT: Self = Self {
        scale: GaugeScale::LIGHT,
        min_fill: 0.001,
    };

    /// Fill for `value`.
    pub fn fill(&self, value: Option<f32>) -> f32 {
        self.scale.progress(value).max(clamp_unit(self.min_fill))
    }
}
