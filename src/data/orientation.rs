//! Orientation helpers.
//!
//! Euler angles from accelerometer and quaternion readings, quaternion
//! rotation, and the low-pass filter used to smooth puppet motion.

use super::values::{AccelerometerValue, QuaternionValue};

/// Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EulerAngles {
    /// Rotation about x.
    pub x: f32,
    /// Rotation about y.
    pub y: f32,
    /// Rotation about z.
    pub z: f32,
}

/// Tilt angles from a gravity vector.
///
/// `x` is the rotation about the x axis and `y` about the y axis. Yaw is not
/// observable from gravity alone and is always 0.
pub fn euler_from_acceleration(acceleration: &AccelerometerValue) -> EulerAngles {
    let AccelerometerValue { x, y, z } = *acceleration;
    EulerAngles {
        x: y.atan2(z),
        y: (-x).atan2((y * y + z * z).sqrt()),
        z: 0.0,
    }
}

/// Pitch, yaw and roll from a quaternion, returned as `x`, `y`, `z`.
pub fn quaternion_to_euler(q: &QuaternionValue) -> EulerAngles {
    let QuaternionValue { x, y, z, w } = *q;
    let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    EulerAngles {
        x: pitch,
        y: yaw,
        z: roll,
    }
}

/// Hamilton product `a * b`.
pub fn quaternion_multiply(a: &QuaternionValue, b: &QuaternionValue) -> QuaternionValue {
    QuaternionValue {
        w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
    }
}

/// Rotate `q` by `angle` radians about `axis` (applied on the right).
pub fn quaternion_rotated(q: &QuaternionValue, angle: f32, axis: (f32, f32, f32)) -> QuaternionValue {
    let (ax, ay, az) = axis;
    let norm = (ax * ax + ay * ay + az * az).sqrt();
    if norm == 0.0 {
        return *q;
    }
    let half = angle / 2.0;
    let s = half.sin() / norm;
    let rotation = QuaternionValue {
        x: ax * s,
        y: ay * s,
        z: az * s,
        w: half.cos(),
    };
    quaternion_multiply(q, &rotation)
}

/// Exponential low-pass filter.
///
/// `filter_factor` in `0.0..1.0` sets how strongly the value resists change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    value: f32,
    filter_factor: f32,
}

impl LowPassFilter {
    /// Create a filter starting at `value`.
    pub fn new(value: f32, filter_factor: f32) -> Self {
        Self {
            value,
            filter_factor: filter_factor.clamp(0.0, 0.999),
        }
    }

    /// Blend a new sample in and return the filtered value.
    pub fn update(&mut self, sample: f32) -> f32 {
        self.value = self.filter_factor * self.value + (1.0 - self.filter_factor) * sample;
        self.value
    }

    /// Current filtered value.
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_euler_flat() {
        let angles = euler_from_acceleration(&AccelerometerValue::new(0.0, 0.0, 9.8));
        assert!(approx(angles.x, 0.0));
        assert!(approx(angles.y, 0.0));
    }

    #[test]
    fn test_euler_tilted() {
        let angles = euler_from_acceleration(&AccelerometerValue::new(0.0, 9.8, 0.0));
        assert!(approx(angles.x, FRAC_PI_2));

        let angles = euler_from_acceleration(&AccelerometerValue::new(-9.8, 0.0, 0.0));
        assert!(approx(angles.y, FRAC_PI_2));
    }

    #[test]
    fn test_quaternion_identity_euler() {
        let angles = quaternion_to_euler(&QuaternionValue::IDENTITY);
        assert!(approx(angles.x, 0.0));
        assert!(approx(angles.y, 0.0));
        assert!(approx(angles.z, 0.0));
    }

    #[test]
    fn test_quaternion_rotated_half_turn_about_y() {
        let rotated = quaternion_rotated(&QuaternionValue::IDENTITY, PI, (0.0, 1.0, 0.0));
        assert!(approx(rotated.x, 0.0));
        assert!(approx(rotated.y, 1.0));
        assert!(approx(rotated.z, 0.0));
        assert!(approx(rotated.w, 0.0));

        // Two half turns bring it back (up to sign)
        let back = quaternion_rotated(&rotated, PI, (0.0, 1.0, 0.0));
        assert!(approx(back.w.abs(), 1.0));
    }

    #[test]
    fn test_quaternion_rotated_zero_axis() {
        let q = QuaternionValue::new(0.1, 0.2, 0.3, 0.9);
        assert_eq!(quaternion_rotated(&q, 1.0, (0.0, 0.0, 0.0)), q);
    }

    #[test]
    fn test_low_pass_filter() {
        let mut filter = LowPassFilter::new(0.0, 0.5);
        assert!(approx(filter.update(1.0), 0.5));
        assert!(approx(filter.update(1.0), 0.75));
        assert!(approx(filter.value(), 0.75));

        let mut passthrough = LowPassFilter::new(3.0, 0.0);
        assert!(approx(passthrough.update(7.0), 7.0));
    }
}
