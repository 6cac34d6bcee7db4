//! Utility functions for the bluefruit-playground-ble crate.

/// Convert Celsius to Fahrenheit.
///
/// # Example
///
/// ```
/// use bluefruit_playground_ble::celsius_to_fahrenheit;
///
/// let fahrenheit = celsius_to_fahrenheit(100.0);
/// assert!((fahrenheit - 212.0).abs() < 0.001);
/// ```
#[inline]
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

/// Convert Fahrenheit to Celsius.
///
/// # Example
///
/// ```
/// use bluefruit_playground_ble::fahrenheit_to_celsius;
///
/// let celsius = fahrenheit_to_celsius(212.0);
/// assert!((celsius - 100.0).abs() < 0.001);
/// ```
#[inline]
pub fn fahrenheit_to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) / 1.8
}

/// Clamp to `0.0..=1.0`, mapping NaN to 0.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Format a reading with `precision` decimals followed by `unit`.
///
/// Missing and non-finite values render as `--` followed by `unit`.
///
/// ```
/// use bluefruit_playground_ble::format_reading;
///
/// assert_eq!(format_reading(Some(45.26), 1, "%"), "45.3%");
/// assert_eq!(format_reading(None, 1, "%"), "--%");
/// ```
pub fn format_reading(value: Option<f32>, precision: usize, unit: &str) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.*}{}", precision, v, unit),
        None => format!("--{}", unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(-40.0) - (-40.0)).abs() < 0.001);
        assert!((celsius_to_fahrenheit(37.0) - 98.6).abs() < 0.01);
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        assert!((fahrenheit_to_celsius(32.0) - 0.0).abs() < 0.001);
        assert!((fahrenheit_to_celsius(-40.0) - (-40.0)).abs() < 0.001);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-3.0), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(7.0), 1.0);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(Some(1013.4), 0, ""), "1013");
        assert_eq!(format_reading(Some(21.56), 1, "°C"), "21.6°C");
        assert_eq!(format_reading(None, 0, ""), "--");
        assert_eq!(format_reading(Some(f32::NAN), 1, "°F"), "--°F");
    }
}
