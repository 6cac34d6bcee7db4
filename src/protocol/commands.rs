//! Command encoders.
//!
//! Payloads written to board characteristics: measurement period, tone
//! generator and NeoPixel data.

use std::time::Duration;

use bytes::{BufMut, BytesMut};

use crate::data::RgbColor;
use crate::error::{Error, Result};

/// Measurement period value that disables a sensor.
pub const PERIOD_DISABLED: i32 = -1;

/// NeoPixel write flag: latch the buffer to the LEDs after this write.
pub const NEOPIXEL_FLAG_FLUSH: u8 = 0x01;

/// Encode a measurement period.
///
/// `None` disables the sensor, `Some(Duration::ZERO)` asks for notifications
/// on change only.
pub fn encode_period(period: Option<Duration>) -> Result<Vec<u8>> {
    let millis = match period {
        None => PERIOD_DISABLED,
        Some(period) => i32::try_from(period.as_millis()).map_err(|_| Error::InvalidParameter {
            name: "period".to_string(),
            value: format!("{:?}", period),
        })?,
    };
    Ok(millis.to_le_bytes().to_vec())
}

/// Decode a measurement period previously read from the board.
pub fn decode_period(data: &[u8]) -> Result<Option<Duration>> {
    if data.len() < 4 {
        return Err(Error::InvalidData {
            context: format!("Period data too short: {} bytes", data.len()),
        });
    }
    let millis = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    Ok(if millis < 0 {
        None
    } else {
        Some(Duration::from_millis(millis as u64))
    })
}

/// Encode a tone request.
///
/// A `frequency` of 0 stops the tone. A `duration` of `None` plays until
/// stopped.
pub fn encode_tone(frequency: u16, duration: Option<Duration>) -> Result<Vec<u8>> {
    let millis = match duration {
        None => 0,
        Some(d) => u32::try_from(d.as_millis()).map_err(|_| Error::InvalidParameter {
            name: "duration".to_string(),
            value: format!("{:?}", d),
        })?,
    };
    let mut buf = BytesMut::with_capacity(6);
    buf.put_u16_le(frequency);
    buf.put_u32_le(millis);
    Ok(buf.to_vec())
}

/// Encode a NeoPixel write starting at pixel `start`.
///
/// The board addresses its pixel buffer in bytes, three per pixel.
pub fn encode_pixels(start: u16, colors: &[RgbColor], flush: bool) -> Result<Vec<u8>> {
    let offset = start.checked_mul(3).ok_or_else(|| Error::InvalidParameter {
        name: "start".to_string(),
        value: start.to_string(),
    })?;
    let mut buf = BytesMut::with_capacity(3 + colors.len() * 3);
    buf.put_u16_le(offset);
    buf.put_u8(if flush { NEOPIXEL_FLAG_FLUSH } else { 0 });
    for color in colors {
        buf.put_slice(&color.to_bytes());
    }
    Ok(buf.to_vec())
}

/// Build the pixel buffer for a bit mask: bit `i` set lights pixel `i` with
/// `color`, clear bits are off.
pub fn pixels_from_mask(color: RgbColor, mask: &[bool], count: usize) -> Vec<RgbColor> {
    (0..count)
        .map(|i| {
            if mask.get(i).copied().unwrap_or(false) {
                color
            } else {
                RgbColor::OFF
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_period() {
        assert_eq!(
            encode_period(Some(Duration::from_millis(100))).ok(),
            Some(vec![100, 0, 0, 0])
        );
        assert_eq!(encode_period(Some(Duration::ZERO)).ok(), Some(vec![0, 0, 0, 0]));
        assert_eq!(encode_period(None).ok(), Some(vec![0xFF, 0xFF, 0xFF, 0xFF]));
        assert!(encode_period(Some(Duration::from_secs(u64::MAX / 2))).is_err());
    }

    #[test]
    fn test_decode_period() {
        assert_eq!(
            decode_period(&[0xE8, 0x03, 0, 0]).ok(),
            Some(Some(Duration::from_secs(1)))
        );
        assert_eq!(decode_period(&[0xFF, 0xFF, 0xFF, 0xFF]).ok(), Some(None));
        assert!(decode_period(&[0x00]).is_err());
    }

    #[test]
    fn test_encode_tone() {
        let data = encode_tone(440, Some(Duration::from_millis(500))).ok();
        assert_eq!(data, Some(vec![0xB8, 0x01, 0xF4, 0x01, 0x00, 0x00]));

        let continuous = encode_tone(262, None).ok();
        assert_eq!(continuous, Some(vec![0x06, 0x01, 0, 0, 0, 0]));

        let stop = encode_tone(0, None).ok();
        assert_eq!(stop, Some(vec![0; 6]));
    }

    #[test]
    fn test_encode_pixels() {
        let colors = [RgbColor::new(1, 2, 3), RgbColor::new(4, 5, 6)];
        let data = encode_pixels(2, &colors, true).ok();
        assert_eq!(data, Some(vec![6, 0, NEOPIXEL_FLAG_FLUSH, 1, 2, 3, 4, 5, 6]));

        let data = encode_pixels(0, &[], false).ok();
        assert_eq!(data, Some(vec![0, 0, 0]));

        assert!(encode_pixels(u16::MAX, &colors, true).is_err());
    }

    #[test]
    fn test_pixels_from_mask() {
        let red = RgbColor::new(255, 0, 0);
        let pixels = pixels_from_mask(red, &[true, false, true], 4);
        assert_eq!(pixels, vec![red, RgbColor::OFF, red, RgbColor::OFF]);
    }
}
