//! Sensor reading decoders.
//!
//! Every Adafruit sensor characteristic carries little-endian values. Most
//! are one or more `f32`, buttons are a `u32` bit mask, the color sensor
//! reports three `u16` and the microphone reports interleaved `i16` samples.

use bytes::Buf;

use crate::data::{
    AccelerometerValue, ButtonsState, ColorValue, GyroscopeValue, MagnetometerValue,
    QuaternionValue, SoundAmplitudes,
};
use crate::error::{Error, Result};
use crate::sensor::{SensorKind, SensorReading};

/// Full-scale value of a signed 16-bit sample.
const FULL_SCALE: f64 = 32768.0;

fn ensure_len(data: &[u8], needed: usize, what: &str) -> Result<()> {
    if data.len() < needed {
        return Err(Error::InvalidData {
            context: format!(
                "{} data too short: {} bytes (need at least {})",
                what,
                data.len(),
                needed
            ),
        });
    }
    Ok(())
}

/// Decode a single `f32`.
pub fn parse_f32(data: &[u8]) -> Result<f32> {
    ensure_len(data, 4, "Float")?;
    let mut buf = data;
    Ok(buf.get_f32_le())
}

/// Decode `N` consecutive `f32` values.
pub fn parse_f32_array<const N: usize>(data: &[u8]) -> Result<[f32; N]> {
    ensure_len(data, N * 4, "Float array")?;
    let mut buf = data;
    let mut out = [0.0f32; N];
    for v in out.iter_mut() {
        *v = buf.get_f32_le();
    }
    Ok(out)
}

/// Decode a `u32`.
pub fn parse_u32(data: &[u8]) -> Result<u32> {
    ensure_len(data, 4, "Integer")?;
    let mut buf = data;
    Ok(buf.get_u32_le())
}

/// Decode the buttons bit mask.
pub fn parse_buttons(data: &[u8]) -> Result<ButtonsState> {
    parse_u32(data).map(ButtonsState::from_mask)
}

/// Decode three `u16` color components, normalized to `0.0..=1.0`.
pub fn parse_color(data: &[u8]) -> Result<ColorValue> {
    ensure_len(data, 6, "Color")?;
    let mut buf = data;
    let max = u16::MAX as f32;
    Ok(ColorValue {
        red: buf.get_u16_le() as f32 / max,
        green: buf.get_u16_le() as f32 / max,
        blue: buf.get_u16_le() as f32 / max,
    })
}

/// Decode a quaternion sent as `w, x, y, z`.
pub fn parse_quaternion(data: &[u8]) -> Result<QuaternionValue> {
    let [w, x, y, z] = parse_f32_array::<4>(data)?;
    Ok(QuaternionValue { x, y, z, w })
}

/// Peak amplitude in dBFS for each channel of an interleaved `i16` buffer.
///
/// A trailing partial frame is ignored. A channel with no samples yields
/// `NaN`. A silent channel is floored at one LSB (about -90.3 dBFS).
pub fn sound_amplitudes(data: &[u8], channels: usize) -> Result<SoundAmplitudes> {
    if channels == 0 {
        return Err(Error::InvalidParameter {
            name: "channels".to_string(),
            value: "0".to_string(),
        });
    }
    if data.len() % 2 != 0 {
        return Err(Error::InvalidData {
            context: format!("Sound buffer has odd length {}", data.len()),
        });
    }

    let frames = data.len() / 2 / channels;
    let mut peaks: Vec<Option<i32>> = vec![None; channels];
    let mut buf = &data[..frames * channels * 2];
    let mut index = 0usize;
    while buf.has_remaining() {
        let sample = (buf.get_i16_le() as i32).abs();
        let peak = &mut peaks[index % channels];
        *peak = Some(peak.map_or(sample, |p| p.max(sample)));
        index += 1;
    }

    let amplitudes = peaks
        .into_iter()
        .map(|peak| match peak {
            Some(p) => 20.0 * (p.max(1) as f64 / FULL_SCALE).log10(),
            None => f64::NAN,
        })
        .collect();
    Ok(SoundAmplitudes::new(amplitudes))
}

/// Decode the notification payload for `kind`.
///
/// `sound_channels` is only used for [`SensorKind::Sound`].
pub fn decode_reading(kind: SensorKind, data: &[u8], sound_channels: usize) -> Result<SensorReading> {
    Ok(match kind {
        SensorKind::Light => SensorReading::Light(parse_f32(data)?),
        SensorKind::Temperature => SensorReading::Temperature(parse_f32(data)?),
        SensorKind::Humidity => SensorReading::Humidity(parse_f32(data)?),
        SensorKind::BarometricPressure => SensorReading::BarometricPressure(parse_f32(data)?),
        SensorKind::Buttons => SensorReading::Buttons(parse_buttons(data)?),
        SensorKind::Accelerometer => {
            let [x, y, z] = parse_f32_array::<3>(data)?;
            SensorReading::Accelerometer(AccelerometerValue { x, y, z })
        }
        SensorKind::Gyroscope => {
            let [x, y, z] = parse_f32_array::<3>(data)?;
            SensorReading::Gyroscope(GyroscopeValue { x, y, z })
        }
        SensorKind::Magnetometer => {
            let [x, y, z] = parse_f32_array::<3>(data)?;
            SensorReading::Magnetometer(MagnetometerValue { x, y, z })
        }
        SensorKind::Quaternion => SensorReading::Quaternion(parse_quaternion(data)?),
        SensorKind::Color => SensorReading::Color(parse_color(data)?),
        SensorKind::Sound => SensorReading::Sound(sound_amplitudes(data, sound_channels)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32s(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn i16s(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_f32() {
        assert_eq!(parse_f32(&1013.25f32.to_le_bytes()).ok(), Some(1013.25));
        // Extra bytes are ignored
        let mut data = 21.5f32.to_le_bytes().to_vec();
        data.push(0xFF);
        assert_eq!(parse_f32(&data).ok(), Some(21.5));
        assert!(parse_f32(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_decode_accelerometer() {
        let reading = decode_reading(SensorKind::Accelerometer, &f32s(&[1.0, -2.0, 9.8]), 1).ok();
        assert_eq!(
            reading,
            Some(SensorReading::Accelerometer(AccelerometerValue::new(1.0, -2.0, 9.8)))
        );
        assert!(decode_reading(SensorKind::Accelerometer, &f32s(&[1.0, 2.0]), 1).is_err());
    }

    #[test]
    fn test_decode_quaternion_w_first() {
        let q = parse_quaternion(&f32s(&[0.5, 0.1, 0.2, 0.3])).ok();
        assert_eq!(q, Some(QuaternionValue::new(0.1, 0.2, 0.3, 0.5)));
    }

    #[test]
    fn test_decode_buttons() {
        let state = parse_buttons(&0b011u32.to_le_bytes()).ok();
        assert_eq!(state, Some(ButtonsState::from_mask(0b011)));
        assert!(parse_buttons(&[0x01]).is_err());
    }

    #[test]
    fn test_decode_color() {
        let data: Vec<u8> = [u16::MAX, 0, u16::MAX / 2]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let color = parse_color(&data).ok();
        assert!(color.is_some());
        let color = color.unwrap_or_default();
        assert_eq!(color.red, 1.0);
        assert_eq!(color.green, 0.0);
        assert!((color.blue - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_sound_full_scale_is_zero_db() {
        let amplitudes = sound_amplitudes(&i16s(&[i16::MIN, 0, 100, -5]), 1).ok();
        let first = amplitudes.and_then(|a| a.first());
        assert_eq!(first, Some(0.0));
    }

    #[test]
    fn test_sound_interleaved_channels() {
        // Left peak 16384 (-6 dB), right peak 3277 (-20 dB)
        let data = i16s(&[16384, 100, -200, -3277, 10, 3000]);
        let amplitudes = sound_amplitudes(&data, 2).unwrap_or_default();
        assert_eq!(amplitudes.channel_count(), 2);
        let left = amplitudes.channel(0).unwrap_or(f64::NAN);
        let right = amplitudes.channel(1).unwrap_or(f64::NAN);
        assert!((left - (-6.0206)).abs() < 0.01);
        assert!((right - (-20.0)).abs() < 0.01);
    }

    #[test]
    fn test_sound_silence_and_empty() {
        let silent = sound_amplitudes(&i16s(&[0, 0, 0]), 1).unwrap_or_default();
        let floor = silent.first().unwrap_or(0.0);
        assert!((floor - (-90.309)).abs() < 0.01);

        let empty = sound_amplitudes(&[], 1).unwrap_or_default();
        assert_eq!(empty.channel_count(), 1);
        assert_eq!(empty.first(), None);

        // Partial frame on the second channel is ignored
        let partial = sound_amplitudes(&i16s(&[1000]), 2).unwrap_or_default();
        assert!(partial.channel(0).map(f64::is_nan).unwrap_or(false));
    }

    #[test]
    fn test_sound_invalid_input() {
        assert!(sound_amplitudes(&[0x00, 0x01, 0x02], 1).is_err());
        assert!(sound_amplitudes(&i16s(&[1, 2]), 0).is_err());
    }
}
