//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants used for Adafruit board communication.
//! Adafruit sensor services share the base UUID
//! `ADAFxxxx-C332-42A8-93BD-25E905756CB8`.

use uuid::Uuid;

/// Build a UUID on the Adafruit sensor base from its 16-bit short id.
pub const fn adafruit_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((0xADAF_0000u128 | short as u128) << 96) | 0xC332_42A8_93BD_25E9_0575_6CB8)
}

// Device Information Service (Standard BLE)
/// Standard BLE Device Information Service UUID.
pub const DEVICE_INFO_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180a_0000_1000_8000_00805f9b34fb);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_00805f9b34fb);
/// Model Number characteristic UUID.
pub const MODEL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a24_0000_1000_8000_00805f9b34fb);
/// Firmware Revision characteristic UUID.
pub const FIRMWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a26_0000_1000_8000_00805f9b34fb);

// Shared measurement characteristics (present in every sensor service)
/// Measurement period in milliseconds (`i32` LE, `-1` disables updates).
pub const MEASUREMENT_PERIOD_UUID: Uuid = adafruit_uuid(0x0001);
/// Service version (`u32` LE).
pub const SERVICE_VERSION_UUID: Uuid = adafruit_uuid(0x0002);

/// Temperature service.
pub const TEMPERATURE_SERVICE_UUID: Uuid = adafruit_uuid(0x0100);
/// Temperature characteristic (`f32` °C).
pub const TEMPERATURE_UUID: Uuid = adafruit_uuid(0x0101);

/// Accelerometer service.
pub const ACCELEROMETER_SERVICE_UUID: Uuid = adafruit_uuid(0x0200);
/// Accelerometer characteristic (3 x `f32` m/s²).
pub const ACCELEROMETER_UUID: Uuid = adafruit_uuid(0x0201);

/// Light sensor service.
pub const LIGHT_SERVICE_UUID: Uuid = adafruit_uuid(0x0300);
/// Light characteristic (`f32` lux).
pub const LIGHT_UUID: Uuid = adafruit_uuid(0x0301);

/// Gyroscope service.
pub const GYROSCOPE_SERVICE_UUID: Uuid = adafruit_uuid(0x0400);
/// Gyroscope characteristic (3 x `f32` rad/s).
pub const GYROSCOPE_UUID: Uuid = adafruit_uuid(0x0401);

/// Magnetometer service.
pub const MAGNETOMETER_SERVICE_UUID: Uuid = adafruit_uuid(0x0500);
/// Magnetometer characteristic (3 x `f32` µT).
pub const MAGNETOMETER_UUID: Uuid = adafruit_uuid(0x0501);

/// Buttons service.
pub const BUTTONS_SERVICE_UUID: Uuid = adafruit_uuid(0x0600);
/// Buttons characteristic (`u32` bit mask).
pub const BUTTONS_UUID: Uuid = adafruit_uuid(0x0601);

/// Humidity service.
pub const HUMIDITY_SERVICE_UUID: Uuid = adafruit_uuid(0x0700);
/// Humidity characteristic (`f32` %).
pub const HUMIDITY_UUID: Uuid = adafruit_uuid(0x0701);

/// Barometric pressure service.
pub const BAROMETRIC_PRESSURE_SERVICE_UUID: Uuid = adafruit_uuid(0x0800);
/// Barometric pressure characteristic (`f32` hPa).
pub const BAROMETRIC_PRESSURE_UUID: Uuid = adafruit_uuid(0x0801);

/// NeoPixel service.
pub const NEOPIXELS_SERVICE_UUID: Uuid = adafruit_uuid(0x0900);
/// NeoPixel pixel data characteristic.
pub const NEOPIXELS_DATA_UUID: Uuid = adafruit_uuid(0x0903);

/// Color sensor service.
pub const COLOR_SENSOR_SERVICE_UUID: Uuid = adafruit_uuid(0x0A00);
/// Color sensor characteristic (3 x `u16` RGB).
pub const COLOR_SENSOR_UUID: Uuid = adafruit_uuid(0x0A01);

/// Sound service.
pub const SOUND_SERVICE_UUID: Uuid = adafruit_uuid(0x0B00);
/// Sound samples characteristic (interleaved `i16` samples).
pub const SOUND_SAMPLES_UUID: Uuid = adafruit_uuid(0x0B01);
/// Sound channel count characteristic (`u8`).
pub const SOUND_CHANNELS_UUID: Uuid = adafruit_uuid(0x0B02);

/// Tone generator service.
pub const TONE_GENERATOR_SERVICE_UUID: Uuid = adafruit_uuid(0x0C00);
/// Tone generator characteristic (`u16` Hz + `u32` ms).
pub const TONE_GENERATOR_UUID: Uuid = adafruit_uuid(0x0C01);

/// Quaternion service.
pub const QUATERNION_SERVICE_UUID: Uuid = adafruit_uuid(0x0D00);
/// Quaternion characteristic (4 x `f32`, w first).
pub const QUATERNION_UUID: Uuid = adafruit_uuid(0x0D01);

// Adafruit manufacturer ID for advertising data
/// Adafruit Industries' Bluetooth manufacturer ID.
pub const ADAFRUIT_MANUFACTURER_ID: u16 = 0x0822;

/// Check if a UUID sits on the Adafruit sensor base.
pub fn is_adafruit_uuid(uuid: &Uuid) -> bool {
    let value = uuid.as_u128();
    (value >> 112) == 0xADAF && (value & ((1u128 << 96) - 1)) == 0xC332_42A8_93BD_25E9_0575_6CB8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            BAROMETRIC_PRESSURE_SERVICE_UUID.to_string(),
            "adaf0800-c332-42a8-93bd-25e905756cb8"
        );
        assert_eq!(
            SOUND_CHANNELS_UUID.to_string(),
            "adaf0b02-c332-42a8-93bd-25e905756cb8"
        );
        assert_eq!(
            MEASUREMENT_PERIOD_UUID.to_string(),
            "adaf0001-c332-42a8-93bd-25e905756cb8"
        );

        let device_info = DEVICE_INFO_SERVICE_UUID.to_string();
        assert!(device_info.contains("180a"));
    }

    #[test]
    fn test_is_adafruit_uuid() {
        assert!(is_adafruit_uuid(&TEMPERATURE_UUID));
        assert!(is_adafruit_uuid(&QUATERNION_SERVICE_UUID));
        assert!(!is_adafruit_uuid(&DEVICE_INFO_SERVICE_UUID));
        assert!(!is_adafruit_uuid(&FIRMWARE_REVISION_UUID));
    }
}
