//! Advertising data parsing.
//!
//! Parses Adafruit manufacturer-specific advertising data and identifies the
//! board model from the USB product id it carries.

use crate::error::{Error, Result};

/// Manufacturer data field carrying the board's USB product id.
pub const FIELD_USB_PID: u16 = 0x0003;

/// Adafruit board model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardModel {
    /// Circuit Playground Bluefruit.
    CircuitPlaygroundBluefruit,
    /// CLUE nRF52840.
    Clue,
    /// Feather nRF52840 Express.
    FeatherNrf52840Express,
    /// A board this crate does not recognize.
    #[default]
    Unknown,
}

impl BoardModel {
    /// Identify a model from its USB product id.
    pub fn from_usb_pid(pid: u16) -> Self {
        match pid {
            0x8045 | 0x8046 => Self::CircuitPlaygroundBluefruit,
            0x8071 | 0x8072 => Self::Clue,
            0x8029 | 0x802A => Self::FeatherNrf52840Express,
            _ => Self::Unknown,
        }
    }

    /// Number of NeoPixels on the board.
    pub fn neopixel_count(&self) -> usize {
        match self {
            Self::CircuitPlaygroundBluefruit => 10,
            Self::Clue | Self::FeatherNrf52840Express => 1,
            Self::Unknown => 0,
        }
    }

    /// Check if the board mounts its motion sensor so that the
    /// accelerometer and quaternion need re-orienting.
    pub fn needs_orientation_adjustment(&self) -> bool {
        matches!(self, Self::Clue)
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CircuitPlaygroundBluefruit => "Circuit Playground Bluefruit",
            Self::Clue => "CLUE",
            Self::FeatherNrf52840Express => "Feather nRF52840 Express",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for BoardModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed Adafruit manufacturer data.
///
/// The payload is a sequence of fields, each `[len: u8][type: u16 LE][value]`
/// where `len` counts the type and value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdafruitManufacturerData {
    /// USB product id, if advertised.
    pub usb_pid: Option<u16>,
    /// Every field found, as `(type, value)`.
    pub fields: Vec<(u16, Vec<u8>)>,
}

impl AdafruitManufacturerData {
    /// Parse manufacturer data (without the company id).
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut fields = Vec::new();
        let mut rest = data;

        while let Some((&len, tail)) = rest.split_first() {
            let len = len as usize;
            if len < 2 || tail.len() < len {
                return Err(Error::InvalidData {
                    context: format!(
                        "Malformed manufacturer field: length {} with {} bytes left",
                        len,
                        tail.len()
                    ),
                });
            }
            let field_type = u16::from_le_bytes([tail[0], tail[1]]);
            fields.push((field_type, tail[2..len].to_vec()));
            rest = &tail[len..];
        }

        let usb_pid = fields
            .iter()
            .find(|(t, v)| *t == FIELD_USB_PID && v.len() >= 2)
            .map(|(_, v)| u16::from_le_bytes([v[0], v[1]]));

        Ok(Self { usb_pid, fields })
    }

    /// Board model identified from the advertised product id.
    pub fn model(&self) -> BoardModel {
        self.usb_pid
            .map(BoardModel::from_usb_pid)
            .unwrap_or(BoardModel::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid() {
        // len=4, type=0x0003, pid=0x8072
        let data = [0x04, 0x03, 0x00, 0x72, 0x80];
        let parsed = AdafruitManufacturerData::parse(&data).ok();
        assert_eq!(parsed.as_ref().and_then(|p| p.usb_pid), Some(0x8072));
        assert_eq!(parsed.map(|p| p.model()), Some(BoardModel::Clue));
    }

    #[test]
    fn test_parse_multiple_fields() {
        let data = [
            0x03, 0x01, 0x00, 0xAA, // unknown field
            0x04, 0x03, 0x00, 0x45, 0x80, // pid
        ];
        let parsed = AdafruitManufacturerData::parse(&data).unwrap_or_default();
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.fields[0], (0x0001, vec![0xAA]));
        assert_eq!(parsed.model(), BoardModel::CircuitPlaygroundBluefruit);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        let empty = AdafruitManufacturerData::parse(&[]).unwrap_or_default();
        assert_eq!(empty.model(), BoardModel::Unknown);

        assert!(AdafruitManufacturerData::parse(&[0x05, 0x03, 0x00]).is_err());
        assert!(AdafruitManufacturerData::parse(&[0x01, 0x03]).is_err());
    }

    #[test]
    fn test_model_properties() {
        assert_eq!(BoardModel::CircuitPlaygroundBluefruit.neopixel_count(), 10);
        assert_eq!(BoardModel::Clue.neopixel_count(), 1);
        assert!(BoardModel::Clue.needs_orientation_adjustment());
        assert!(!BoardModel::CircuitPlaygroundBluefruit.needs_orientation_adjustment());
        assert_eq!(BoardModel::from_usb_pid(0x1234), BoardModel::Unknown);
        assert_eq!(BoardModel::FeatherNrf52840Express.to_string(), "Feather nRF52840 Express");
    }
}
