//! Protocol module for decoding readings and encoding commands.
//!
//! This module contains the implementations for:
//! - Sensor notification decoding
//! - Measurement period, tone and NeoPixel payloads

pub mod commands;
pub mod readings;

pub use commands::{decode_period, encode_period, encode_pixels, encode_tone, pixels_from_mask};
pub use readings::{decode_reading, sound_amplitudes};
