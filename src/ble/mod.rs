//! BLE communication module.
//!
//! This module provides low-level Bluetooth Low Energy functionality
//! for discovering and communicating with Adafruit boards.

pub mod advertising;
pub mod characteristics;
pub mod connection;
pub mod scanner;
pub mod uuids;

pub use advertising::{AdafruitManufacturerData, BoardModel};
pub use characteristics::{CharacteristicHandler, NotificationEvent};
pub use connection::{ConnectionEvent, ConnectionManager, ConnectionState, LinkLossDetector};
pub use scanner::{BleScanner, BoardDiscoveryEvent};
pub use uuids::*;
