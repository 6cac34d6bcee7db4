//! Error types for the bluefruit-playground-ble crate.

use thiserror::Error;

use crate::sensor::SensorKind;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The specified board was not found.
    #[error("Board not found: {identifier}")]
    BoardNotFound {
        /// The identifier that was searched for.
        identifier: String,
    },

    /// Operation requires a connection but the board is not connected.
    #[error("Board not connected")]
    NotConnected,

    /// Failed to establish a connection to the board.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Service discovery on the board failed.
    #[error("Service discovery failed: {reason}")]
    DiscoveryFailed {
        /// Description of why discovery failed.
        reason: String,
    },

    /// Invalid data was received from the board.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// The board reported a service version this crate does not understand.
    #[error("Unsupported {service} service version {version} (expected {expected})")]
    UnsupportedVersion {
        /// Service whose version was checked.
        service: String,
        /// Version reported by the board.
        version: u32,
        /// Version this crate implements.
        expected: u32,
    },

    /// The live-update slot for a sensor already has an owner.
    #[error("Live updates for {sensor} are already claimed (owner #{owner})")]
    LiveSlotOccupied {
        /// Sensor whose slot was requested.
        sensor: SensorKind,
        /// Callback id of the current owner.
        owner: u64,
    },

    /// The requested operation is not supported.
    #[error("Operation not supported: {operation}")]
    NotSupported {
        /// Description of the unsupported operation.
        operation: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// Service not found on the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
