//! # Radar Error Handling
//!
//! This module defines the RadarError enum, which represents the different error
//! types that can occur in the radar-rs crate.
//!
//! Link-level failures (`Timeout`, `Framing`, `Checksum`) are recovered by the
//! request/response engine and never reach the poll sequencer. `Decode` errors
//! are carried inside telemetry records as values. Everything else is fatal to
//! the gateway, whose only recovery is a restart.

use crate::connection::encryption::CryptoError;
use crate::radar::response::DecodeError;
use thiserror::Error;

/// Represents the different error types that can occur in the radar crate.
#[derive(Debug, Error)]
pub enum RadarError {
    /// No response arrived within the wait window.
    #[error("Sensor timeout")]
    Timeout,

    /// A frame was not closed by the end marker, or ended early.
    #[error("Framing error: {0}")]
    Framing(String),

    /// The frame integrity check failed.
    #[error("Checksum failed: received 0x{expected:02X}, calculated 0x{calculated:02X}")]
    Checksum { expected: u8, calculated: u8 },

    /// A well-formed frame carried a payload that could not be interpreted.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The reset procedure exhausted its retry bound.
    #[error("Sensor is not responding")]
    SensorUnresponsive,

    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPort(String),

    /// The payload does not fit the 2-byte length field.
    #[error("Payload too long: {0} bytes")]
    PayloadTooLong(usize),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure talking to the collector.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure encrypting or decrypting a collector message.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A firmware image did not match its published digest.
    #[error("Firmware digest mismatch: expected {expected}, calculated {calculated}")]
    DigestMismatch { expected: String, calculated: String },

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RadarError {
    /// True for the failures the link engine absorbs by re-reading or resetting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RadarError::Timeout | RadarError::Framing(_) | RadarError::Checksum { .. }
        )
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::Serialization(err.to_string())
    }
}

impl From<hex::FromHexError> for RadarError {
    fn from(_: hex::FromHexError) -> Self {
        RadarError::InvalidHexString
    }
}
