//! # Error Types
//!
//! Custom error types for IMU Relay using `thiserror`.

use thiserror::Error;

/// Main error type for IMU Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Framing protocol errors (short buffers, trailing bytes)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Payload does not fit the one-byte length field
    #[error("Payload size {len} exceeds maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No radio module found (tried: {0})")]
    SerialPortNotFound(String),

    /// Sensor collaborator failed to produce a reading
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for IMU Relay
pub type Result<T> = std::result::Result<T, RelayError>;
