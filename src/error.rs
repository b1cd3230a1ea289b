//! # Error Types
//!
//! Custom error types for the telepresence rig using `thiserror`.

use thiserror::Error;

/// Main error type for the telepresence rig
#[derive(Debug, Error)]
pub enum RigError {
    /// Maestro command construction errors
    #[error("Maestro protocol error: {0}")]
    Protocol(String),

    /// Serial port could not be opened or configured (fatal at startup)
    #[error("Serial connection error: {0}")]
    Connection(String),

    /// A command was not fully written to the serial port
    #[error("Transmission failed: {0}")]
    Transmission(String),

    /// Orientation source could not be acquired (fatal at startup)
    #[error("Orientation sensor unavailable: {0}")]
    SensorUnavailable(String),

    /// No fresh orientation reading for this cycle
    #[error("Orientation reading unavailable: {0}")]
    SensorReadGap(String),

    /// Gamepad errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No supported gamepad attached
    #[error("No supported gamepad found")]
    ControllerNotFound,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the telepresence rig
pub type Result<T> = std::result::Result<T, RigError>;
