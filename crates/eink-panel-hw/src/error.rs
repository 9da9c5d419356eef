//! Error types for the e-ink panel hardware library.

use crate::protocol::AckStep;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the display controller.
#[derive(Error, Debug)]
pub enum Error {
    /// No byte arrived within the read timeout.
    #[error("No ACK received for {step} (timed out)")]
    Timeout { step: AckStep },

    /// A byte arrived but it was not an ACK.
    #[error("Expected ACK 0x06 for {step}, got 0x{received:02x}")]
    UnexpectedAck { step: AckStep, received: u8 },

    /// Framebuffer size mismatch.
    #[error("Invalid framebuffer: expected {expected} bytes, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    /// Pixel data does not match the panel dimensions.
    #[error("Invalid image dimensions: expected {expected_width}x{expected_height}, got {width}x{height}")]
    InvalidDimensions {
        expected_width: u16,
        expected_height: u16,
        width: u32,
        height: u32,
    },

    /// Serial port does not exist.
    #[error("Serial port not found at {0}")]
    PortNotFound(String),

    /// Serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Serial I/O error.
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}
