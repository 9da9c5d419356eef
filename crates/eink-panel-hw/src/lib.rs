//! E-Ink Panel Hardware Library
//!
//! Drives a CC2530-based e-paper controller over a serial link: uploads a
//! 1-bit framebuffer and triggers display refresh or clear.

pub mod device;
pub mod error;
pub mod framebuffer;
pub mod protocol;
pub mod transport;

pub use device::{EpdDevice, LinkSettings};
pub use error::{Error, Result};
pub use framebuffer::{Color, Framebuffer};
pub use protocol::{AckStep, Command};
pub use transport::{SerialTransport, Transport};

/// Display dimensions (GDEW0213Z16, 104x212).
pub const EPD_WIDTH: u16 = 104;
pub const EPD_HEIGHT: u16 = 212;

/// Framebuffer size in bytes (1 bit per pixel).
pub const FRAMEBUFFER_SIZE: usize = EPD_WIDTH as usize * EPD_HEIGHT as usize / 8;
