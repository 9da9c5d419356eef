//! 1-bit framebuffer for the 104x212 e-paper panel.
//!
//! Layout matches what the controller streams to the panel: row-major,
//! 13 bytes per row, most significant bit is the leftmost pixel, a set bit
//! is white.

use crate::{Error, Result, EPD_HEIGHT, EPD_WIDTH, FRAMEBUFFER_SIZE};

/// Bytes per framebuffer row.
pub const ROW_BYTES: usize = EPD_WIDTH as usize / 8;

/// Pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

/// Packed 1-bpp framebuffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    data: Vec<u8>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// Creates a new framebuffer initialized to white.
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; FRAMEBUFFER_SIZE],
        }
    }

    /// Wraps raw framebuffer bytes, checking the length.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() != FRAMEBUFFER_SIZE {
            return Err(Error::InvalidInput {
                expected: FRAMEBUFFER_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Builds a framebuffer from 8-bit grayscale pixels.
    ///
    /// Pixels at or above `threshold` become white.
    pub fn from_luma8(width: u32, height: u32, pixels: &[u8], threshold: u8) -> Result<Self> {
        if width != EPD_WIDTH as u32 || height != EPD_HEIGHT as u32 {
            return Err(Error::InvalidDimensions {
                expected_width: EPD_WIDTH,
                expected_height: EPD_HEIGHT,
                width,
                height,
            });
        }
        let expected = EPD_WIDTH as usize * EPD_HEIGHT as usize;
        if pixels.len() != expected {
            return Err(Error::InvalidInput {
                expected,
                actual: pixels.len(),
            });
        }

        let mut fb = Self::new();
        for (i, &luma) in pixels.iter().enumerate() {
            if luma < threshold {
                let x = (i % EPD_WIDTH as usize) as u16;
                let y = (i / EPD_WIDTH as usize) as u16;
                fb.set_pixel(x, y, Color::Black);
            }
        }
        Ok(fb)
    }

    /// Returns the width of the framebuffer.
    pub fn width(&self) -> u16 {
        EPD_WIDTH
    }

    /// Returns the height of the framebuffer.
    pub fn height(&self) -> u16 {
        EPD_HEIGHT
    }

    /// Returns the packed bytes, ready to upload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the framebuffer, returning the packed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Fills the whole framebuffer with one color.
    pub fn fill(&mut self, color: Color) {
        let byte = match color {
            Color::White => 0xFF,
            Color::Black => 0x00,
        };
        self.data.fill(byte);
    }

    /// Sets a pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Color) {
        if let Some((idx, mask)) = Self::locate(x, y) {
            match color {
                Color::White => self.data[idx] |= mask,
                Color::Black => self.data[idx] &= !mask,
            }
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<Color> {
        Self::locate(x, y).map(|(idx, mask)| {
            if self.data[idx] & mask != 0 {
                Color::White
            } else {
                Color::Black
            }
        })
    }

    /// Inverts every pixel.
    pub fn invert(&mut self) {
        for byte in &mut self.data {
            *byte = !*byte;
        }
    }

    fn locate(x: u16, y: u16) -> Option<(usize, u8)> {
        if x < EPD_WIDTH && y < EPD_HEIGHT {
            let idx = y as usize * ROW_BYTES + x as usize / 8;
            Some((idx, 0x80 >> (x % 8)))
        } else {
            None
        }
    }
}
