//! Image to framebuffer conversion.

use anyhow::{Context, Result};
use eink_panel_hw::{Framebuffer, EPD_HEIGHT, EPD_WIDTH};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, warn};

/// Loads an image file and converts it to a panel framebuffer.
pub fn load_image<P: AsRef<Path>>(path: P, threshold: u8, invert: bool) -> Result<Framebuffer> {
    let img = image::open(path.as_ref())
        .with_context(|| format!("Failed to open image {}", path.as_ref().display()))?;
    to_framebuffer(img, threshold, invert)
}

/// Converts a decoded image to a panel framebuffer.
///
/// Landscape images are rotated into the panel's portrait orientation and
/// anything that is not exactly 104x212 is resized.
pub fn to_framebuffer(img: DynamicImage, threshold: u8, invert: bool) -> Result<Framebuffer> {
    let mut img = img;
    if img.width() > img.height() {
        debug!("Rotating landscape image {}x{}", img.width(), img.height());
        img = img.rotate90();
    }

    let (width, height) = (EPD_WIDTH as u32, EPD_HEIGHT as u32);
    if img.width() != width || img.height() != height {
        warn!(
            "Resizing image from {}x{} to {}x{}",
            img.width(),
            img.height(),
            width,
            height
        );
        img = img.resize_exact(width, height, FilterType::Triangle);
    }

    let luma = img.to_luma8();
    let mut fb = Framebuffer::from_luma8(luma.width(), luma.height(), luma.as_raw(), threshold)?;
    if invert {
        fb.invert();
    }
    Ok(fb)
}
