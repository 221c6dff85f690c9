//! Cover-art to ASCII conversion.
//!
//! The image is resampled to a fixed character grid and each cell's
//! luminance is mapped onto a density ramp, dark pixels getting the
//! heaviest glyphs. Character cells are roughly twice as tall as they are
//! wide, so the grid is half as many rows as columns to keep square
//! artwork square.

use anyhow::{Context, Result};
use image::DynamicImage;
use image::imageops::FilterType;

pub const ART_WIDTH: u32 = 60;
pub const ART_HEIGHT: u32 = 30;

// Dark to light.
const RAMP: &[u8] = b"@%#*+=-:. ";

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).context("Failed to decode cover art image")
}

/// Render an image as `ART_HEIGHT` lines of `ART_WIDTH` characters.
pub fn image_to_ascii(img: &DynamicImage) -> Vec<String> {
    let gray = img
        .resize_exact(ART_WIDTH, ART_HEIGHT, FilterType::Triangle)
        .to_luma8();

    let mut lines = Vec::with_capacity(ART_HEIGHT as usize);
    for row in gray.rows() {
        let mut line = String::with_capacity(ART_WIDTH as usize);
        for pixel in row {
            line.push(glyph_for(pixel.0[0]));
        }
        lines.push(line);
    }
    lines
}

fn glyph_for(luma: u8) -> char {
    let idx = (luma as usize * (RAMP.len() - 1)) / 255;
    RAMP[idx] as char
}
