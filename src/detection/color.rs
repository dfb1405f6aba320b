//! Per-pixel color classification.
//!
//! Frames are decoded to RGBA8, so every color here is in RGB order. Target
//! colors taken from BGR sources must be reordered before use.

use image::Rgba;

/// Returns true if every RGB channel of `pixel` is within `tolerance` of
/// `target`.
pub fn color_match(pixel: [u8; 3], target: [u8; 3], tolerance: u8) -> bool {
    pixel
        .iter()
        .zip(target.iter())
        .all(|(&p, &t)| p.abs_diff(t) <= tolerance)
}

/// RGB channels of an RGBA pixel, alpha dropped.
pub fn rgb(pixel: &Rgba<u8>) -> [u8; 3] {
    [pixel[0], pixel[1], pixel[2]]
}
