//! Coordinate conversion utilities.
//!
//! Converts resolution-independent ratios (0.0-1.0) into pixel positions on a
//! captured frame.

/// Size of a captured frame in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A point in relative coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioPoint {
    /// X position (0.0 = left edge, 1.0 = right edge)
    pub x: f64,
    /// Y position (0.0 = top edge, 1.0 = bottom edge)
    pub y: f64,
}

impl RatioPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if both components lie within 0.0-1.0.
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// An absolute pixel position on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Scales a ratio to a length along one frame dimension, rounded to the
/// nearest pixel.
pub fn scale_length(ratio: f64, dimension: u32) -> u32 {
    (ratio * dimension as f64).round().max(0.0) as u32
}

/// Converts a relative point into a pixel position on a frame of the given
/// resolution.
pub fn scale(point: RatioPoint, resolution: Resolution) -> PixelPoint {
    PixelPoint {
        x: scale_length(point.x, resolution.width),
        y: scale_length(point.y, resolution.height),
    }
}
