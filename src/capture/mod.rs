//! Device I/O over the Android debug bridge.
//!
//! This module provides:
//! - The `Device` seam used by the detection loop (`capture`, `tap`)
//! - An adb-backed implementation (`AdbDevice`)
//! - Screencap decoding with line-ending repair (`decode`)

pub mod adb;
pub mod decode;

use image::RgbaImage;
use std::time::Duration;
use thiserror::Error;

use crate::calibration::PixelPoint;

pub use adb::AdbDevice;
pub use decode::decode_screencap;

/// Why a screenshot could not be obtained.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to run adb: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("adb did not finish within {0:?}")]
    Timeout(Duration),

    #[error("adb exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Screencap returned no image data")]
    Empty,

    #[error("Failed to decode screenshot: {0}")]
    Decode(#[from] image::ImageError),
}

/// A device that can be screenshotted and tapped.
pub trait Device {
    /// Captures and decodes the current screen.
    fn capture(&mut self) -> Result<RgbaImage, CaptureError>;

    /// Sends a tap at a pixel position. Best-effort: failures are logged,
    /// never reported.
    fn tap(&mut self, point: PixelPoint);
}
