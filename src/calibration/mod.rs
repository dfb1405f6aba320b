//! Calibration of resolution-independent layout to frame pixels.
//!
//! Converts the reference layout ratios into pixel positions once per
//! session, and renders previews so the result can be checked by eye.

pub mod coords;
pub mod preview;
pub mod state;

pub use coords::PixelPoint;
pub use state::{Keypad, KeypadKey};
