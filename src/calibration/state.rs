//! Calibration state tracking.
//!
//! The first usable frame fixes the resolution for the rest of the session.
//! Cell size, both grid origins and every keypad button are derived in that
//! single pass and never recomputed.

use crate::automation::config::RatioLayout;
use crate::calibration::coords::{PixelPoint, Resolution, scale, scale_length};

/// A button on the in-game numeric keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypadKey {
    Digit(u8),
    Clear,
}

impl std::fmt::Display for KeypadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeypadKey::Digit(d) => write!(f, "{}", d),
            KeypadKey::Clear => write!(f, "clear"),
        }
    }
}

/// Calibrated keypad button positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keypad {
    pub digits: [PixelPoint; 10],
    pub clear: PixelPoint,
}

impl Keypad {
    /// Position of a key, or `None` for a digit above 9.
    pub fn position(&self, key: KeypadKey) -> Option<PixelPoint> {
        match key {
            KeypadKey::Digit(d) => self.digits.get(d as usize).copied(),
            KeypadKey::Clear => Some(self.clear),
        }
    }
}

/// Pixel geometry derived from one frame resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalibrationState {
    /// Resolution the geometry was computed for.
    pub resolution: Resolution,
    /// Shared edge length of every grid cell.
    pub cell_size: u32,
    pub top_origin: PixelPoint,
    pub bottom_origin: PixelPoint,
    pub keypad: Keypad,
}

/// Computes the pixel geometry for a resolution.
pub fn calibrate(resolution: Resolution, ratios: &RatioLayout) -> CalibrationState {
    CalibrationState {
        resolution,
        cell_size: scale_length(ratios.cell_size, resolution.width),
        top_origin: scale(ratios.top_grid, resolution),
        bottom_origin: scale(ratios.bottom_grid, resolution),
        keypad: Keypad {
            digits: ratios.digits.map(|p| scale(p, resolution)),
            clear: scale(ratios.clear, resolution),
        },
    }
}

/// Session object holding the once-computed calibration.
///
/// Created by the caller and passed to the detector; a new session is the
/// only way to recalibrate.
#[derive(Debug)]
pub struct Calibrator {
    ratios: RatioLayout,
    state: Option<CalibrationState>,
}

impl Calibrator {
    pub fn new(ratios: RatioLayout) -> Self {
        Self {
            ratios,
            state: None,
        }
    }

    /// Calibrates on the first call; later calls return the stored state
    /// unchanged, whatever resolution they pass.
    pub fn ensure(&mut self, resolution: Resolution) -> &CalibrationState {
        let ratios = &self.ratios;
        let state = self.state.get_or_insert_with(|| {
            let state = calibrate(resolution, ratios);
            crate::log(&format!(
                "Calibrated for {}: cell {}px, top grid at {}, bottom grid at {}",
                resolution, state.cell_size, state.top_origin, state.bottom_origin
            ));
            state
        });
        if state.resolution != resolution {
            crate::log(&format!(
                "Frame is {} but calibration was done for {}; keeping calibration",
                resolution, state.resolution
            ));
        }
        state
    }

    /// The stored calibration, if any frame has been seen.
    pub fn state(&self) -> Option<&CalibrationState> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub fn is_calibrated(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::ReferenceLayout;

    fn calibrator() -> Calibrator {
        Calibrator::new(ReferenceLayout::default().ratios())
    }

    #[test]
    fn test_reference_resolution_reproduces_reference_pixels() {
        let state = calibrate(
            Resolution::new(1440, 2560),
            &ReferenceLayout::default().ratios(),
        );
        assert_eq!(state.cell_size, 95);
        assert_eq!(state.top_origin, PixelPoint::new(290, 355));
        assert_eq!(state.bottom_origin, PixelPoint::new(272, 943));
        assert_eq!(state.keypad.digits[0], PixelPoint::new(330, 1823));
        assert_eq!(state.keypad.digits[9], PixelPoint::new(1166, 2236));
        assert_eq!(state.keypad.clear, PixelPoint::new(1155, 1832));
    }

    #[test]
    fn test_landscape_scales_each_axis_independently() {
        let state = calibrate(
            Resolution::new(2560, 1440),
            &ReferenceLayout::default().ratios(),
        );
        // cell size follows width: 95 / 1440 * 2560 = 168.9
        assert_eq!(state.cell_size, 169);
        // 290 / 1440 * 2560 = 515.6, 355 / 2560 * 1440 = 199.7
        assert_eq!(state.top_origin, PixelPoint::new(516, 200));
        // 272 / 1440 * 2560 = 483.6, 943 / 2560 * 1440 = 530.4
        assert_eq!(state.bottom_origin, PixelPoint::new(484, 530));
    }

    #[test]
    fn test_calibration_is_idempotent() {
        let mut cal = calibrator();
        let first = cal.ensure(Resolution::new(1080, 1920)).clone();
        let second = cal.ensure(Resolution::new(1080, 1920)).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_resolution_wins() {
        let mut cal = calibrator();
        let first = cal.ensure(Resolution::new(1080, 1920)).clone();
        let later = cal.ensure(Resolution::new(1440, 2560)).clone();
        assert_eq!(first, later);
        assert_eq!(later.resolution, Resolution::new(1080, 1920));
    }

    #[test]
    fn test_not_calibrated_until_first_frame() {
        let mut cal = calibrator();
        assert!(!cal.is_calibrated());
        assert!(cal.state().is_none());
        cal.ensure(Resolution::new(720, 1280));
        assert!(cal.is_calibrated());
    }

    #[test]
    fn test_keypad_position_lookup() {
        let state = calibrate(
            Resolution::new(1440, 2560),
            &ReferenceLayout::default().ratios(),
        );
        assert_eq!(
            state.keypad.position(KeypadKey::Digit(3)),
            Some(PixelPoint::new(736, 2035))
        );
        assert_eq!(
            state.keypad.position(KeypadKey::Clear),
            Some(PixelPoint::new(1155, 1832))
        );
        assert_eq!(state.keypad.position(KeypadKey::Digit(10)), None);
    }
}
