//! Keypad input replay.
//!
//! Enters a count into the game's numeric keypad: clear first, then one tap
//! per decimal digit, each followed by a fixed pause so the on-screen keypad
//! can register it.

use std::time::Duration;

use crate::automation::pacer::Pacer;
use crate::calibration::{Keypad, KeypadKey};
use crate::capture::Device;

/// Keys to press to enter `count`, clear included.
pub fn keys_for_count(count: u8) -> Vec<KeypadKey> {
    std::iter::once(KeypadKey::Clear)
        .chain(
            count
                .to_string()
                .bytes()
                .map(|b| KeypadKey::Digit(b - b'0')),
        )
        .collect()
}

/// Taps `count` into the keypad.
///
/// Returns false if the pacer was cancelled before every key was sent.
pub fn input_number(
    device: &mut dyn Device,
    keypad: &Keypad,
    count: u8,
    pacer: &mut dyn Pacer,
    tap_delay: Duration,
) -> bool {
    for key in keys_for_count(count) {
        let Some(point) = keypad.position(key) else {
            crate::log(&format!("No keypad position for key {}", key));
            continue;
        };
        device.tap(point);
        if !pacer.pause(tap_delay) {
            crate::log(&format!("Input of {} interrupted", count));
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::ReferenceLayout;
    use crate::automation::pacer::RecordingPacer;
    use crate::calibration::PixelPoint;
    use crate::calibration::coords::Resolution;
    use crate::calibration::state::calibrate;
    use crate::capture::CaptureError;
    use image::RgbaImage;

    #[derive(Default)]
    struct TapRecorder {
        taps: Vec<PixelPoint>,
    }

    impl Device for TapRecorder {
        fn capture(&mut self) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::Empty)
        }

        fn tap(&mut self, point: PixelPoint) {
            self.taps.push(point);
        }
    }

    fn keypad() -> Keypad {
        calibrate(
            Resolution::new(1440, 2560),
            &ReferenceLayout::default().ratios(),
        )
        .keypad
    }

    #[test]
    fn test_keys_for_count() {
        assert_eq!(keys_for_count(0), vec![KeypadKey::Clear, KeypadKey::Digit(0)]);
        assert_eq!(
            keys_for_count(25),
            vec![KeypadKey::Clear, KeypadKey::Digit(2), KeypadKey::Digit(5)]
        );
    }

    #[test]
    fn test_input_taps_clear_then_digits_with_pauses() {
        let keypad = keypad();
        let mut device = TapRecorder::default();
        let mut pacer = RecordingPacer::default();
        let delay = Duration::from_millis(200);

        assert!(input_number(&mut device, &keypad, 17, &mut pacer, delay));
        assert_eq!(
            device.taps,
            vec![keypad.clear, keypad.digits[1], keypad.digits[7]]
        );
        assert_eq!(pacer.pauses, vec![delay; 3]);
    }

    #[test]
    fn test_input_stops_when_cancelled() {
        let keypad = keypad();
        let mut device = TapRecorder::default();
        let mut pacer = RecordingPacer {
            cancel_after: Some(1),
            ..Default::default()
        };

        assert!(!input_number(
            &mut device,
            &keypad,
            12,
            &mut pacer,
            Duration::from_millis(200)
        ));
        assert_eq!(device.taps, vec![keypad.clear, keypad.digits[1]]);
    }
}
