//! Colored block detection.
//!
//! This module provides:
//! - Per-pixel color matching under a tolerance (`color`)
//! - 5x5 center-pixel grid sampling (`grid`)
//! - The per-frame orchestrator that combines both grids into one count

pub mod color;
pub mod grid;

use image::RgbaImage;
use thiserror::Error;

use crate::automation::config::AppConfig;
use crate::calibration::coords::{PixelPoint, Resolution};
use crate::calibration::state::{CalibrationState, Calibrator};

pub use grid::{GridId, GridSpec, OccupancyMatrix, sample_grid};

/// Reasons a detection cycle produced no count.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Screenshot unavailable")]
    CaptureUnavailable,

    #[error("The {grid} grid reaches {extent} but the frame is only {frame}")]
    OutOfBounds {
        grid: GridId,
        extent: PixelPoint,
        frame: Resolution,
    },

    #[error("Grid sampling attempted before calibration")]
    CalibrationNotReady,
}

/// Result of one detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub top: OccupancyMatrix,
    pub bottom: OccupancyMatrix,
    /// Cells set in either grid
    pub combined: OccupancyMatrix,
}

impl Detection {
    /// Number of set cells in `combined`, 0..=25.
    pub fn count(&self) -> u8 {
        self.combined.count()
    }
}

/// Target colors and tolerance shared by both grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorTargets {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
    pub tolerance: u8,
}

impl ColorTargets {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top: config.top_color,
            bottom: config.bottom_color,
            tolerance: config.tolerance,
        }
    }

    /// Grid descriptors for a calibration. Both share its cell size.
    pub fn grid_specs(&self, calibration: &CalibrationState) -> [GridSpec; 2] {
        [
            GridSpec {
                id: GridId::Top,
                origin: calibration.top_origin,
                cell_size: calibration.cell_size,
                target: self.top,
                tolerance: self.tolerance,
            },
            GridSpec {
                id: GridId::Bottom,
                origin: calibration.bottom_origin,
                cell_size: calibration.cell_size,
                target: self.bottom,
                tolerance: self.tolerance,
            },
        ]
    }
}

/// Samples both grids and combines them. Pure: the frame is only read.
pub fn detect(
    frame: &RgbaImage,
    calibration: &CalibrationState,
    targets: &ColorTargets,
) -> Result<Detection, DetectionError> {
    let [top_spec, bottom_spec] = targets.grid_specs(calibration);
    let top = sample_grid(frame, &top_spec)?;
    let bottom = sample_grid(frame, &bottom_spec)?;
    Ok(Detection {
        top,
        bottom,
        combined: top.union(&bottom),
    })
}

/// Owns the session calibration and turns frames into counts.
#[derive(Debug)]
pub struct Detector {
    calibrator: Calibrator,
    targets: ColorTargets,
}

impl Detector {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            calibrator: Calibrator::new(config.layout.ratios()),
            targets: ColorTargets::from_config(config),
        }
    }

    pub fn targets(&self) -> &ColorTargets {
        &self.targets
    }

    pub fn calibration(&self) -> Option<&CalibrationState> {
        self.calibrator.state()
    }

    /// Counts colored cells on a frame, calibrating on the first usable one.
    ///
    /// A missing or empty frame yields `CaptureUnavailable` and leaves the
    /// calibration untouched.
    pub fn detect_count(&mut self, frame: Option<&RgbaImage>) -> Result<Detection, DetectionError> {
        let frame = match frame {
            Some(frame) if frame.width() > 0 && frame.height() > 0 => frame,
            _ => return Err(DetectionError::CaptureUnavailable),
        };

        let calibration = self
            .calibrator
            .ensure(Resolution::new(frame.width(), frame.height()));
        detect(frame, calibration, &self.targets)
    }

    /// Counts colored cells using the existing calibration only.
    #[cfg(test)]
    pub fn detect_calibrated(&self, frame: &RgbaImage) -> Result<Detection, DetectionError> {
        let calibration = self
            .calibrator
            .state()
            .ok_or(DetectionError::CalibrationNotReady)?;
        detect(frame, calibration, &self.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BACKGROUND: Rgba<u8> = Rgba([240, 236, 228, 255]);

    fn fill_grid(frame: &mut RgbaImage, spec: &GridSpec, color: [u8; 3]) {
        let extent = spec.extent().unwrap();
        for y in spec.origin.y..extent.y {
            for x in spec.origin.x..extent.x {
                frame.put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }

    fn paint_centers(frame: &mut RgbaImage, spec: &GridSpec, cells: &[(usize, usize)]) {
        for &(row, col) in cells {
            let c = spec.cell_center(row, col);
            frame.put_pixel(c.x, c.y, Rgba([spec.target[0], spec.target[1], spec.target[2], 255]));
        }
    }

    #[test]
    fn test_full_top_grid_on_reference_frame() {
        let config = AppConfig::default();
        let mut detector = Detector::new(&config);
        let mut frame = RgbaImage::from_pixel(1440, 2560, BACKGROUND);

        let calibration = crate::calibration::state::calibrate(
            Resolution::new(1440, 2560),
            &config.layout.ratios(),
        );
        let [top, _] = detector.targets().grid_specs(&calibration);
        // BGR (105, 43, 199) as decoded RGB
        fill_grid(&mut frame, &top, [199, 43, 105]);

        let detection = detector.detect_count(Some(&frame)).unwrap();
        assert_eq!(detection.top, OccupancyMatrix::full());
        assert_eq!(detection.bottom, OccupancyMatrix::default());
        assert_eq!(detection.count(), 25);
    }

    #[test]
    fn test_overlapping_cells_counted_once() {
        let config = AppConfig::default();
        let mut detector = Detector::new(&config);
        let mut frame = RgbaImage::from_pixel(1440, 2560, BACKGROUND);
        let calibration = crate::calibration::state::calibrate(
            Resolution::new(1440, 2560),
            &config.layout.ratios(),
        );
        let [top, bottom] = detector.targets().grid_specs(&calibration);
        paint_centers(&mut frame, &top, &[(0, 0), (1, 1), (2, 2)]);
        paint_centers(&mut frame, &bottom, &[(2, 2), (3, 3)]);

        let detection = detector.detect_count(Some(&frame)).unwrap();
        assert_eq!(detection.top.count(), 3);
        assert_eq!(detection.bottom.count(), 2);
        assert_eq!(detection.count(), 4);
    }

    #[test]
    fn test_landscape_frame_samples_scaled_cell_centers() {
        let config = AppConfig::default();
        let mut detector = Detector::new(&config);
        let mut frame = RgbaImage::from_pixel(2560, 1440, BACKGROUND);
        let calibration = crate::calibration::state::calibrate(
            Resolution::new(2560, 1440),
            &config.layout.ratios(),
        );
        let [top, _] = detector.targets().grid_specs(&calibration);
        assert_eq!(top.cell_size, 169);
        // 516 + 4 * 169 + 84
        assert_eq!(top.cell_center(4, 4), PixelPoint::new(1276, 960));

        let all: Vec<_> = (0..5).flat_map(|r| (0..5).map(move |c| (r, c))).collect();
        paint_centers(&mut frame, &top, &all);

        let detection = detector.detect_count(Some(&frame)).unwrap();
        assert_eq!(detection.top, OccupancyMatrix::full());
        assert_eq!(detection.count(), 25);
        assert_eq!(detector.calibration(), Some(&calibration));
    }

    #[test]
    fn test_missing_frame_is_capture_unavailable() {
        let mut detector = Detector::new(&AppConfig::default());
        assert!(matches!(
            detector.detect_count(None),
            Err(DetectionError::CaptureUnavailable)
        ));
        assert!(detector.calibration().is_none());
    }

    #[test]
    fn test_empty_frame_does_not_calibrate() {
        let mut detector = Detector::new(&AppConfig::default());
        let empty = RgbaImage::new(0, 0);
        assert!(matches!(
            detector.detect_count(Some(&empty)),
            Err(DetectionError::CaptureUnavailable)
        ));
        assert!(detector.calibration().is_none());
    }

    #[test]
    fn test_sampling_before_calibration_is_rejected() {
        let detector = Detector::new(&AppConfig::default());
        let frame = RgbaImage::from_pixel(1440, 2560, BACKGROUND);
        assert!(matches!(
            detector.detect_calibrated(&frame),
            Err(DetectionError::CalibrationNotReady)
        ));
    }

    #[test]
    fn test_smaller_frame_after_calibration_is_out_of_bounds() {
        let mut detector = Detector::new(&AppConfig::default());
        let first = RgbaImage::from_pixel(1440, 2560, BACKGROUND);
        detector.detect_count(Some(&first)).unwrap();

        let small = RgbaImage::from_pixel(400, 600, BACKGROUND);
        assert!(matches!(
            detector.detect_count(Some(&small)),
            Err(DetectionError::OutOfBounds { .. })
        ));
        assert_eq!(
            detector.calibration().map(|c| c.resolution),
            Some(Resolution::new(1440, 2560))
        );
    }

    #[test]
    fn test_huge_configured_cell_size_fails_the_frame_without_panicking() {
        let mut config = AppConfig::default();
        config.layout.cell_size = 1e12;
        let mut detector = Detector::new(&config);
        let frame = RgbaImage::from_pixel(1440, 2560, BACKGROUND);

        assert_eq!(detector.calibration().map(|c| c.cell_size), None);
        match detector.detect_count(Some(&frame)) {
            Err(DetectionError::OutOfBounds { grid, .. }) => assert_eq!(grid, GridId::Top),
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert_eq!(detector.calibration().map(|c| c.cell_size), Some(u32::MAX));

        // The next frame fails the same way instead of ending the loop
        assert!(detector.detect_count(Some(&frame)).is_err());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let mut detector = Detector::new(&AppConfig::default());
        let frame = RgbaImage::from_pixel(1080, 1920, BACKGROUND);
        let first = detector.detect_count(Some(&frame)).unwrap();
        let second = detector.detect_calibrated(&frame).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.count(), 0);
    }
}
