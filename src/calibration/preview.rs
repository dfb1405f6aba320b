//! Preview rendering for operator verification.
//!
//! Draws detection boxes and calibrated keypad points onto a copy of the
//! captured frame, then shrinks it for the viewer window. Nothing drawn here
//! feeds back into detection.

use anyhow::Result;
use chrono::Local;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::calibration::state::CalibrationState;
use crate::detection::{ColorTargets, Detection, GridSpec, OccupancyMatrix};

/// Color constants for preview rendering.
pub const COLOR_TOP_HIT: Rgba<u8> = Rgba([0, 255, 0, 255]); // Green
pub const COLOR_BOTTOM_HIT: Rgba<u8> = Rgba([0, 0, 255, 255]); // Blue
pub const COLOR_BUTTON: Rgba<u8> = Rgba([255, 0, 0, 255]); // Red

/// Border width of a detection box.
pub const BOX_THICKNESS: u32 = 2;

/// Viewer frames are shown at this fraction of the captured size.
pub const PREVIEW_SCALE: f32 = 0.5;

/// Outlines every matched cell of one grid.
pub fn draw_detections(
    img: &mut RgbaImage,
    spec: &GridSpec,
    matrix: &OccupancyMatrix,
    color: Rgba<u8>,
) {
    for (row, col) in matrix.active_cells() {
        let corner = spec.cell_origin(row, col);
        draw_rect(
            img,
            corner.x,
            corner.y,
            spec.cell_size,
            spec.cell_size,
            color,
            BOX_THICKNESS,
        );
    }
}

/// Marks every calibrated keypad button with a crosshair.
pub fn draw_keypad(img: &mut RgbaImage, calibration: &CalibrationState) {
    let arm = (calibration.cell_size / 4).max(5);
    let keypad = &calibration.keypad;
    for point in keypad.digits.iter().chain(std::iter::once(&keypad.clear)) {
        draw_crosshair(img, point.x, point.y, COLOR_BUTTON, arm);
    }
}

/// Renders the annotated, half-scale frame shown in the viewer.
pub fn render_detection(
    frame: &RgbaImage,
    detection: &Detection,
    calibration: &CalibrationState,
    targets: &ColorTargets,
    with_keypad: bool,
) -> RgbaImage {
    let img = annotate(frame, detection, calibration, targets, with_keypad);
    downscale(&img, PREVIEW_SCALE)
}

/// Full-size copy of the frame with detection boxes drawn on it.
pub fn annotate(
    frame: &RgbaImage,
    detection: &Detection,
    calibration: &CalibrationState,
    targets: &ColorTargets,
    with_keypad: bool,
) -> RgbaImage {
    let mut img = frame.clone();
    let [top, bottom] = targets.grid_specs(calibration);
    draw_detections(&mut img, &top, &detection.top, COLOR_TOP_HIT);
    draw_detections(&mut img, &bottom, &detection.bottom, COLOR_BOTTOM_HIT);
    if with_keypad {
        draw_keypad(&mut img, calibration);
    }
    img
}

/// Resizes by a uniform factor, never below 1x1.
pub fn downscale(img: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let new_w = ((w as f32 * factor).round() as u32).max(1);
    let new_h = ((h as f32 * factor).round() as u32).max(1);
    imageops::resize(img, new_w, new_h, FilterType::Triangle)
}

/// Saves an annotated frame as `<dir>/blocks_<count>_<timestamp>.png`.
pub fn save_snapshot(img: &RgbaImage, dir: &Path, count: u8) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
    let path = dir.join(format!("blocks_{:02}_{}.png", count, timestamp));
    img.save(&path)?;
    Ok(path)
}

/// Draws a rectangle border on an image, clipped to the image.
pub fn draw_rect(
    img: &mut RgbaImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: Rgba<u8>,
    thickness: u32,
) {
    if w == 0 || h == 0 {
        return;
    }
    let (img_w, img_h) = img.dimensions();
    let thickness = thickness.min(w).min(h);
    let mut put = |px: u32, py: u32| {
        if px < img_w && py < img_h {
            img.put_pixel(px, py, color);
        }
    };

    for t in 0..thickness {
        // Top and bottom edges
        for dx in 0..w {
            put(x + dx, y + t);
            put(x + dx, y + h - 1 - t);
        }
        // Left and right edges
        for dy in 0..h {
            put(x + t, y + dy);
            put(x + w - 1 - t, y + dy);
        }
    }
}

/// Draws a 3 px wide crosshair centered on a point.
pub fn draw_crosshair(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, arm_length: u32) {
    let (img_w, img_h) = img.dimensions();
    let (x, y) = (x as i64, y as i64);
    let arm = arm_length as i64;
    let mut put = |px: i64, py: i64| {
        if px >= 0 && py >= 0 && px < img_w as i64 && py < img_h as i64 {
            img.put_pixel(px as u32, py as u32, color);
        }
    };

    for d in -arm..=arm {
        for w in -1..=1 {
            put(x + d, y + w);
            put(x + w, y + d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::AppConfig;
    use crate::calibration::coords::{PixelPoint, Resolution};
    use crate::calibration::state::calibrate;
    use crate::detection::{Detector, GridId};

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_draw_rect() {
        let mut img = RgbaImage::from_pixel(100, 100, BLACK);
        draw_rect(&mut img, 10, 10, 50, 30, COLOR_TOP_HIT, 2);

        // Corners and edges are drawn
        assert_eq!(*img.get_pixel(10, 10), COLOR_TOP_HIT);
        assert_eq!(*img.get_pixel(59, 39), COLOR_TOP_HIT);
        assert_eq!(*img.get_pixel(11, 25), COLOR_TOP_HIT);
        // Center is still black
        assert_eq!(*img.get_pixel(35, 25), BLACK);
        // Outside is untouched
        assert_eq!(*img.get_pixel(60, 40), BLACK);
    }

    #[test]
    fn test_draw_rect_clips_at_image_edge() {
        let mut img = RgbaImage::from_pixel(20, 20, BLACK);
        draw_rect(&mut img, 15, 15, 10, 10, COLOR_TOP_HIT, 2);
        assert_eq!(*img.get_pixel(15, 15), COLOR_TOP_HIT);
        assert_eq!(*img.get_pixel(19, 15), COLOR_TOP_HIT);
    }

    #[test]
    fn test_draw_crosshair() {
        let mut img = RgbaImage::from_pixel(100, 100, BLACK);
        draw_crosshair(&mut img, 50, 50, COLOR_BUTTON, 10);

        assert_eq!(*img.get_pixel(50, 50), COLOR_BUTTON);
        assert_eq!(*img.get_pixel(60, 50), COLOR_BUTTON);
        assert_eq!(*img.get_pixel(50, 41), COLOR_BUTTON);
        assert_eq!(*img.get_pixel(55, 55), BLACK);
    }

    #[test]
    fn test_draw_crosshair_near_origin_does_not_wrap() {
        let mut img = RgbaImage::from_pixel(30, 30, BLACK);
        draw_crosshair(&mut img, 2, 2, COLOR_BUTTON, 10);
        assert_eq!(*img.get_pixel(0, 2), COLOR_BUTTON);
        assert_eq!(*img.get_pixel(29, 29), BLACK);
    }

    #[test]
    fn test_detection_boxes_surround_matched_cells() {
        let spec = GridSpec {
            id: GridId::Top,
            origin: PixelPoint::new(0, 0),
            cell_size: 10,
            target: [1, 2, 3],
            tolerance: 0,
        };
        let mut matrix = OccupancyMatrix::default();
        matrix.set(1, 2);
        let mut img = RgbaImage::from_pixel(50, 50, BLACK);
        draw_detections(&mut img, &spec, &matrix, COLOR_BOTTOM_HIT);

        assert_eq!(*img.get_pixel(20, 10), COLOR_BOTTOM_HIT);
        assert_eq!(*img.get_pixel(29, 19), COLOR_BOTTOM_HIT);
        assert_eq!(*img.get_pixel(25, 15), BLACK);
        assert_eq!(*img.get_pixel(5, 5), BLACK);
    }

    #[test]
    fn test_render_detection_is_half_scale_and_leaves_frame_alone() {
        let config = AppConfig::default();
        let mut detector = Detector::new(&config);
        let frame = RgbaImage::from_pixel(1440, 2560, BLACK);
        let detection = detector.detect_count(Some(&frame)).unwrap();
        let calibration = calibrate(Resolution::new(1440, 2560), &config.layout.ratios());

        let before = frame.clone();
        let preview = render_detection(&frame, &detection, &calibration, detector.targets(), true);
        assert_eq!(preview.dimensions(), (720, 1280));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_downscale_never_collapses() {
        let img = RgbaImage::from_pixel(1, 1, BLACK);
        assert_eq!(downscale(&img, 0.5).dimensions(), (1, 1));
    }
}
