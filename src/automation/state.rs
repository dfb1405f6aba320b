//! Per-cycle state of the detection loop.
//!
//! Each cycle runs capture → detect → publish → replay-on-change. The only
//! state carried between cycles is the session calibration (inside the
//! detector) and the last count that was entered on the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use crate::automation::config::AppConfig;
use crate::automation::input::input_number;
use crate::automation::pacer::Pacer;
use crate::automation::queue::{CycleReport, FrameUpdate};
use crate::calibration::preview::{render_detection, save_snapshot};
use crate::capture::Device;
use crate::detection::{Detection, DetectionError, Detector};

/// Global abort flag - set by the quit key, window close or Ctrl-C.
pub static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The count differed from the last one and was entered on the device
    Replayed(u8),
    /// Same count as last time; nothing was sent
    Unchanged(u8),
    /// The cycle was skipped; the loop carries on
    Failed(DetectionError),
    /// Abort arrived while the count was being entered
    Aborted,
}

/// Detection loop context: device, pacing, detector and last accepted count.
pub struct DetectionLoop<D: Device, P: Pacer> {
    device: D,
    pacer: P,
    detector: Detector,
    config: AppConfig,
    last_count: Option<u8>,
    cycle: u64,
    frames: Option<Sender<FrameUpdate>>,
}

impl<D: Device, P: Pacer> DetectionLoop<D, P> {
    pub fn new(device: D, pacer: P, config: AppConfig) -> Self {
        Self {
            device,
            pacer,
            detector: Detector::new(&config),
            config,
            last_count: None,
            cycle: 0,
            frames: None,
        }
    }

    /// Publishes a `FrameUpdate` per cycle to the given channel.
    pub fn with_frame_sink(mut self, frames: Sender<FrameUpdate>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// The count most recently entered on the device.
    pub fn last_count(&self) -> Option<u8> {
        self.last_count
    }

    /// Number of cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    #[cfg(test)]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    #[cfg(test)]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[cfg(test)]
    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Whether the loop has been asked to stop.
    pub fn cancelled(&self) -> bool {
        self.pacer.cancelled()
    }

    /// Waits out the configured cycle delay. False if cancelled meanwhile.
    pub fn wait_for_next_cycle(&mut self) -> bool {
        let delay = self.config.cycle_delay();
        self.pacer.pause(delay)
    }

    /// Runs one capture/detect/replay cycle.
    pub fn step(&mut self) -> CycleOutcome {
        self.cycle += 1;

        let frame = match self.device.capture() {
            Ok(frame) => Some(frame),
            Err(e) => {
                crate::log(&format!("Cycle {}: capture failed: {}", self.cycle, e));
                None
            }
        };

        let detection = match self.detector.detect_count(frame.as_ref()) {
            Ok(detection) => detection,
            Err(e) => {
                crate::log(&format!(
                    "Cycle {}: {}. Check the device connection.",
                    self.cycle, e
                ));
                self.publish(CycleReport::Failed(e.to_string()));
                return CycleOutcome::Failed(e);
            }
        };

        let count = detection.count();
        crate::log(&format!("Cycle {}: colored blocks = {}", self.cycle, count));

        let changed = self.last_count != Some(count);
        let wants_snapshot = changed && self.config.save_snapshots;
        let preview = match (&frame, self.frames.is_some() || wants_snapshot) {
            (Some(frame), true) => self.render(frame, &detection),
            _ => None,
        };

        if let Some(preview) = &preview {
            if wants_snapshot {
                match save_snapshot(preview, &crate::paths::get_snapshots_dir(), count) {
                    Ok(path) => crate::log(&format!("Snapshot saved: {}", path.display())),
                    Err(e) => crate::log(&format!("Failed to save snapshot: {}", e)),
                }
            }
            self.publish(CycleReport::Detected {
                preview: preview.clone(),
                count,
            });
        }

        if !changed {
            return CycleOutcome::Unchanged(count);
        }

        // Detection succeeded, so calibration exists and the keypad shares
        // its resolution with the grids.
        let Some(keypad) = self.detector.calibration().map(|c| c.keypad.clone()) else {
            return CycleOutcome::Failed(DetectionError::CalibrationNotReady);
        };

        crate::log(&format!("Entering {} (was {:?})", count, self.last_count));
        let tap_delay = self.config.tap_delay();
        if !input_number(&mut self.device, &keypad, count, &mut self.pacer, tap_delay) {
            return CycleOutcome::Aborted;
        }
        self.last_count = Some(count);
        CycleOutcome::Replayed(count)
    }

    fn render(&self, frame: &image::RgbaImage, detection: &Detection) -> Option<image::RgbaImage> {
        let calibration = self.detector.calibration()?;
        Some(render_detection(
            frame,
            detection,
            calibration,
            self.detector.targets(),
            self.config.draw_keypad,
        ))
    }

    fn publish(&self, report: CycleReport) {
        if let Some(frames) = &self.frames {
            // The viewer may already be gone
            let _ = frames.send(FrameUpdate::new(self.cycle, report));
        }
    }
}

/// True once abort has been requested.
pub fn is_abort_requested() -> bool {
    ABORT_REQUESTED.load(Ordering::SeqCst)
}

/// Resets the abort flag. Call before starting the loop.
pub fn reset_abort_flag() {
    ABORT_REQUESTED.store(false, Ordering::SeqCst);
}

/// Requests the detection loop to stop.
pub fn request_abort() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}
