//! Frame queue between the detection thread and the viewer.
//!
//! Uses std::sync::mpsc: the detection loop sends one update per cycle, the
//! viewer drains the channel on every repaint and keeps only the newest.

use chrono::{DateTime, Local};
use image::RgbaImage;
use std::sync::mpsc::{Receiver, Sender, channel};

/// What a cycle produced.
#[derive(Debug, Clone)]
pub enum CycleReport {
    /// Half-scale annotated frame and the combined count
    Detected { preview: RgbaImage, count: u8 },
    /// The cycle was skipped
    Failed(String),
}

/// One cycle's result, as shown by the viewer.
#[derive(Debug, Clone)]
pub struct FrameUpdate {
    /// Cycle number (1-based)
    pub cycle: u64,
    /// When the cycle finished
    pub finished_at: DateTime<Local>,
    pub report: CycleReport,
}

impl FrameUpdate {
    pub fn new(cycle: u64, report: CycleReport) -> Self {
        Self {
            cycle,
            finished_at: Local::now(),
            report,
        }
    }
}

/// Creates a new frame queue.
///
/// Returns a tuple of (sender, receiver). The channel is unbounded; the
/// viewer is expected to drain it faster than one update per cycle.
pub fn create_frame_queue() -> (Sender<FrameUpdate>, Receiver<FrameUpdate>) {
    channel()
}

/// Takes every pending update and returns the newest.
pub fn latest_update(receiver: &Receiver<FrameUpdate>) -> Option<FrameUpdate> {
    receiver.try_iter().last()
}
