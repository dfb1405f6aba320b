//! Viewer state management.
//!
//! Tracks the latest cycle result for display.

use chrono::{DateTime, Local};

use crate::automation::queue::{CycleReport, FrameUpdate};

/// Detection status for display in the viewer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ViewerStatus {
    /// No cycle has finished yet
    #[default]
    Waiting,
    /// The last cycle produced a count
    Detected { cycle: u64, count: u8 },
    /// The last cycle was skipped
    Failed { cycle: u64, message: String },
}

impl ViewerStatus {
    /// Get display text for current status.
    pub fn status_text(&self) -> String {
        match self {
            Self::Waiting => "Waiting for first screenshot...".to_string(),
            Self::Detected { cycle, count } => format!("Cycle {}: {} colored blocks", cycle, count),
            Self::Failed { cycle, message } => format!("Cycle {} skipped: {}", cycle, message),
        }
    }

    #[cfg(test)]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Text drawn over the frame.
pub fn overlay_text(count: u8) -> String {
    format!("Colored Blocks: {}", count)
}

/// Viewer state.
#[derive(Debug, Default)]
pub struct ViewerState {
    pub status: ViewerStatus,
    /// Count shown over the current frame; kept across failed cycles so
    /// the frame and its label stay in sync.
    pub shown_count: Option<u8>,
    /// When the last update arrived.
    pub last_update: Option<DateTime<Local>>,
}

impl ViewerState {
    /// Applies a cycle result. Returns the new preview frame, if any.
    pub fn apply(&mut self, update: FrameUpdate) -> Option<image::RgbaImage> {
        self.last_update = Some(update.finished_at);
        match update.report {
            CycleReport::Detected { preview, count } => {
                self.status = ViewerStatus::Detected {
                    cycle: update.cycle,
                    count,
                };
                self.shown_count = Some(count);
                Some(preview)
            }
            CycleReport::Failed(message) => {
                self.status = ViewerStatus::Failed {
                    cycle: update.cycle,
                    message,
                };
                None
            }
        }
    }
}
